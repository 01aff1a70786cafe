use super::gateway::AuthorizationGateway;
use super::manager::SubscriptionManager;
use crate::domain::authorization::{AuthorizationResult, DeclineReason};
use crate::domain::instrument::{InstrumentField, PaymentInstrument};
use crate::domain::plan::Plan;
use crate::domain::ports::Clock;
use serde::Deserialize;
use std::sync::Arc;

/// Raw checkout form input, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CheckoutForm {
    pub card_number: String,
    pub cardholder_name: String,
    /// `MM/YY`, as produced by the expiry formatter.
    pub expiry: String,
    pub security_code: String,
    pub national_id: String,
}

impl CheckoutForm {
    /// Parses the raw form into a typed instrument. Unparseable expiry
    /// digits become month/year 0, which fail validation downstream rather
    /// than erroring here.
    pub fn into_instrument(self) -> PaymentInstrument {
        let (expiry_month, expiry_year) = parse_expiry(&self.expiry);
        PaymentInstrument {
            card_number: self.card_number,
            cardholder_name: self.cardholder_name,
            expiry_month,
            expiry_year,
            security_code: self.security_code,
            national_id: self.national_id,
        }
    }
}

fn parse_expiry(raw: &str) -> (u8, u8) {
    let mut parts = raw.splitn(2, '/');
    let month = parts.next().and_then(|p| p.trim().parse().ok()).unwrap_or(0);
    let year = parts.next().and_then(|p| p.trim().parse().ok()).unwrap_or(0);
    (month, year)
}

/// Terminal outcome of one checkout submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Approved { transaction_id: String },
    Declined { reason: DeclineReason },
    Invalid { fields: Vec<InstrumentField> },
    Failed { message: String },
}

impl CheckoutOutcome {
    /// User-facing message for the outcome.
    pub fn message(&self) -> String {
        match self {
            CheckoutOutcome::Approved { .. } => {
                "Payment approved. Welcome to premium!".to_string()
            }
            CheckoutOutcome::Declined { reason } => reason.message(),
            CheckoutOutcome::Invalid { fields } => {
                let names: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
                format!("Check the following fields: {}.", names.join(", "))
            }
            CheckoutOutcome::Failed { message } => message.clone(),
        }
    }
}

const PROCESSING_ERROR_MESSAGE: &str =
    "Something went wrong while processing the payment. Please try again.";

/// Drives a checkout submit end to end, from field validation through the
/// simulated authorization to recording the approval.
///
/// This is the error boundary of the flow: storage failures surface as a
/// generic retry-suggesting [`CheckoutOutcome::Failed`], never as a panic
/// or an error escaping to the UI.
pub struct CheckoutService {
    gateway: AuthorizationGateway,
    manager: SubscriptionManager,
    clock: Arc<dyn Clock>,
}

impl CheckoutService {
    pub fn new(
        gateway: AuthorizationGateway,
        manager: SubscriptionManager,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gateway,
            manager,
            clock,
        }
    }

    pub fn manager(&self) -> &SubscriptionManager {
        &self.manager
    }

    /// Submits a paid checkout for `plan`.
    pub async fn submit(&self, form: CheckoutForm, plan: Plan) -> CheckoutOutcome {
        let instrument = form.into_instrument();
        let today = self.clock.now().date_naive();

        let failed_fields: Vec<InstrumentField> = instrument
            .field_report(today)
            .into_iter()
            .filter(|(_, ok)| !ok)
            .map(|(field, _)| field)
            .collect();
        if !failed_fields.is_empty() {
            tracing::debug!(?failed_fields, "checkout rejected client-side");
            return CheckoutOutcome::Invalid {
                fields: failed_fields,
            };
        }

        match self.gateway.authorize(&instrument, plan.price(), plan).await {
            AuthorizationResult::Approved { transaction_id } => {
                match self.manager.record_approval(&transaction_id, plan).await {
                    Ok(()) => CheckoutOutcome::Approved { transaction_id },
                    Err(err) => {
                        tracing::error!(error = %err, "failed to persist approval");
                        CheckoutOutcome::Failed {
                            message: PROCESSING_ERROR_MESSAGE.to_string(),
                        }
                    }
                }
            }
            AuthorizationResult::Declined { reason } => CheckoutOutcome::Declined { reason },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::in_memory::{InMemoryReceiptStore, InMemorySubscriptionStore};
    use crate::infrastructure::random::FixedRandom;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn service(draw: f64) -> CheckoutService {
        let clock = Arc::new(FixedClock::at(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        ));
        let gateway = AuthorizationGateway::new(Arc::new(FixedRandom(draw)), clock.clone())
            .with_latency(Duration::ZERO);
        let manager = SubscriptionManager::new(
            Box::new(InMemorySubscriptionStore::new()),
            Box::new(InMemoryReceiptStore::new()),
            clock.clone(),
        );
        CheckoutService::new(gateway, manager, clock)
    }

    fn valid_form() -> CheckoutForm {
        CheckoutForm {
            card_number: "4532 0151 1283 0366".to_string(),
            cardholder_name: "Maria Silva".to_string(),
            expiry: "12/30".to_string(),
            security_code: "123".to_string(),
            national_id: "529.982.247-25".to_string(),
        }
    }

    #[test]
    fn test_parse_expiry() {
        assert_eq!(parse_expiry("12/30"), (12, 30));
        assert_eq!(parse_expiry("1/5"), (1, 5));
        assert_eq!(parse_expiry("garbage"), (0, 0));
        assert_eq!(parse_expiry(""), (0, 0));
        assert_eq!(parse_expiry("12"), (12, 0));
    }

    #[tokio::test]
    async fn test_submit_approved_activates_subscription() {
        let service = service(0.0);
        let outcome = service.submit(valid_form(), Plan::Monthly).await;

        let CheckoutOutcome::Approved { transaction_id } = outcome else {
            panic!("expected approval, got {:?}", outcome);
        };
        assert!(transaction_id.starts_with("MP"));
        assert!(service.manager().has_full_access().await.unwrap());
    }

    #[tokio::test]
    async fn test_submit_declined_leaves_subscription_untouched() {
        let service = service(0.99);
        let outcome = service.submit(valid_form(), Plan::Monthly).await;

        assert_eq!(
            outcome,
            CheckoutOutcome::Declined {
                reason: DeclineReason::CardDeclined
            }
        );
        assert!(!outcome.message().is_empty());
        assert!(!service.manager().has_full_access().await.unwrap());
    }

    #[tokio::test]
    async fn test_submit_invalid_fields_reported_before_authorization() {
        let service = service(0.0);
        let mut form = valid_form();
        form.card_number = "4532015112830367".to_string();
        form.security_code = "1".to_string();

        let outcome = service.submit(form, Plan::Annual).await;
        assert_eq!(
            outcome,
            CheckoutOutcome::Invalid {
                fields: vec![InstrumentField::CardNumber, InstrumentField::SecurityCode]
            }
        );
        assert!(!service.manager().has_full_access().await.unwrap());
    }
}
