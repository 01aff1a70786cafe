use crate::domain::authorization::{AuthorizationResult, DeclineReason};
use crate::domain::instrument::PaymentInstrument;
use crate::domain::plan::{Amount, Plan};
use crate::domain::ports::{Clock, RandomSource};
use std::sync::Arc;
use std::time::Duration;

/// Simulated round-trip latency of the card network.
pub const DEFAULT_LATENCY: Duration = Duration::from_secs(2);
/// Probability that a valid instrument is approved.
pub const DEFAULT_APPROVAL_RATE: f64 = 0.9;

const TRANSACTION_PREFIX: &str = "MP";
const SUFFIX_LEN: usize = 9;
const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Simulates a card-network authorization round trip.
///
/// Field checks always run first and short-circuit deterministically: a
/// malformed instrument is never approved by chance and consumes neither
/// the latency window nor a randomness draw. Only a fully valid instrument
/// reaches the probabilistic approve/decline stage.
///
/// The call never fails; every outcome is an [`AuthorizationResult`].
/// Dropping the returned future cancels the pending simulated request, so
/// a dismissed checkout screen leaks no state update.
pub struct AuthorizationGateway {
    random: Arc<dyn RandomSource>,
    clock: Arc<dyn Clock>,
    latency: Duration,
    approval_rate: f64,
}

impl AuthorizationGateway {
    pub fn new(random: Arc<dyn RandomSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            random,
            clock,
            latency: DEFAULT_LATENCY,
            approval_rate: DEFAULT_APPROVAL_RATE,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_approval_rate(mut self, rate: f64) -> Self {
        self.approval_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Authorizes a charge against the simulated network.
    ///
    /// Each call is independent; retrying is the caller's decision and
    /// starts from scratch.
    pub async fn authorize(
        &self,
        instrument: &PaymentInstrument,
        amount: Amount,
        plan: Plan,
    ) -> AuthorizationResult {
        let today = self.clock.now().date_naive();
        if let Some(field) = instrument.first_invalid_field(today) {
            tracing::debug!(field = %field, "authorization rejected before dispatch");
            return AuthorizationResult::Declined {
                reason: DeclineReason::InvalidField(field),
            };
        }

        tracing::debug!(
            brand = %instrument.brand(),
            %amount,
            %plan,
            latency_ms = self.latency.as_millis() as u64,
            "dispatching simulated authorization"
        );
        tokio::time::sleep(self.latency).await;

        if self.random.draw() < self.approval_rate {
            let transaction_id = self.next_transaction_id();
            tracing::info!(%transaction_id, "authorization approved");
            AuthorizationResult::Approved { transaction_id }
        } else {
            tracing::info!("authorization declined by issuer simulation");
            AuthorizationResult::Declined {
                reason: DeclineReason::CardDeclined,
            }
        }
    }

    // Epoch millis plus a random suffix: unique per call, recognizable prefix.
    fn next_transaction_id(&self) -> String {
        let millis = self.clock.now().timestamp_millis();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| {
                let index = (self.random.draw() * SUFFIX_CHARSET.len() as f64) as usize;
                SUFFIX_CHARSET[index.min(SUFFIX_CHARSET.len() - 1)] as char
            })
            .collect();
        format!("{}{}{}", TRANSACTION_PREFIX, millis, suffix)
    }
}
