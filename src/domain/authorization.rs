use super::instrument::InstrumentField;
use super::plan::{Amount, Plan};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why an authorization attempt was declined.
///
/// Field failures are deterministic and reported before the simulated
/// network call; `CardDeclined` is the randomized issuer outcome. The UI
/// renders different messages for the two classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclineReason {
    InvalidField(InstrumentField),
    CardDeclined,
}

impl DeclineReason {
    pub fn is_validation_failure(&self) -> bool {
        matches!(self, DeclineReason::InvalidField(_))
    }

    /// User-facing decline message.
    pub fn message(&self) -> String {
        match self {
            DeclineReason::InvalidField(field) => format!("Invalid {}.", field),
            DeclineReason::CardDeclined => {
                "Payment declined. Check the card details or try another payment method."
                    .to_string()
            }
        }
    }
}

/// Outcome of a single authorization attempt.
///
/// Immutable once produced and never retried automatically; a fresh submit
/// starts a fresh, independent attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationResult {
    Approved { transaction_id: String },
    Declined { reason: DeclineReason },
}

impl AuthorizationResult {
    pub fn approved(&self) -> bool {
        matches!(self, AuthorizationResult::Approved { .. })
    }

    pub fn transaction_id(&self) -> Option<&str> {
        match self {
            AuthorizationResult::Approved { transaction_id } => Some(transaction_id),
            AuthorizationResult::Declined { .. } => None,
        }
    }

    pub fn decline_reason(&self) -> Option<DeclineReason> {
        match self {
            AuthorizationResult::Approved { .. } => None,
            AuthorizationResult::Declined { reason } => Some(*reason),
        }
    }
}

/// Persisted record of an approved charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub transaction_id: String,
    pub amount: Amount,
    pub plan: Plan,
    pub date: DateTime<Utc>,
}
