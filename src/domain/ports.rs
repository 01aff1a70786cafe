use super::authorization::Receipt;
use super::subscription::SubscriptionRecord;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository for the single device-local subscription record.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn load(&self) -> Result<Option<SubscriptionRecord>>;
    async fn save(&self, record: SubscriptionRecord) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

/// Repository for receipts of approved charges.
#[async_trait]
pub trait ReceiptStore: Send + Sync {
    async fn store(&self, receipt: Receipt) -> Result<()>;
    async fn get(&self, transaction_id: &str) -> Result<Option<Receipt>>;
    async fn latest(&self) -> Result<Option<Receipt>>;
}

pub type SubscriptionStoreBox = Box<dyn SubscriptionStore>;
pub type ReceiptStoreBox = Box<dyn ReceiptStore>;

/// Wall-clock abstraction so trial expiry and expiry validation stay
/// deterministic under test.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Source of randomness for the authorization simulation.
pub trait RandomSource: Send + Sync {
    /// Uniform draw in `[0, 1)`.
    fn draw(&self) -> f64;
}
