use crate::domain::authorization::Receipt;
use crate::domain::ports::{ReceiptStore, SubscriptionStore};
use crate::domain::subscription::SubscriptionRecord;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for the subscription record.
///
/// Uses `Arc<RwLock<...>>` to allow shared concurrent access. Ideal for
/// tests or throwaway simulation runs where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemorySubscriptionStore {
    record: Arc<RwLock<Option<SubscriptionRecord>>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn load(&self) -> Result<Option<SubscriptionRecord>> {
        let record = self.record.read().await;
        Ok(record.clone())
    }

    async fn save(&self, record: SubscriptionRecord) -> Result<()> {
        let mut slot = self.record.write().await;
        *slot = Some(record);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut slot = self.record.write().await;
        *slot = None;
        Ok(())
    }
}

/// A thread-safe in-memory store for receipts, in insertion order.
#[derive(Default, Clone)]
pub struct InMemoryReceiptStore {
    receipts: Arc<RwLock<Vec<Receipt>>>,
}

impl InMemoryReceiptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReceiptStore for InMemoryReceiptStore {
    async fn store(&self, receipt: Receipt) -> Result<()> {
        let mut receipts = self.receipts.write().await;
        receipts.push(receipt);
        Ok(())
    }

    async fn get(&self, transaction_id: &str) -> Result<Option<Receipt>> {
        let receipts = self.receipts.read().await;
        Ok(receipts
            .iter()
            .find(|receipt| receipt.transaction_id == transaction_id)
            .cloned())
    }

    async fn latest(&self) -> Result<Option<Receipt>> {
        let receipts = self.receipts.read().await;
        Ok(receipts.last().cloned())
    }
}
