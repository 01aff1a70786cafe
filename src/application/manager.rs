use crate::domain::authorization::Receipt;
use crate::domain::plan::Plan;
use crate::domain::ports::{Clock, ReceiptStoreBox, SubscriptionStoreBox};
use crate::domain::subscription::{Entitlements, SubscriptionRecord, SubscriptionStatus};
use crate::error::Result;
use std::sync::Arc;

/// Owns the subscription lifecycle on top of the storage ports.
///
/// Every operation is a full read-modify-write of the single persisted
/// record; trial expiry is applied lazily on each read and written back
/// once, so consecutive reads after expiry agree.
pub struct SubscriptionManager {
    store: SubscriptionStoreBox,
    receipts: ReceiptStoreBox,
    clock: Arc<dyn Clock>,
}

impl SubscriptionManager {
    pub fn new(
        store: SubscriptionStoreBox,
        receipts: ReceiptStoreBox,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            receipts,
            clock,
        }
    }

    /// Current record with lazy trial expiry applied (and persisted when it
    /// fires). A missing record reads as the default free-tier state.
    async fn current(&self) -> Result<SubscriptionRecord> {
        let mut record = self.store.load().await?.unwrap_or_default();
        if record.expire_trial_if_due(self.clock.now()) {
            tracing::info!("trial window elapsed; reverting to free tier");
            self.store.save(record.clone()).await?;
        }
        Ok(record)
    }

    /// Starts the free trial. Returns `false` when the trial was already
    /// consumed (the claim is a no-op in that case).
    pub async fn claim_trial(&self) -> Result<bool> {
        let mut record = self.current().await?;
        if !record.claim_trial(self.clock.now()) {
            tracing::debug!("trial claim rejected; already consumed");
            return Ok(false);
        }
        self.store.save(record).await?;
        tracing::info!("trial started");
        Ok(true)
    }

    /// Records an approved authorization: activates the subscription and
    /// appends the receipt.
    pub async fn record_approval(&self, transaction_id: &str, plan: Plan) -> Result<()> {
        let mut record = self.current().await?;
        record.record_approval(transaction_id, plan);
        self.store.save(record).await?;
        self.receipts
            .store(Receipt {
                transaction_id: transaction_id.to_string(),
                amount: plan.price(),
                plan,
                date: self.clock.now(),
            })
            .await?;
        tracing::info!(%transaction_id, %plan, "subscription activated");
        Ok(())
    }

    /// Cancels the subscription, clearing plan, trial window and
    /// transaction reference.
    pub async fn cancel(&self) -> Result<()> {
        let mut record = self.current().await?;
        record.cancel();
        self.store.save(record).await?;
        tracing::info!("subscription cancelled");
        Ok(())
    }

    pub async fn status(&self) -> Result<SubscriptionStatus> {
        Ok(self.current().await?.status)
    }

    pub async fn has_full_access(&self) -> Result<bool> {
        let record = self.current().await?;
        Ok(record.has_full_access(self.clock.now()))
    }

    pub async fn trial_days_left(&self) -> Result<i64> {
        let record = self.current().await?;
        Ok(record.trial_days_left(self.clock.now()))
    }

    pub async fn needs_upgrade(&self) -> Result<bool> {
        let record = self.current().await?;
        Ok(record.needs_upgrade(self.clock.now()))
    }

    pub async fn entitlements(&self) -> Result<Entitlements> {
        Ok(Entitlements::for_access(self.has_full_access().await?))
    }

    /// Snapshot of the stored record, expiry applied.
    pub async fn record(&self) -> Result<SubscriptionRecord> {
        self.current().await
    }

    pub async fn latest_receipt(&self) -> Result<Option<Receipt>> {
        self.receipts.latest().await
    }
}
