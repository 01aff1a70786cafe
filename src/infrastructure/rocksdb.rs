use crate::domain::authorization::Receipt;
use crate::domain::ports::{ReceiptStore, SubscriptionStore};
use crate::domain::subscription::SubscriptionRecord;
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family for the subscription record.
pub const CF_SUBSCRIPTION: &str = "subscription";
/// Column Family for receipts of approved charges.
pub const CF_RECEIPTS: &str = "receipts";

const RECORD_KEY: &[u8] = b"record";

/// A persistent store implementation using RocksDB.
///
/// Holds the subscription record under a fixed key and receipts keyed by
/// transaction id, in separate Column Families.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_subscription = ColumnFamilyDescriptor::new(CF_SUBSCRIPTION, Options::default());
        let cf_receipts = ColumnFamilyDescriptor::new(CF_RECEIPTS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_subscription, cf_receipts])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf_handle(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| CheckoutError::Storage(format!("{} column family not found", name)))
    }
}

#[async_trait]
impl SubscriptionStore for RocksDbStore {
    async fn load(&self) -> Result<Option<SubscriptionRecord>> {
        let cf = self.cf_handle(CF_SUBSCRIPTION)?;
        match self.db.get_cf(&cf, RECORD_KEY)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, record: SubscriptionRecord) -> Result<()> {
        let cf = self.cf_handle(CF_SUBSCRIPTION)?;
        let value = serde_json::to_vec(&record)?;
        self.db.put_cf(&cf, RECORD_KEY, value)?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let cf = self.cf_handle(CF_SUBSCRIPTION)?;
        self.db.delete_cf(&cf, RECORD_KEY)?;
        Ok(())
    }
}

#[async_trait]
impl ReceiptStore for RocksDbStore {
    async fn store(&self, receipt: Receipt) -> Result<()> {
        let cf = self.cf_handle(CF_RECEIPTS)?;
        let value = serde_json::to_vec(&receipt)?;
        self.db
            .put_cf(&cf, receipt.transaction_id.as_bytes(), value)?;
        Ok(())
    }

    async fn get(&self, transaction_id: &str) -> Result<Option<Receipt>> {
        let cf = self.cf_handle(CF_RECEIPTS)?;
        match self.db.get_cf(&cf, transaction_id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn latest(&self) -> Result<Option<Receipt>> {
        let cf = self.cf_handle(CF_RECEIPTS)?;
        let mut latest: Option<Receipt> = None;
        for item in self.db.iterator_cf(&cf, rocksdb::IteratorMode::Start) {
            let (_key, value) =
                item.map_err(|e| CheckoutError::Storage(format!("iteration error: {}", e)))?;
            let receipt: Receipt = serde_json::from_slice(&value)?;
            if latest.as_ref().is_none_or(|r| receipt.date > r.date) {
                latest = Some(receipt);
            }
        }
        Ok(latest)
    }
}
