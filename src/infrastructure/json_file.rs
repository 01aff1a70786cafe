use crate::domain::authorization::Receipt;
use crate::domain::ports::{ReceiptStore, SubscriptionStore};
use crate::domain::subscription::SubscriptionRecord;
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// File name of the subscription blob inside the state directory.
pub const SUBSCRIPTION_KEY: &str = "subscription.json";
/// File name of the receipt log inside the state directory.
pub const RECEIPTS_KEY: &str = "receipts.json";

/// Device-local persistence: one JSON blob per fixed key under a state
/// directory. Everything round-trips losslessly across process restarts.
///
/// A single mutex serializes writers so the receipt log's read-modify-write
/// cannot lose updates (`Clone` shares the lock).
#[derive(Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonFileStore {
    /// Opens the store, creating the state directory if missing.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        std::fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    fn read_key<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.key_path(key);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write_key<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        std::fs::write(self.key_path(key), bytes)?;
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for JsonFileStore {
    async fn load(&self) -> Result<Option<SubscriptionRecord>> {
        self.read_key(SUBSCRIPTION_KEY)
    }

    async fn save(&self, record: SubscriptionRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_key(SUBSCRIPTION_KEY, &record)
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        match std::fs::remove_file(self.key_path(SUBSCRIPTION_KEY)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl ReceiptStore for JsonFileStore {
    async fn store(&self, receipt: Receipt) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut receipts: Vec<Receipt> = self.read_key(RECEIPTS_KEY)?.unwrap_or_default();
        receipts.push(receipt);
        self.write_key(RECEIPTS_KEY, &receipts)
    }

    async fn get(&self, transaction_id: &str) -> Result<Option<Receipt>> {
        let receipts: Vec<Receipt> = self.read_key(RECEIPTS_KEY)?.unwrap_or_default();
        Ok(receipts
            .into_iter()
            .find(|receipt| receipt.transaction_id == transaction_id))
    }

    async fn latest(&self) -> Result<Option<Receipt>> {
        let receipts: Vec<Receipt> = self.read_key(RECEIPTS_KEY)?.unwrap_or_default();
        Ok(receipts.into_iter().next_back())
    }
}
