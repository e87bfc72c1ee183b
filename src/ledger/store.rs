//! Persistence seam for the fuel counter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

use crate::ledger::error::StoreError;

/// Fixed identifier the counter is persisted under.
pub const FUEL_COUNTER_KEY: &str = "fuel";

/// Storage backend for the single persisted scalar.
///
/// Writes are issued from the ledger actor's queue and are treated as
/// durable on return.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Reads the persisted value. `Ok(None)` means the store has never been
    /// written; an unreadable record is an error, not a default.
    async fn load(&self) -> Result<Option<i32>, StoreError>;

    /// Persists `value`, replacing any previous record.
    async fn save(&self, value: i32) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: LedgerStore + ?Sized> LedgerStore for std::sync::Arc<S> {
    async fn load(&self) -> Result<Option<i32>, StoreError> {
        (**self).load().await
    }

    async fn save(&self, value: i32) -> Result<(), StoreError> {
        (**self).save(value).await
    }
}

#[derive(Serialize, Deserialize)]
struct CounterRecord {
    key: String,
    value: i32,
}

/// Counter persisted as a small JSON record in a single file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl LedgerStore for JsonFileStore {
    async fn load(&self) -> Result<Option<i32>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record: CounterRecord = serde_json::from_slice(&bytes)?;
        debug!(key = %record.key, value = record.value, "Loaded counter");
        Ok(Some(record.value))
    }

    async fn save(&self, value: i32) -> Result<(), StoreError> {
        let record = CounterRecord {
            key: FUEL_COUNTER_KEY.to_string(),
            value,
        };
        let bytes = serde_json::to_vec(&record).map_err(StoreError::Corrupt)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryStore {
    value: Mutex<Option<i32>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `value`, as if written by a previous run.
    pub fn seeded(value: i32) -> Self {
        Self {
            value: Mutex::new(Some(value)),
        }
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn load(&self) -> Result<Option<i32>, StoreError> {
        Ok(*self.value.lock().unwrap())
    }

    async fn save(&self, value: i32) -> Result<(), StoreError> {
        *self.value.lock().unwrap() = Some(value);
        Ok(())
    }
}
