//! Error types for the ledger and its persistence backend.

use thiserror::Error;

/// Errors from the persistence backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted record exists but cannot be decoded. This indicates an
    /// invariant breach; callers treat it as unrecoverable.
    #[error("store contains an unreadable record: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The persistence backend failed.
    #[error("ledger store error: {0}")]
    Store(#[from] StoreError),

    /// The ledger actor's queue is closed.
    #[error("ledger actor closed")]
    ActorClosed,

    /// The ledger actor dropped the response channel.
    #[error("ledger actor dropped response channel")]
    ActorDropped,
}
