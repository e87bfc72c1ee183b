//! The persisted fuel counter and its serialized mutation queue.
//!
//! The ledger owns the only persisted quantity in the system: a single
//! scalar in `[FUEL_TANK_MIN, FUEL_TANK_MAX]`, keyed by a fixed identifier
//! and seeded to the maximum on first creation.
//!
//! # Concurrency Model
//!
//! All mutations flow through one actor task and are therefore totally
//! ordered by submission. Increment and decrement are *conditional bounded*
//! updates: a mutation that would leave the range is silently absorbed as a
//! no-op, which keeps the counter in bounds regardless of how concurrent
//! submissions interleave. The drive action runs on the same queue, so a
//! drive's read of the level and its decrement can never be split by another
//! mutation.
//!
//! [`Ledger::current_value`] is an advisory direct read of the latest value;
//! any read-then-write sequence must route the write through the queue and
//! treat that read as possibly stale.

pub mod actor;
pub mod error;
pub mod store;

pub use actor::{DriveContext, Ledger, LedgerActor, WeakLedger};
pub use error::{LedgerError, StoreError};
pub use store::{JsonFileStore, LedgerStore, MemoryStore, FUEL_COUNTER_KEY};
