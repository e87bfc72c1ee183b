//! Runtime orchestration: constructing and wiring the whole system.
//!
//! There is no ambient singleton anywhere in this crate. [`DriveSystem`] is
//! the single composition root: it opens the ledger, builds the entitlement
//! view and every composer cell exactly once, spawns the ledger actor with
//! its late-bound context, and hands references down.

pub mod drive_system;
pub mod tracing;

pub use drive_system::DriveSystem;
pub use tracing::setup_tracing;
