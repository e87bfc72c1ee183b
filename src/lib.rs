//! # Fueldrive
//!
//! > **A reactive state-composition engine for a consumable resource with
//! > purchase entitlements.**
//!
//! This crate reconciles three independently-updating, asynchronously
//! arriving state sources (a persisted fuel counter, a set of
//! provider-pushed entitlement flags, and a stream of one-shot notification
//! messages) into derived values a presentation layer can observe, and
//! guards the counter behind a single serialized mutation queue.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Readiness over defaults
//! A derived value is never published on partial data. Until the ledger and
//! every entitlement flag have each produced a first value, the composers
//! publish nothing at all: "no entitlement data yet" must never be misread
//! as "not entitled".
//!
//! ### One queue per shared resource
//! The fuel counter is the only shared mutable state, and every mutation of
//! it (including the drive action, which reads the level and then writes)
//! flows through one actor task. Bounds are enforced by conditional updates
//! inside that task, so the counter stays in range no matter how concurrent
//! submissions interleave.
//!
//! ### Explicit ownership, no singletons
//! [`lifecycle::DriveSystem`] is the single composition root. It constructs
//! the ledger, the entitlement view, and every composer cell once, and
//! passes handles down.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Primitive ([`reactive`])
//! [`Cell`](reactive::Cell): a multi-source observable with readiness
//! gating, per-cell serialized fan-out, and hot vs single-shot attach
//! semantics. Everything observable in this crate is a `Cell`.
//!
//! ### 2. The Resource ([`ledger`])
//! The persisted counter and its actor. Conditional bounded
//! increment/decrement, an advisory scalar read, and an observe cell.
//!
//! ### 3. The Boundary ([`billing`])
//! The provider seam: inbound pushes land in an
//! [`EntitlementView`](billing::EntitlementView); outbound calls go through
//! the [`BillingProvider`](billing::BillingProvider) trait. A recording
//! [`MockBilling`](billing::mock::MockBilling) backs the tests.
//!
//! ### 4. The Rules ([`game`])
//! The derived fuel level (with the unlimited override), per-product
//! purchase eligibility, the message codes with their purchase translation
//! table, and the asymmetric drive outcome table.
//!
//! ### 5. The Orchestrator ([`lifecycle`])
//! [`DriveSystem`](lifecycle::DriveSystem) wires it all together and owns
//! the actor's lifetime, including graceful shutdown.
//!
//! ## 🚀 Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use fueldrive::billing::mock::MockBilling;
//! use fueldrive::ledger::JsonFileStore;
//! use fueldrive::lifecycle::{setup_tracing, DriveSystem};
//!
//! setup_tracing();
//! let store = Box::new(JsonFileStore::new("gamestate.json"));
//! let system = DriveSystem::new(store, Arc::new(MockBilling::new())).await?;
//!
//! system.fuel_level().subscribe(|level| println!("level: {level:?}"));
//! system.drive().await?;
//! ```

pub mod billing;
pub mod game;
pub mod ledger;
pub mod lifecycle;
pub mod reactive;
