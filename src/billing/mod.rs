//! The boundary with the external entitlement/purchase provider.
//!
//! The provider is an external collaborator: it pushes ownership snapshots,
//! purchase results, and purchase-availability signals *into* the core
//! through an [`EntitlementView`] handle, and the core calls *out* through
//! the small [`BillingProvider`] trait (refresh, start a purchase flow).
//! Nothing in here implements an actual checkout protocol.

pub mod entitlements;
pub mod mock;
pub mod provider;

pub use entitlements::EntitlementView;
pub use provider::BillingProvider;
