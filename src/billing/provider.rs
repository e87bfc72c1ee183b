//! Operations the core invokes on the external provider.

/// The outbound half of the provider boundary.
///
/// The inbound half (ownership/purchase/availability pushes) arrives through
/// [`EntitlementView`](crate::billing::EntitlementView) handles; the provider
/// integration holds one and calls its push methods from its own
/// notification mechanism.
pub trait BillingProvider: Send + Sync {
    /// Ask the provider to re-deliver the current ownership state for every
    /// tracked product. Used after a subscription tier switch, where the
    /// provider's own push may lag.
    fn refresh_purchases(&self);

    /// Start a purchase flow for `sku`. `replace_sku`, when present, names a
    /// subscription the purchase upgrades or downgrades from.
    ///
    /// Returns whether the flow could be *started*; success or failure of
    /// the purchase itself arrives later as a purchase-completed push.
    fn launch_purchase_flow(&self, sku: &str, replace_sku: Option<&str>) -> bool;
}
