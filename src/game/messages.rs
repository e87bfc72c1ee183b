//! One-shot notification codes surfaced to the presentation layer.

use crate::game::{SKU_FUEL, SKU_PREMIUM, SKU_UNLIMITED_MONTHLY, SKU_UNLIMITED_YEARLY};

/// An opaque notification code representing a fact to surface once.
///
/// A code has no identity beyond its variant; repeated emissions of the same
/// code are distinct notifications and are never deduplicated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageCode {
    /// A drive succeeded and consumed one unit of fuel.
    Consumed,
    /// The tank is (or just became) empty.
    OutOfFuel,
    /// A drive happened under an unlimited subscription; no fuel used.
    UnlimitedDrive,
    /// A fuel purchase completed.
    FuelPurchased,
    /// The premium upgrade purchase completed.
    PremiumPurchased,
    /// An unlimited subscription purchase completed.
    Subscribed,
    /// A purchase flow could not be started.
    PurchaseFlowUnavailable,
}

/// Fixed translation table from a completed purchase's product id to the
/// message code announced on the bus. Unknown products map to nothing.
pub fn message_for_purchase(sku: &str) -> Option<MessageCode> {
    match sku {
        SKU_FUEL => Some(MessageCode::FuelPurchased),
        SKU_PREMIUM => Some(MessageCode::PremiumPurchased),
        SKU_UNLIMITED_MONTHLY | SKU_UNLIMITED_YEARLY => Some(MessageCode::Subscribed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_subscription_tiers_announce_subscribed() {
        assert_eq!(
            message_for_purchase(SKU_UNLIMITED_MONTHLY),
            Some(MessageCode::Subscribed)
        );
        assert_eq!(
            message_for_purchase(SKU_UNLIMITED_YEARLY),
            Some(MessageCode::Subscribed)
        );
    }

    #[test]
    fn unknown_products_map_to_nothing() {
        assert_eq!(message_for_purchase("mystery_box"), None);
    }
}
