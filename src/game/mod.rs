//! Game-side state composition: the effective fuel level, purchase
//! eligibility, the one-shot message stream, and the drive outcome table.
//!
//! Product identifiers and tank bounds live here; they are the shared
//! vocabulary between the billing layer and the game rules.

pub mod drive;
pub mod eligibility;
pub mod level;
pub mod messages;

pub use drive::{drive_outcome, DriveOutcome};
pub use eligibility::{compose_fuel_eligibility, compose_pass_through_eligibility};
pub use level::{compose_fuel_level, FuelLevel, FUEL_TANK_MAX, FUEL_TANK_MIN};
pub use messages::{message_for_purchase, MessageCode};

/// One-time purchase: unlocks the premium car skin.
pub const SKU_PREMIUM: &str = "premium";
/// Consumable purchase: one tank refill unit.
pub const SKU_FUEL: &str = "fuel";
/// Subscription purchase: unlimited fuel, billed monthly.
pub const SKU_UNLIMITED_MONTHLY: &str = "unlimited_fuel_monthly";
/// Subscription purchase: unlimited fuel, billed yearly.
pub const SKU_UNLIMITED_YEARLY: &str = "unlimited_fuel_yearly";

/// One-time (in-app) products.
pub const INAPP_SKUS: &[&str] = &[SKU_PREMIUM, SKU_FUEL];
/// Subscription products. Either one grants the unlimited override.
pub const SUBSCRIPTION_SKUS: &[&str] = &[SKU_UNLIMITED_MONTHLY, SKU_UNLIMITED_YEARLY];
/// Products consumed automatically by the provider after purchase.
pub const AUTO_CONSUME_SKUS: &[&str] = &[SKU_FUEL];
