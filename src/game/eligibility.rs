//! Per-product "can purchase" composition.

use crate::game::level::{FuelLevel, FUEL_TANK_MAX};
use crate::reactive::Cell;

/// Eligibility for the consumable fuel product.
///
/// Eligible iff the provider reports the purchase as allowed AND the derived
/// level is a finite unit count strictly below the full tank: an unlimited
/// subscriber, or a driver with a full tank, cannot buy more fuel. Suppressed
/// until both upstreams have published.
pub fn compose_fuel_eligibility(level: &Cell<FuelLevel>, allowed: &Cell<bool>) -> Cell<bool> {
    let (l, a) = (level.clone(), allowed.clone());
    Cell::derived(&[level, allowed], move || {
        let allowed = a.get()?;
        let level = l.get()?;
        Some(allowed && matches!(level, FuelLevel::Units(units) if units < FUEL_TANK_MAX))
    })
}

/// Eligibility for every other product: the provider's allowed signal as-is.
pub fn compose_pass_through_eligibility(allowed: &Cell<bool>) -> Cell<bool> {
    allowed.clone()
}
