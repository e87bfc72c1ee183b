//! The effective fuel level: persisted tank units overridden by either
//! unlimited subscription.

use crate::reactive::Cell;

/// Empty tank.
pub const FUEL_TANK_MIN: i32 = 0;
/// Full tank, and the value the ledger is seeded with on first creation.
pub const FUEL_TANK_MAX: i32 = 4;

/// The fuel quantity as seen by game logic, after entitlement overrides.
///
/// `Units` is always within `[FUEL_TANK_MIN, FUEL_TANK_MAX]`. `Unlimited` is
/// an active subscription override and is distinct from every unit count.
/// This value is computed, never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FuelLevel {
    Units(i32),
    Unlimited,
}

/// Builds the derived fuel-level cell from the ledger's observe cell and the
/// two unlimited subscription flags.
///
/// Publishes nothing until the tank AND both flag cells have each produced a
/// first value: before the provider's first entitlement snapshot, "no data
/// yet" must not be misread as "not entitled", so publication is suppressed
/// entirely rather than showing a wrong integer level.
pub fn compose_fuel_level(
    tank: &Cell<i32>,
    monthly: &Cell<bool>,
    yearly: &Cell<bool>,
) -> Cell<FuelLevel> {
    let (t, m, y) = (tank.clone(), monthly.clone(), yearly.clone());
    Cell::derived(&[tank, monthly, yearly], move || {
        let monthly = m.get()?;
        let yearly = y.get()?;
        let units = t.get()?;
        Some(if monthly || yearly {
            FuelLevel::Unlimited
        } else {
            FuelLevel::Units(units)
        })
    })
}
