//! The drive outcome table: what one drive does to the tank and which
//! message it raises, given the level at invocation time.

use crate::game::level::{FuelLevel, FUEL_TANK_MIN};
use crate::game::messages::MessageCode;

/// Result of evaluating one drive attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DriveOutcome {
    /// Whether the ledger should be decremented (bounded at the tank floor).
    pub consumes_fuel: bool,
    /// The message announced for this drive.
    pub message: MessageCode,
}

/// Evaluates the drive table for the level read at invocation time.
///
/// The one-unit case deliberately consumes the last unit AND reports the
/// out-of-fuel message: the warning appears on the drive that empties the
/// tank, not on the next attempt. This asymmetry is intended behavior.
pub fn drive_outcome(level: FuelLevel) -> DriveOutcome {
    match level {
        FuelLevel::Unlimited => DriveOutcome {
            consumes_fuel: false,
            message: MessageCode::UnlimitedDrive,
        },
        FuelLevel::Units(units) if units <= FUEL_TANK_MIN => DriveOutcome {
            consumes_fuel: false,
            message: MessageCode::OutOfFuel,
        },
        FuelLevel::Units(units) if units == FUEL_TANK_MIN + 1 => DriveOutcome {
            consumes_fuel: true,
            message: MessageCode::OutOfFuel,
        },
        FuelLevel::Units(_) => DriveOutcome {
            consumes_fuel: true,
            message: MessageCode::Consumed,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_never_consumes() {
        let outcome = drive_outcome(FuelLevel::Unlimited);
        assert!(!outcome.consumes_fuel);
        assert_eq!(outcome.message, MessageCode::UnlimitedDrive);
    }

    #[test]
    fn empty_tank_is_a_no_op_with_a_warning() {
        let outcome = drive_outcome(FuelLevel::Units(FUEL_TANK_MIN));
        assert!(!outcome.consumes_fuel);
        assert_eq!(outcome.message, MessageCode::OutOfFuel);
    }

    #[test]
    fn last_unit_consumes_but_still_warns() {
        // Regression guard for the asymmetric boundary case.
        let outcome = drive_outcome(FuelLevel::Units(FUEL_TANK_MIN + 1));
        assert!(outcome.consumes_fuel);
        assert_eq!(outcome.message, MessageCode::OutOfFuel);
    }

    #[test]
    fn plenty_of_fuel_consumes_and_reports_success() {
        for units in (FUEL_TANK_MIN + 2)..=4 {
            let outcome = drive_outcome(FuelLevel::Units(units));
            assert!(outcome.consumes_fuel);
            assert_eq!(outcome.message, MessageCode::Consumed);
        }
    }
}
