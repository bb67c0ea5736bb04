//! Fixed table of the eight network units.

use std::sync::{Arc, OnceLock};

use fujinet_core::{ErrorCode, UnitNumber, constants::UNIT_COUNT};
use tokio::sync::Mutex;
use tracing::debug;

use crate::unit::Unit;

/// Shared handle to one unit.
pub type SharedUnit = Arc<Mutex<Unit>>;

/// Owner of all unit state.
///
/// Slots are filled lazily with an idle [`Unit`] on first access and never
/// emptied. `OnceLock` serializes creation, so concurrent first accesses see
/// the same unit.
#[derive(Debug)]
pub struct UnitRegistry {
    slots: [OnceLock<SharedUnit>; UNIT_COUNT],
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self {
            slots: [const { OnceLock::new() }; UNIT_COUNT],
        }
    }

    /// Look up a unit by raw number, creating it if needed.
    ///
    /// # Errors
    /// Returns `NoDevice` for numbers outside 1..=8; nothing is created.
    pub fn get(&self, number: u8) -> Result<SharedUnit, ErrorCode> {
        let unit = UnitNumber::new(number).map_err(|_| ErrorCode::NoDevice)?;
        Ok(self.unit(unit))
    }

    /// The unit for a validated number, creating it if needed.
    pub fn unit(&self, number: UnitNumber) -> SharedUnit {
        Arc::clone(self.slots[number.index()].get_or_init(|| {
            debug!(unit = %number, "Creating unit");
            Arc::new(Mutex::new(Unit::new(number)))
        }))
    }

    /// The unit if it has been created.
    pub fn existing(&self, number: UnitNumber) -> Option<SharedUnit> {
        self.slots[number.index()].get().cloned()
    }

    pub fn is_created(&self, number: UnitNumber) -> bool {
        self.slots[number.index()].get().is_some()
    }

    /// Number of units created so far.
    pub fn created(&self) -> usize {
        self.slots.iter().filter(|slot| slot.get().is_some()).count()
    }
}
