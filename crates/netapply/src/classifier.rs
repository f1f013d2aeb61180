//! Device-state classifier.
//!
//! Decides, for one live interface, whether it is safe to rename (it must
//! be operationally `down`) and which kernel driver it is bound to.

use tracing::debug;

use netapply_common::{ApplyError, ApplyResult, DeviceInventory};
use netapply_types::OperState;

/// Outcome of classifying a single device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceClass {
    /// Down and therefore renameable. `driver` is `None` when the device
    /// has no resolvable driver; address matching still applies.
    Eligible { driver: Option<String> },
    /// Any state other than down.
    Active { state: OperState },
}

/// Classifies devices using a [`DeviceInventory`].
#[derive(Clone, Copy)]
pub struct DeviceClassifier<'a> {
    inventory: &'a dyn DeviceInventory,
}

impl<'a> DeviceClassifier<'a> {
    pub fn new(inventory: &'a dyn DeviceInventory) -> Self {
        Self { inventory }
    }

    /// Classifies `device`.
    ///
    /// Returns [`ApplyError::DeviceState`] when the operstate attribute
    /// cannot be read. Unrecognised states count as [`OperState::Unknown`].
    pub fn classify(&self, device: &str) -> ApplyResult<DeviceClass> {
        let raw = self
            .inventory
            .oper_state(device)
            .map_err(|source| ApplyError::DeviceState {
                device: device.to_string(),
                source,
            })?;

        let state = raw.parse::<OperState>().unwrap_or_else(|_| {
            debug!("{} reports unrecognised operstate '{}'", device, raw);
            OperState::Unknown
        });
        if !state.is_down() {
            return Ok(DeviceClass::Active { state });
        }

        Ok(DeviceClass::Eligible {
            driver: self.inventory.driver_name(device),
        })
    }
}
