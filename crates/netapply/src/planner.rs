//! Rename planner.
//!
//! Combines declared rules, composite membership and live device state
//! into the set of renames to apply. Planning has no side effects.

use std::collections::BTreeMap;

use tracing::{debug, error};

use netapply_common::DeviceInventory;

use crate::classifier::{DeviceClass, DeviceClassifier};
use crate::composite::CompositeFilter;
use crate::declared::DeclaredConfig;
use crate::match_table::MatchTables;

/// Requested change for one interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkChange {
    /// New interface name.
    pub name: String,
}

/// Current interface name to requested change.
pub type RenameChangeSet = BTreeMap<String, LinkChange>;

/// Computes a [`RenameChangeSet`] for a snapshot of live interfaces.
pub struct RenamePlanner<'a> {
    declared: &'a DeclaredConfig,
    tables: MatchTables,
    composites: CompositeFilter<'a>,
    classifier: DeviceClassifier<'a>,
    inventory: &'a dyn DeviceInventory,
}

impl<'a> RenamePlanner<'a> {
    pub fn new(declared: &'a DeclaredConfig, inventory: &'a dyn DeviceInventory) -> Self {
        Self {
            declared,
            tables: MatchTables::build(declared.physical_rules()),
            composites: CompositeFilter::new(declared.composites()),
            classifier: DeviceClassifier::new(inventory),
            inventory,
        }
    }

    /// Plans renames for `interfaces`.
    pub fn plan(&self, interfaces: &[String]) -> RenameChangeSet {
        let mut changes = RenameChangeSet::new();
        if self.tables.is_empty() {
            debug!("No match rules can rename a device");
            return changes;
        }
        for interface in interfaces {
            if let Some(name) = self.target_for(interface) {
                changes.insert(interface.clone(), LinkChange { name });
            }
        }
        debug!("Link changes: {:?}", changes);
        changes
    }

    fn target_for(&self, interface: &str) -> Option<String> {
        if !self.declared.is_physical(interface) {
            debug!("Skipping non-physical interface: {}", interface);
            return None;
        }
        if self.composites.is_member(interface) {
            debug!("Skipping composite member {}", interface);
            return None;
        }

        let driver = match self.classifier.classify(interface) {
            Ok(DeviceClass::Eligible { driver }) => driver,
            Ok(DeviceClass::Active { state }) => {
                debug!("device {} operstate is {}, not changing", interface, state);
                return None;
            }
            Err(e) => {
                error!("{}", e);
                return None;
            }
        };

        let mut new_name = None;
        if let Some(target) = driver
            .as_deref()
            .and_then(|d| self.tables.target_for_driver(d))
        {
            if target != interface {
                new_name = Some(target.to_string());
            }
        }
        // Evaluated second so an address match overrides a driver match.
        if let Some(target) = self
            .inventory
            .hardware_address(interface)
            .and_then(|mac| self.tables.target_for_address(&mac))
        {
            if target != interface {
                new_name = Some(target.to_string());
            }
        }
        new_name
    }
}
