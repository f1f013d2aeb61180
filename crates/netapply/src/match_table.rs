//! Rename lookup tables compiled from physical match rules.

use std::collections::HashMap;

use tracing::{debug, warn};

use netapply_types::MacAddress;

use crate::declared::PhysicalMatchRule;

/// Target names keyed by driver and by hardware address.
///
/// Rules are folded in order and a later rule for the same key replaces
/// an earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchTables {
    by_driver: HashMap<String, String>,
    by_hardware_address: HashMap<MacAddress, String>,
}

impl MatchTables {
    /// Builds the tables from rules in declaration order.
    ///
    /// Skips the renderer sentinel, rules without a target name and rules
    /// without a match block. Unparsable hardware addresses are ignored.
    pub fn build<'a, I>(rules: I) -> Self
    where
        I: IntoIterator<Item = &'a PhysicalMatchRule>,
    {
        let mut tables = Self::default();
        for rule in rules {
            if rule.is_renderer_sentinel() {
                continue;
            }
            let Some(target) = rule.target_name.as_deref() else {
                continue;
            };
            let Some(matcher) = rule.matcher.as_ref() else {
                continue;
            };

            if let Some(driver) = matcher.driver.as_deref() {
                if let Some(previous) = tables.by_driver.insert(driver.to_string(), target.to_string()) {
                    if previous != target {
                        debug!(
                            "driver {} remapped from {} to {} by {}",
                            driver, previous, target, rule.id
                        );
                    }
                }
            }

            if let Some(raw) = matcher.hardware_address.as_deref() {
                match raw.parse::<MacAddress>() {
                    Ok(mac) => {
                        if let Some(previous) = tables.by_hardware_address.insert(mac, target.to_string()) {
                            if previous != target {
                                debug!(
                                    "address {} remapped from {} to {} by {}",
                                    mac, previous, target, rule.id
                                );
                            }
                        }
                    }
                    Err(e) => warn!("Ignoring match on {} for {}: {}", raw, rule.id, e),
                }
            }
        }
        tables
    }

    pub fn target_for_driver(&self, driver: &str) -> Option<&str> {
        self.by_driver.get(driver).map(String::as_str)
    }

    pub fn target_for_address(&self, mac: &MacAddress) -> Option<&str> {
        self.by_hardware_address.get(mac).map(String::as_str)
    }

    /// Returns true when no rule can produce a rename.
    pub fn is_empty(&self) -> bool {
        self.by_driver.is_empty() && self.by_hardware_address.is_empty()
    }
}
