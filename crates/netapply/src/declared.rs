//! Declared configuration accessor.
//!
//! Reads netplan YAML from the configured directories and exposes the parts
//! the reconciliation pass needs: physical interface definitions with their
//! match rules, and bridge/bond membership.
//!
//! Files are layered by basename: `/run/netplan/01-a.yaml` shadows
//! `/etc/netplan/01-a.yaml`, which shadows `/lib/netplan/01-a.yaml`. The
//! surviving files are merged in basename order.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use netapply_common::{ApplyError, ApplyResult};

/// Key under a device-type section that selects a renderer instead of
/// naming an interface.
pub const RENDERER_KEY: &str = "renderer";

/// Device-type sections whose entries are physical interfaces.
const PHYSICAL_SECTIONS: [&str; 2] = ["ethernets", "wifis"];

/// `match:` block of a physical interface definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MatchCriteria {
    #[serde(default)]
    pub driver: Option<String>,

    #[serde(default, rename = "macaddress")]
    pub hardware_address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PhysicalSettings {
    #[serde(default, rename = "match")]
    matcher: Option<MatchCriteria>,

    #[serde(default, rename = "set-name")]
    set_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CompositeSettings {
    #[serde(default)]
    interfaces: Vec<String>,
}

/// Declared intent for one physical interface.
///
/// The renderer sentinel and definitions without `set-name` or `match`
/// are kept here; they simply never produce a rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalMatchRule {
    pub id: String,
    pub target_name: Option<String>,
    pub matcher: Option<MatchCriteria>,
}

impl PhysicalMatchRule {
    /// Returns true for the renderer-selection entry.
    pub fn is_renderer_sentinel(&self) -> bool {
        self.id == RENDERER_KEY
    }
}

/// A declared bridge or bond and its member interfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeSpec {
    pub id: String,
    pub members: BTreeSet<String>,
}

/// Parsed declared state for one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredConfig {
    physical: Vec<PhysicalMatchRule>,
    composites: Vec<CompositeSpec>,
}

impl DeclaredConfig {
    /// Parses a single YAML document.
    pub fn from_yaml_str(yaml: &str) -> ApplyResult<Self> {
        let value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| ApplyError::configuration(format!("invalid YAML: {}", e)))?;
        Self::from_value(&value)
    }

    /// Interprets an already merged YAML tree.
    pub fn from_value(root: &Value) -> ApplyResult<Self> {
        let network = match root {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(map) => match map.get("network") {
                None | Some(Value::Null) => return Ok(Self::default()),
                Some(Value::Mapping(network)) => network,
                Some(_) => return Err(ApplyError::configuration("'network' must be a mapping")),
            },
            _ => return Err(ApplyError::configuration("top level must be a mapping")),
        };

        let mut physical: Vec<PhysicalMatchRule> = Vec::new();
        for section in PHYSICAL_SECTIONS {
            for (id, settings) in section_entries(network, section)? {
                let rule = parse_physical(&id, settings)?;
                // A later section redefining an id replaces it in place.
                match physical.iter_mut().find(|r| r.id == rule.id) {
                    Some(existing) => *existing = rule,
                    None => physical.push(rule),
                }
            }
        }

        let mut composites = Vec::new();
        for section in ["bridges", "bonds"] {
            for (id, settings) in section_entries(network, section)? {
                if id == RENDERER_KEY {
                    continue;
                }
                let settings: CompositeSettings = if settings.is_null() {
                    CompositeSettings::default()
                } else {
                    serde_yaml::from_value(settings).map_err(|e| {
                        ApplyError::configuration(format!("invalid {} definition {}: {}", section, id, e))
                    })?
                };
                composites.push(CompositeSpec {
                    id,
                    members: settings.interfaces.into_iter().collect(),
                });
            }
        }

        Ok(Self {
            physical,
            composites,
        })
    }

    /// Physical definitions in declaration order, sentinel included.
    pub fn physical_rules(&self) -> &[PhysicalMatchRule] {
        &self.physical
    }

    /// Returns true if `name` is a declared physical interface id.
    pub fn is_physical(&self, name: &str) -> bool {
        name != RENDERER_KEY && self.physical.iter().any(|r| r.id == name)
    }

    /// Declared bridges followed by declared bonds.
    pub fn composites(&self) -> &[CompositeSpec] {
        &self.composites
    }
}

fn section_entries(network: &Mapping, section: &str) -> ApplyResult<Vec<(String, Value)>> {
    match network.get(section) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Mapping(entries)) => entries
            .iter()
            .map(|(key, value)| {
                key.as_str()
                    .map(|id| (id.to_string(), value.clone()))
                    .ok_or_else(|| {
                        ApplyError::configuration(format!("{} keys must be strings", section))
                    })
            })
            .collect(),
        Some(_) => Err(ApplyError::configuration(format!(
            "'{}' must be a mapping",
            section
        ))),
    }
}

fn parse_physical(id: &str, settings: Value) -> ApplyResult<PhysicalMatchRule> {
    if id == RENDERER_KEY || settings.is_null() {
        return Ok(PhysicalMatchRule {
            id: id.to_string(),
            target_name: None,
            matcher: None,
        });
    }
    let settings: PhysicalSettings = serde_yaml::from_value(settings)
        .map_err(|e| ApplyError::configuration(format!("invalid definition {}: {}", id, e)))?;
    Ok(PhysicalMatchRule {
        id: id.to_string(),
        target_name: settings.set_name,
        matcher: settings.matcher,
    })
}

/// Deep-merges `overlay` into `base`: mappings merge key by key, anything
/// else is replaced. A null overlay (empty file) changes nothing.
pub fn merge_yaml(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_yaml(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Source of declared configuration, re-read on every call.
pub trait DeclaredConfigSource: Send + Sync {
    fn load(&self) -> ApplyResult<DeclaredConfig>;
}

impl DeclaredConfigSource for DeclaredConfig {
    fn load(&self) -> ApplyResult<DeclaredConfig> {
        Ok(self.clone())
    }
}

/// Loads declared configuration from netplan YAML directories.
#[derive(Debug, Clone)]
pub struct NetplanConfigLoader {
    dirs: Vec<PathBuf>,
}

impl NetplanConfigLoader {
    /// `dirs` are listed lowest precedence first.
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Effective configuration files in merge order.
    pub fn config_files(&self) -> ApplyResult<Vec<PathBuf>> {
        let mut by_name: BTreeMap<String, PathBuf> = BTreeMap::new();
        for dir in &self.dirs {
            let dir_str = dir.to_str().ok_or_else(|| {
                ApplyError::configuration(format!("non UTF-8 path {}", dir.display()))
            })?;
            let pattern = format!("{}/*.yaml", glob::Pattern::escape(dir_str));
            let entries = glob::glob(&pattern).map_err(|e| {
                ApplyError::configuration(format!("invalid pattern {}: {}", pattern, e))
            })?;
            for path in entries.flatten() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    by_name.insert(name.to_string(), path.clone());
                }
            }
        }
        Ok(by_name.into_values().collect())
    }

    /// Reads and merges every effective file into one YAML tree.
    pub fn merged_value(&self) -> ApplyResult<Value> {
        let mut merged = Value::Null;
        for path in self.config_files()? {
            debug!("Reading declared config {}", path.display());
            let content = fs::read_to_string(&path).map_err(|e| ApplyError::io(&path, e))?;
            let value: Value = serde_yaml::from_str(&content).map_err(|e| {
                ApplyError::configuration(format!("invalid YAML in {}: {}", path.display(), e))
            })?;
            if merged.is_null() {
                merged = value;
            } else {
                merge_yaml(&mut merged, value);
            }
        }
        Ok(merged)
    }
}

impl DeclaredConfigSource for NetplanConfigLoader {
    fn load(&self) -> ApplyResult<DeclaredConfig> {
        DeclaredConfig::from_value(&self.merged_value()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netapply_test::{config_dir, NetplanDoc, PhysicalEntry};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_document() {
        let config = DeclaredConfig::from_yaml_str("").unwrap();
        assert_eq!(config, DeclaredConfig::default());

        let config = DeclaredConfig::from_yaml_str("network:\n  version: 2\n").unwrap();
        assert!(config.physical_rules().is_empty());
        assert!(config.composites().is_empty());
    }

    #[test]
    fn test_physical_rules_in_declaration_order() {
        let yaml = NetplanDoc::new()
            .renderer("networkd")
            .ethernet_by_driver("lan", "e1000", "lan0")
            .ethernet(PhysicalEntry::new("eth9"))
            .wifi(PhysicalEntry::new("wl0").mac("aa:bb:cc:dd:ee:ff").set_name("wifi0"))
            .to_yaml();
        let config = DeclaredConfig::from_yaml_str(&yaml).unwrap();

        let ids: Vec<&str> = config.physical_rules().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["lan", "eth9", "wl0"]);

        let lan = &config.physical_rules()[0];
        assert_eq!(lan.target_name.as_deref(), Some("lan0"));
        assert_eq!(
            lan.matcher.as_ref().and_then(|m| m.driver.as_deref()),
            Some("e1000")
        );
        assert_eq!(config.physical_rules()[1].matcher, None);
        assert_eq!(
            config.physical_rules()[2]
                .matcher
                .as_ref()
                .and_then(|m| m.hardware_address.as_deref()),
            Some("aa:bb:cc:dd:ee:ff")
        );
    }

    #[test]
    fn test_renderer_sentinel_kept_but_not_physical() {
        let yaml = NetplanDoc::new()
            .ethernets_renderer("NetworkManager")
            .ethernet(PhysicalEntry::new("eth0"))
            .to_yaml();
        let config = DeclaredConfig::from_yaml_str(&yaml).unwrap();

        assert!(config.physical_rules()[0].is_renderer_sentinel());
        assert!(config.is_physical("eth0"));
        assert!(!config.is_physical(RENDERER_KEY));
        assert!(!config.is_physical("NetworkManager"));
    }

    #[test]
    fn test_unused_match_keys_ignored() {
        let yaml = "network:\n  ethernets:\n    eth0:\n      match:\n        name: en*\n        driver: igb\n      set-name: lan0\n";
        let config = DeclaredConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(
            config.physical_rules()[0].matcher,
            Some(MatchCriteria {
                driver: Some("igb".to_string()),
                hardware_address: None,
            })
        );
    }

    #[test]
    fn test_composites() {
        let yaml = NetplanDoc::new()
            .ethernet(PhysicalEntry::new("eth0"))
            .ethernet(PhysicalEntry::new("eth1"))
            .bridge("br0", &["eth0"])
            .bond("bond0", &["eth1", "eth2"])
            .to_yaml();
        let config = DeclaredConfig::from_yaml_str(&yaml).unwrap();

        assert_eq!(config.composites().len(), 2);
        assert_eq!(config.composites()[0].id, "br0");
        assert!(config.composites()[0].members.contains("eth0"));
        assert_eq!(config.composites()[1].id, "bond0");
        assert_eq!(config.composites()[1].members.len(), 2);
    }

    #[test]
    fn test_null_composite_has_no_members() {
        let config =
            DeclaredConfig::from_yaml_str("network:\n  bridges:\n    br0:\n").unwrap();
        assert!(config.composites()[0].members.is_empty());
    }

    #[test]
    fn test_invalid_section_type() {
        let err = DeclaredConfig::from_yaml_str("network:\n  ethernets: [eth0]\n").unwrap_err();
        assert!(matches!(err, ApplyError::Configuration { .. }));
    }

    #[test]
    fn test_merge_yaml_overrides_and_extends() {
        let mut base: Value =
            serde_yaml::from_str("network:\n  ethernets:\n    eth0:\n      set-name: a\n").unwrap();
        let overlay: Value = serde_yaml::from_str(
            "network:\n  ethernets:\n    eth0:\n      set-name: b\n    eth1: {}\n",
        )
        .unwrap();
        merge_yaml(&mut base, overlay);

        let config = DeclaredConfig::from_value(&base).unwrap();
        let ids: Vec<&str> = config.physical_rules().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["eth0", "eth1"]);
        assert_eq!(config.physical_rules()[0].target_name.as_deref(), Some("b"));
    }

    #[test]
    fn test_loader_layers_directories_by_basename() {
        let lib_doc = NetplanDoc::new().ethernet_by_driver("eth0", "e1000", "from-lib");
        let etc_doc = NetplanDoc::new().ethernet_by_driver("eth0", "e1000", "from-etc");
        let extra_doc = NetplanDoc::new().ethernet(PhysicalEntry::new("eth1"));
        let lib = config_dir(&[("01-netcfg.yaml", &lib_doc)]);
        let etc = config_dir(&[("01-netcfg.yaml", &etc_doc), ("02-extra.yaml", &extra_doc)]);

        let loader = NetplanConfigLoader::new(vec![
            lib.path().to_path_buf(),
            etc.path().to_path_buf(),
            PathBuf::from("/nonexistent/netapply/run"),
        ]);
        let files = loader.config_files().unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].starts_with(etc.path()));

        let config = loader.load().unwrap();
        assert_eq!(
            config.physical_rules()[0].target_name.as_deref(),
            Some("from-etc")
        );
        assert!(config.is_physical("eth1"));
    }

    #[test]
    fn test_loader_reports_invalid_yaml() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("bad.yaml"), "network: [unclosed\n").unwrap();

        let loader = NetplanConfigLoader::new(vec![dir.path().to_path_buf()]);
        assert!(matches!(
            loader.load(),
            Err(ApplyError::Configuration { .. })
        ));
    }
}
