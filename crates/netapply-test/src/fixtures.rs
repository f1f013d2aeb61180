//! Declared-config fixtures
//!
//! Renders small netplan documents so tests can feed the real YAML loader
//! instead of hand-building parsed structures.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tempfile::TempDir;

/// One `ethernets`/`wifis` entry.
#[derive(Debug, Clone, Default)]
pub struct PhysicalEntry {
    pub id: String,
    pub match_driver: Option<String>,
    pub match_mac: Option<String>,
    pub set_name: Option<String>,
    /// Emit an explicit empty `match: {}` block.
    pub empty_match: bool,
}

impl PhysicalEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.match_driver = Some(driver.into());
        self
    }

    pub fn mac(mut self, mac: impl Into<String>) -> Self {
        self.match_mac = Some(mac.into());
        self
    }

    pub fn set_name(mut self, name: impl Into<String>) -> Self {
        self.set_name = Some(name.into());
        self
    }

    pub fn empty_match(mut self) -> Self {
        self.empty_match = true;
        self
    }

    fn render(&self, out: &mut String) {
        let has_match = self.match_driver.is_some() || self.match_mac.is_some();
        if !has_match && !self.empty_match && self.set_name.is_none() {
            let _ = writeln!(out, "    {}: {{}}", self.id);
            return;
        }
        let _ = writeln!(out, "    {}:", self.id);
        if has_match {
            let _ = writeln!(out, "      match:");
            if let Some(driver) = &self.match_driver {
                let _ = writeln!(out, "        driver: {}", driver);
            }
            if let Some(mac) = &self.match_mac {
                let _ = writeln!(out, "        macaddress: \"{}\"", mac);
            }
        } else if self.empty_match {
            let _ = writeln!(out, "      match: {{}}");
        }
        if let Some(name) = &self.set_name {
            let _ = writeln!(out, "      set-name: {}", name);
        }
    }
}

/// Builder for a netplan YAML document.
#[derive(Debug, Clone, Default)]
pub struct NetplanDoc {
    renderer: Option<String>,
    ethernets_renderer: Option<String>,
    ethernets: Vec<PhysicalEntry>,
    wifis: Vec<PhysicalEntry>,
    bridges: Vec<(String, Vec<String>)>,
    bonds: Vec<(String, Vec<String>)>,
}

impl NetplanDoc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the global `network.renderer`.
    pub fn renderer(mut self, renderer: &str) -> Self {
        self.renderer = Some(renderer.to_string());
        self
    }

    /// Sets `network.ethernets.renderer`, the per-type renderer key.
    pub fn ethernets_renderer(mut self, renderer: &str) -> Self {
        self.ethernets_renderer = Some(renderer.to_string());
        self
    }

    pub fn ethernet(mut self, entry: PhysicalEntry) -> Self {
        self.ethernets.push(entry);
        self
    }

    /// Ethernet renamed to `set_name` when its driver matches.
    pub fn ethernet_by_driver(self, id: &str, driver: &str, set_name: &str) -> Self {
        self.ethernet(PhysicalEntry::new(id).driver(driver).set_name(set_name))
    }

    /// Ethernet renamed to `set_name` when its hardware address matches.
    pub fn ethernet_by_mac(self, id: &str, mac: &str, set_name: &str) -> Self {
        self.ethernet(PhysicalEntry::new(id).mac(mac).set_name(set_name))
    }

    pub fn wifi(mut self, entry: PhysicalEntry) -> Self {
        self.wifis.push(entry);
        self
    }

    pub fn bridge(mut self, id: &str, members: &[&str]) -> Self {
        self.bridges
            .push((id.to_string(), members.iter().map(|m| m.to_string()).collect()));
        self
    }

    pub fn bond(mut self, id: &str, members: &[&str]) -> Self {
        self.bonds
            .push((id.to_string(), members.iter().map(|m| m.to_string()).collect()));
        self
    }

    /// Renders the document as YAML.
    pub fn to_yaml(&self) -> String {
        let mut out = String::from("network:\n  version: 2\n");
        if let Some(renderer) = &self.renderer {
            let _ = writeln!(out, "  renderer: {}", renderer);
        }
        if !self.ethernets.is_empty() || self.ethernets_renderer.is_some() {
            out.push_str("  ethernets:\n");
            if let Some(renderer) = &self.ethernets_renderer {
                let _ = writeln!(out, "    renderer: {}", renderer);
            }
            for entry in &self.ethernets {
                entry.render(&mut out);
            }
        }
        if !self.wifis.is_empty() {
            out.push_str("  wifis:\n");
            for entry in &self.wifis {
                entry.render(&mut out);
            }
        }
        render_composites(&mut out, "bridges", &self.bridges);
        render_composites(&mut out, "bonds", &self.bonds);
        out
    }

    /// Writes the document into `dir/file_name`.
    pub fn write_to(&self, dir: &Path, file_name: &str) -> std::io::Result<()> {
        fs::create_dir_all(dir)?;
        fs::write(dir.join(file_name), self.to_yaml())
    }
}

fn render_composites(out: &mut String, section: &str, entries: &[(String, Vec<String>)]) {
    if entries.is_empty() {
        return;
    }
    let _ = writeln!(out, "  {}:", section);
    for (id, members) in entries {
        let _ = writeln!(out, "    {}:", id);
        let _ = writeln!(out, "      interfaces: [{}]", members.join(", "));
    }
}

/// Creates a temporary directory holding the given `(file name, doc)` pairs.
pub fn config_dir(docs: &[(&str, &NetplanDoc)]) -> TempDir {
    let dir = TempDir::new().expect("failed to create temp config dir");
    for (name, doc) in docs {
        doc.write_to(dir.path(), name)
            .expect("failed to write fixture document");
    }
    dir
}

/// The three-interface scenario: `eth0` is up on `e1000`, `eth1` is down
/// on `e1000`, `eth2` is down with address `aa:bb:cc:dd:ee:ff`.
pub mod scenario {
    use super::NetplanDoc;
    use crate::host::{FakeDevice, FakeHost};

    pub const WAN_MAC: &str = "aa:bb:cc:dd:ee:ff";

    /// Declares `eth0`..`eth2` as physical with the driver and MAC rules.
    pub fn declared() -> NetplanDoc {
        NetplanDoc::new()
            .ethernet_by_driver("eth0", "e1000", "lan0")
            .ethernet(super::PhysicalEntry::new("eth1"))
            .ethernet_by_mac("eth2", WAN_MAC, "wan0")
    }

    pub fn host() -> FakeHost {
        FakeHost::new()
            .with_device("eth0", FakeDevice::up().driver("e1000"))
            .with_device("eth1", FakeDevice::down().driver("e1000"))
            .with_device("eth2", FakeDevice::down().mac(WAN_MAC))
    }
}
