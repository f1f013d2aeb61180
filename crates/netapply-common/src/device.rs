//! Live device inventory.
//!
//! [`DeviceInventory`] is the boundary to the kernel's view of network
//! devices. [`SysfsInventory`] reads it from `/sys/class/net`:
//!
//! ```text
//! /sys/class/net/ens3/operstate        -> "down"
//! /sys/class/net/ens3/address          -> "52:54:00:12:34:56"
//! /sys/class/net/ens3/device/driver    -> ../../../../bus/virtio/drivers/virtio_net
//! ```

use std::fs;
use std::io;
use std::path::PathBuf;

use netapply_types::MacAddress;
use tracing::debug;

/// Default sysfs directory holding one entry per network device.
pub const SYSFS_NET_DIR: &str = "/sys/class/net";

/// Read access to live network devices.
pub trait DeviceInventory: Send + Sync {
    /// Lists the names of all live interfaces, sorted.
    fn interfaces(&self) -> io::Result<Vec<String>>;

    /// Returns the hardware address of a device, if it has a readable one.
    fn hardware_address(&self, device: &str) -> Option<MacAddress>;

    /// Reads the raw operational state attribute of a device.
    fn oper_state(&self, device: &str) -> io::Result<String>;

    /// Resolves the kernel driver bound to a device.
    ///
    /// `None` when the device has no driver link (virtual devices, or a
    /// device whose driver was unbound).
    fn driver_name(&self, device: &str) -> Option<String>;
}

/// [`DeviceInventory`] backed by a sysfs `class/net` directory.
#[derive(Debug, Clone)]
pub struct SysfsInventory {
    root: PathBuf,
}

impl SysfsInventory {
    /// Creates an inventory rooted at `root` (normally [`SYSFS_NET_DIR`]).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn device_dir(&self, device: &str) -> PathBuf {
        self.root.join(device)
    }
}

impl Default for SysfsInventory {
    fn default() -> Self {
        Self::new(SYSFS_NET_DIR)
    }
}

impl DeviceInventory for SysfsInventory {
    fn interfaces(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            // Skip plain files such as bonding_masters.
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn hardware_address(&self, device: &str) -> Option<MacAddress> {
        let path = self.device_dir(device).join("address");
        let raw = fs::read_to_string(&path).ok()?;
        match raw.parse() {
            Ok(mac) => Some(mac),
            Err(e) => {
                debug!("{} has no usable hardware address: {}", device, e);
                None
            }
        }
    }

    fn oper_state(&self, device: &str) -> io::Result<String> {
        let raw = fs::read_to_string(self.device_dir(device).join("operstate"))?;
        Ok(raw.trim().to_string())
    }

    fn driver_name(&self, device: &str) -> Option<String> {
        let link = self.device_dir(device).join("device").join("driver");
        match fs::canonicalize(&link) {
            Ok(target) => target
                .file_name()
                .and_then(|name| name.to_str())
                .map(str::to_string),
            Err(e) => {
                debug!(
                    "Cannot resolve driver of {}: cannot read link {}: {}",
                    device,
                    link.display(),
                    e
                );
                None
            }
        }
    }
}
