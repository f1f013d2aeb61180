//! In-memory host used to drive the reconciliation engine in tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use netapply_common::{
    ApplyError, ApplyResult, ArtifactProbe, Backend, BackendAction, DeviceInventory,
    SystemControl,
};
use netapply_types::MacAddress;

/// A recorded host primitive invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Generate,
    Backend {
        backend: Backend,
        action: BackendAction,
        extra_units: Vec<String>,
        sync: bool,
    },
    NetworkManagerRunning,
    Disconnect(String),
    LinkRules(String),
    Rename { device: String, new_name: String },
    Settle,
}

impl Call {
    /// Shorthand for a backend call without caring about units or sync.
    pub fn is_backend(&self, backend: Backend, action: BackendAction) -> bool {
        matches!(self, Call::Backend { backend: b, action: a, .. } if *b == backend && *a == action)
    }
}

/// A live device as seen by the fake inventory.
#[derive(Debug, Clone, Default)]
pub struct FakeDevice {
    /// Raw operstate; `None` makes the attribute unreadable.
    pub state: Option<String>,
    pub driver: Option<String>,
    pub mac: Option<MacAddress>,
}

impl FakeDevice {
    /// A device with operstate `down`.
    pub fn down() -> Self {
        Self::with_state("down")
    }

    /// A device with operstate `up`.
    pub fn up() -> Self {
        Self::with_state("up")
    }

    /// A device with an arbitrary operstate string.
    pub fn with_state(state: &str) -> Self {
        Self {
            state: Some(state.to_string()),
            ..Self::default()
        }
    }

    /// A device whose operstate attribute cannot be read.
    pub fn unreadable() -> Self {
        Self::default()
    }

    pub fn driver(mut self, driver: &str) -> Self {
        self.driver = Some(driver.to_string());
        self
    }

    /// Sets the hardware address. Panics on an invalid address.
    pub fn mac(mut self, mac: &str) -> Self {
        self.mac = Some(mac.parse().expect("invalid fixture MAC address"));
        self
    }
}

#[derive(Debug, Default)]
struct HostState {
    devices: BTreeMap<String, FakeDevice>,
    artifacts: HashMap<Backend, bool>,
    artifacts_after_generate: HashMap<Backend, bool>,
    generator_exit: i32,
    nm_running: bool,
    wpa_units: Vec<String>,
    enumeration_fails: bool,
    settle_fails: bool,
    failing_renames: HashSet<String>,
    failing_disconnects: HashSet<String>,
    failing_link_rules: HashSet<String>,
    failing_backends: HashSet<(Backend, BackendAction)>,
    calls: Vec<Call>,
}

/// Fake host implementing [`DeviceInventory`], [`SystemControl`] and
/// [`ArtifactProbe`] over one shared state.
///
/// Renames move devices in the inventory and a successful generator run
/// swaps in the post-generation artifact state, so a second pass against
/// the same host sees the effects of the first.
#[derive(Debug, Default)]
pub struct FakeHost {
    state: Mutex<HostState>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().expect("fake host lock poisoned")
    }

    /// Adds a live device.
    pub fn with_device(self, name: &str, device: FakeDevice) -> Self {
        self.state().devices.insert(name.to_string(), device);
        self
    }

    /// Sets artifact presence before and after a successful generator run.
    pub fn with_artifacts(self, backend: Backend, before: bool, after: bool) -> Self {
        {
            let mut state = self.state();
            state.artifacts.insert(backend, before);
            state.artifacts_after_generate.insert(backend, after);
        }
        self
    }

    pub fn with_generator_exit(self, exit_code: i32) -> Self {
        self.state().generator_exit = exit_code;
        self
    }

    pub fn with_network_manager_running(self, running: bool) -> Self {
        self.state().nm_running = running;
        self
    }

    /// Sets the auxiliary units discovered at networkd start.
    pub fn with_wpa_units(self, units: &[&str]) -> Self {
        self.state().wpa_units = units.iter().map(|u| u.to_string()).collect();
        self
    }

    pub fn failing_enumeration(self) -> Self {
        self.state().enumeration_fails = true;
        self
    }

    pub fn failing_settle(self) -> Self {
        self.state().settle_fails = true;
        self
    }

    pub fn failing_rename(self, device: &str) -> Self {
        self.state().failing_renames.insert(device.to_string());
        self
    }

    pub fn failing_disconnect(self, device: &str) -> Self {
        self.state().failing_disconnects.insert(device.to_string());
        self
    }

    pub fn failing_link_rules(self, device: &str) -> Self {
        self.state().failing_link_rules.insert(device.to_string());
        self
    }

    pub fn failing_backend(self, backend: Backend, action: BackendAction) -> Self {
        self.state().failing_backends.insert((backend, action));
        self
    }

    /// Changes the operstate of an existing device.
    pub fn set_state(&self, device: &str, state: &str) {
        if let Some(dev) = self.state().devices.get_mut(device) {
            dev.state = Some(state.to_string());
        }
    }

    /// Returns every recorded call in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Forgets recorded calls.
    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Returns the current device names.
    pub fn device_names(&self) -> Vec<String> {
        self.state().devices.keys().cloned().collect()
    }

    fn record(&self, call: Call) {
        self.state().calls.push(call);
    }

    fn failed(command: String) -> ApplyError {
        ApplyError::ShellCommandFailed {
            command,
            exit_code: 1,
            output: "injected failure".to_string(),
        }
    }
}

impl DeviceInventory for FakeHost {
    fn interfaces(&self) -> io::Result<Vec<String>> {
        let state = self.state();
        if state.enumeration_fails {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "injected failure"));
        }
        Ok(state.devices.keys().cloned().collect())
    }

    fn hardware_address(&self, device: &str) -> Option<MacAddress> {
        self.state().devices.get(device).and_then(|d| d.mac)
    }

    fn oper_state(&self, device: &str) -> io::Result<String> {
        self.state()
            .devices
            .get(device)
            .and_then(|d| d.state.clone())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no operstate"))
    }

    fn driver_name(&self, device: &str) -> Option<String> {
        self.state().devices.get(device).and_then(|d| d.driver.clone())
    }
}

#[async_trait]
impl SystemControl for FakeHost {
    async fn run_generator(&self) -> ApplyResult<i32> {
        self.record(Call::Generate);
        let mut state = self.state();
        if state.generator_exit == 0 {
            state.artifacts = state.artifacts_after_generate.clone();
        }
        Ok(state.generator_exit)
    }

    async fn control_backend(
        &self,
        backend: Backend,
        action: BackendAction,
        extra_units: &[String],
        sync: bool,
    ) -> ApplyResult<()> {
        self.record(Call::Backend {
            backend,
            action,
            extra_units: extra_units.to_vec(),
            sync,
        });
        if self.state().failing_backends.contains(&(backend, action)) {
            return Err(Self::failed(format!("systemctl {} {}", action, backend.service_name())));
        }
        Ok(())
    }

    async fn network_manager_running(&self) -> bool {
        self.record(Call::NetworkManagerRunning);
        self.state().nm_running
    }

    async fn disconnect_device(&self, device: &str) -> ApplyResult<()> {
        self.record(Call::Disconnect(device.to_string()));
        if self.state().failing_disconnects.contains(device) {
            return Err(Self::failed(format!("nmcli device disconnect {}", device)));
        }
        Ok(())
    }

    async fn trigger_link_rules(&self, device: &str) -> ApplyResult<()> {
        self.record(Call::LinkRules(device.to_string()));
        if self.state().failing_link_rules.contains(device) {
            return Err(Self::failed(format!("udevadm test-builtin net_setup_link {}", device)));
        }
        Ok(())
    }

    async fn rename_device(&self, device: &str, new_name: &str) -> ApplyResult<()> {
        self.record(Call::Rename {
            device: device.to_string(),
            new_name: new_name.to_string(),
        });
        let mut state = self.state();
        let rename_error = |message: &str| ApplyError::Rename {
            device: device.to_string(),
            new_name: new_name.to_string(),
            message: message.to_string(),
        };
        if state.failing_renames.contains(device) {
            return Err(rename_error("injected failure"));
        }
        if state.devices.contains_key(new_name) {
            return Err(rename_error("File exists"));
        }
        let dev = state
            .devices
            .remove(device)
            .ok_or_else(|| rename_error("Cannot find device"))?;
        state.devices.insert(new_name.to_string(), dev);
        Ok(())
    }

    async fn settle(&self) -> ApplyResult<()> {
        self.record(Call::Settle);
        if self.state().settle_fails {
            return Err(ApplyError::Settle {
                message: "timeout waiting for udev queue".to_string(),
            });
        }
        Ok(())
    }
}

impl ArtifactProbe for FakeHost {
    fn has_artifacts(&self, backend: Backend) -> bool {
        self.state().artifacts.get(&backend).copied().unwrap_or(false)
    }

    fn auxiliary_units(&self) -> Vec<String> {
        self.state().wpa_units.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rename_moves_device() {
        let host = FakeHost::new().with_device("eth1", FakeDevice::down().driver("e1000"));

        host.rename_device("eth1", "lan0").await.unwrap();

        assert_eq!(host.device_names(), vec!["lan0"]);
        assert_eq!(host.driver_name("lan0").as_deref(), Some("e1000"));
    }

    #[tokio::test]
    async fn test_rename_onto_existing_name_fails() {
        let host = FakeHost::new()
            .with_device("eth0", FakeDevice::down())
            .with_device("eth1", FakeDevice::down());

        assert!(host.rename_device("eth1", "eth0").await.is_err());
        assert_eq!(host.device_names(), vec!["eth0", "eth1"]);
    }

    #[tokio::test]
    async fn test_generator_swaps_artifacts() {
        let host = FakeHost::new().with_artifacts(Backend::Networkd, false, true);
        assert!(!host.has_artifacts(Backend::Networkd));

        assert_eq!(host.run_generator().await.unwrap(), 0);
        assert!(host.has_artifacts(Backend::Networkd));
        assert!(!host.has_artifacts(Backend::NetworkManager));
    }

    #[tokio::test]
    async fn test_failed_generator_keeps_artifacts() {
        let host = FakeHost::new()
            .with_artifacts(Backend::Networkd, true, false)
            .with_generator_exit(1);

        assert_eq!(host.run_generator().await.unwrap(), 1);
        assert!(host.has_artifacts(Backend::Networkd));
    }

    #[test]
    fn test_unreadable_state() {
        let host = FakeHost::new().with_device("eth0", FakeDevice::unreadable());
        assert!(host.oper_state("eth0").is_err());
    }
}
