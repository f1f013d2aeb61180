//! Network backends and the host control seam.
//!
//! The reconciliation engine never talks to systemd, NetworkManager or udev
//! directly. It goes through [`SystemControl`], so the orchestrator can be
//! exercised against a recording fake.

use std::fmt;

use async_trait::async_trait;

use crate::error::ApplyResult;

/// A network-management daemon that consumes generated configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Backend {
    /// systemd-networkd.
    Networkd,
    /// NetworkManager.
    NetworkManager,
}

impl Backend {
    /// Returns the short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Networkd => "networkd",
            Backend::NetworkManager => "NetworkManager",
        }
    }

    /// Returns the primary systemd unit of this backend.
    pub fn service_name(&self) -> &'static str {
        match self {
            Backend::Networkd => "systemd-networkd.service",
            Backend::NetworkManager => "NetworkManager.service",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle action applied to a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendAction {
    Start,
    Stop,
}

impl BackendAction {
    /// Returns the systemctl verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendAction::Start => "start",
            BackendAction::Stop => "stop",
        }
    }
}

impl fmt::Display for BackendAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host primitives used by the reconciliation pass.
///
/// Implementations own their timeout and retry semantics; the orchestrator
/// only sequences calls and decides which failures are fatal.
#[async_trait]
pub trait SystemControl: Send + Sync {
    /// Runs the configuration generator and returns its exit code.
    async fn run_generator(&self) -> ApplyResult<i32>;

    /// Starts or stops a backend together with `extra_units`.
    ///
    /// When `sync` is false the call returns once the job is queued.
    async fn control_backend(
        &self,
        backend: Backend,
        action: BackendAction,
        extra_units: &[String],
        sync: bool,
    ) -> ApplyResult<()>;

    /// Returns true if NetworkManager is currently running.
    async fn network_manager_running(&self) -> bool;

    /// Disconnects one device from NetworkManager.
    async fn disconnect_device(&self, device: &str) -> ApplyResult<()>;

    /// Re-evaluates static link rules for one device, discarding output.
    async fn trigger_link_rules(&self, device: &str) -> ApplyResult<()>;

    /// Renames a device.
    async fn rename_device(&self, device: &str, new_name: &str) -> ApplyResult<()>;

    /// Blocks until pending device events are processed.
    async fn settle(&self) -> ApplyResult<()>;
}

/// Filesystem probes for generated backend artifacts.
pub trait ArtifactProbe: Send + Sync {
    /// Returns true if generated configuration for `backend` exists now.
    fn has_artifacts(&self, backend: Backend) -> bool;

    /// Lists auxiliary per-link units to start alongside networkd.
    fn auxiliary_units(&self) -> Vec<String>;
}
