//! Per-pass options and injected collaborators.

use std::sync::Arc;

use netapply_common::{ArtifactProbe, DeviceInventory, SysfsInventory, SystemControl};

use crate::artifacts::GlobProbe;
use crate::config::ApplyConfig;
use crate::declared::{DeclaredConfigSource, NetplanConfigLoader};
use crate::system::ShellControl;

/// Options for one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Run the configuration generator before deciding restarts.
    pub run_generate: bool,
    /// Wait for backend start/stop jobs to finish.
    pub sync: bool,
    /// Treat a generator failure as a distinct exit condition.
    pub exit_on_error: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            run_generate: true,
            sync: false,
            exit_on_error: true,
        }
    }
}

/// Everything a pass needs. Cloning shares the collaborators.
#[derive(Clone)]
pub struct ApplyContext {
    pub options: ApplyOptions,
    pub system: Arc<dyn SystemControl>,
    pub inventory: Arc<dyn DeviceInventory>,
    pub artifacts: Arc<dyn ArtifactProbe>,
    pub declared: Arc<dyn DeclaredConfigSource>,
}

impl ApplyContext {
    /// Builds a context wired to the real host.
    pub fn from_config(config: &ApplyConfig, options: ApplyOptions) -> Self {
        Self {
            options,
            system: Arc::new(ShellControl::new(config)),
            inventory: Arc::new(SysfsInventory::new(config.paths.sysfs_net.clone())),
            artifacts: Arc::new(GlobProbe::from_paths(&config.paths)),
            declared: Arc::new(NetplanConfigLoader::new(config.paths.config_dirs.clone())),
        }
    }

    /// Builds a context where one object provides every host primitive.
    pub fn with_host<H>(
        host: Arc<H>,
        declared: Arc<dyn DeclaredConfigSource>,
        options: ApplyOptions,
    ) -> Self
    where
        H: SystemControl + DeviceInventory + ArtifactProbe + 'static,
    {
        Self {
            options,
            system: host.clone(),
            inventory: host.clone(),
            artifacts: host,
            declared,
        }
    }
}
