//! Shell-backed host control.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info};

use netapply_common::shell;
use netapply_common::{ApplyError, ApplyResult, Backend, BackendAction, SystemControl};

use crate::commands;
use crate::config::ApplyConfig;

/// [`SystemControl`] implementation running the configured executables.
#[derive(Debug, Clone)]
pub struct ShellControl {
    generator: PathBuf,
    sysfs_net: PathBuf,
    ip: String,
    udevadm: String,
    systemctl: String,
    nmcli: String,
}

impl ShellControl {
    pub fn new(config: &ApplyConfig) -> Self {
        Self {
            generator: config.paths.generator.clone(),
            sysfs_net: config.paths.sysfs_net.clone(),
            ip: config.commands.ip.clone(),
            udevadm: config.commands.udevadm.clone(),
            systemctl: config.commands.systemctl.clone(),
            nmcli: config.commands.nmcli.clone(),
        }
    }
}

#[async_trait]
impl SystemControl for ShellControl {
    async fn run_generator(&self) -> ApplyResult<i32> {
        let cmd = commands::build_generator_cmd(&self.generator);
        let result = shell::exec(&cmd).await?;
        if !result.success() {
            debug!("generator output: {}", result.combined_output());
        }
        Ok(result.exit_code)
    }

    async fn control_backend(
        &self,
        backend: Backend,
        action: BackendAction,
        extra_units: &[String],
        sync: bool,
    ) -> ApplyResult<()> {
        let cmd =
            commands::build_backend_cmd(&self.systemctl, backend, action, extra_units, sync);
        info!("{} {}", action, backend.service_name());
        shell::exec_or_throw(&cmd).await?;
        Ok(())
    }

    async fn network_manager_running(&self) -> bool {
        let cmd = commands::build_nm_general_cmd(&self.nmcli);
        match shell::exec(&cmd).await {
            Ok(result) => result.success(),
            Err(e) => {
                debug!("NetworkManager liveness check failed: {}", e);
                false
            }
        }
    }

    async fn disconnect_device(&self, device: &str) -> ApplyResult<()> {
        let cmd = commands::build_nm_disconnect_cmd(&self.nmcli, device);
        shell::exec_or_throw(&cmd).await?;
        Ok(())
    }

    async fn trigger_link_rules(&self, device: &str) -> ApplyResult<()> {
        let cmd = commands::build_link_rules_cmd(&self.udevadm, &self.sysfs_net, device);
        shell::exec_or_throw(&cmd).await?;
        Ok(())
    }

    async fn rename_device(&self, device: &str, new_name: &str) -> ApplyResult<()> {
        let cmd = commands::build_rename_cmd(&self.ip, device, new_name);
        let result = shell::exec(&cmd).await?;
        if result.success() {
            Ok(())
        } else {
            Err(ApplyError::Rename {
                device: device.to_string(),
                new_name: new_name.to_string(),
                message: result.combined_output(),
            })
        }
    }

    async fn settle(&self) -> ApplyResult<()> {
        let cmd = commands::build_settle_cmd(&self.udevadm);
        let result = shell::exec(&cmd).await?;
        if result.success() {
            Ok(())
        } else {
            Err(ApplyError::Settle {
                message: result.combined_output(),
            })
        }
    }
}
