//! Shell command builders for host primitives

use std::path::Path;

use netapply_common::shell::shellquote;
use netapply_common::{Backend, BackendAction};

/// Wildcard unit stopped together with networkd.
pub const NETWORKD_STOP_UNITS: &str = "netplan-wpa@*.service";

/// Build `systemctl start|stop` for a backend and its extra units
///
/// `--no-block` is added unless the caller waits for the job.
pub fn build_backend_cmd(
    systemctl: &str,
    backend: Backend,
    action: BackendAction,
    extra_units: &[String],
    sync: bool,
) -> String {
    let mut cmd = format!("{} {}", systemctl, action);
    if !sync {
        cmd.push_str(" --no-block");
    }
    cmd.push(' ');
    cmd.push_str(&shellquote(backend.service_name()));
    for unit in extra_units {
        cmd.push(' ');
        cmd.push_str(&shellquote(unit));
    }
    cmd
}

/// Build NetworkManager liveness check
pub fn build_nm_general_cmd(nmcli: &str) -> String {
    format!("{} general", nmcli)
}

/// Build NetworkManager device disconnect command
pub fn build_nm_disconnect_cmd(nmcli: &str, device: &str) -> String {
    format!("{} device disconnect {}", nmcli, shellquote(device))
}

/// Build command re-running static link rules for one device
pub fn build_link_rules_cmd(udevadm: &str, sysfs_net: &Path, device: &str) -> String {
    let path = sysfs_net.join(device);
    format!(
        "{} test-builtin net_setup_link {}",
        udevadm,
        shellquote(&path.to_string_lossy())
    )
}

/// Build link rename command
pub fn build_rename_cmd(ip: &str, device: &str, new_name: &str) -> String {
    format!(
        "{} link set dev {} name {}",
        ip,
        shellquote(device),
        shellquote(new_name)
    )
}

/// Build udev queue settle command
pub fn build_settle_cmd(udevadm: &str) -> String {
    format!("{} settle", udevadm)
}

/// Build configuration generator invocation
pub fn build_generator_cmd(generator: &Path) -> String {
    shellquote(&generator.to_string_lossy())
}
