//! Tool configuration
//!
//! Loads netapply's own settings (paths and executables) from a TOML file.
//! Default location: /etc/netapply/netapply.toml

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use netapply_common::{shell, ApplyError, ApplyResult};

/// Default location of the tool configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/netapply/netapply.toml";

/// Filesystem locations consulted during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Configuration generator executable
    #[serde(default = "default_generator")]
    pub generator: PathBuf,

    /// sysfs directory with one entry per network device
    #[serde(default = "default_sysfs_net")]
    pub sysfs_net: PathBuf,

    /// Declared configuration directories, lowest precedence first
    #[serde(default = "default_config_dirs")]
    pub config_dirs: Vec<PathBuf>,

    /// Glob matching generated networkd files
    #[serde(default = "default_networkd_artifacts")]
    pub networkd_artifacts: String,

    /// Glob matching generated NetworkManager connections
    #[serde(default = "default_network_manager_artifacts")]
    pub network_manager_artifacts: String,

    /// Glob matching enabled per-link supplicant units
    #[serde(default = "default_wpa_units")]
    pub wpa_units: String,
}

/// Executables used by the shell-backed host control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandsConfig {
    #[serde(default = "default_ip")]
    pub ip: String,

    #[serde(default = "default_udevadm")]
    pub udevadm: String,

    #[serde(default = "default_systemctl")]
    pub systemctl: String,

    #[serde(default = "default_nmcli")]
    pub nmcli: String,
}

/// Complete netapply configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub commands: CommandsConfig,
}

fn default_generator() -> PathBuf {
    PathBuf::from("/lib/netplan/generate")
}

fn default_sysfs_net() -> PathBuf {
    PathBuf::from(netapply_common::device::SYSFS_NET_DIR)
}

fn default_config_dirs() -> Vec<PathBuf> {
    ["/lib/netplan", "/etc/netplan", "/run/netplan"]
        .iter()
        .map(PathBuf::from)
        .collect()
}

fn default_networkd_artifacts() -> String {
    "/run/systemd/network/*netplan-*".to_string()
}

fn default_network_manager_artifacts() -> String {
    "/run/NetworkManager/system-connections/netplan-*".to_string()
}

fn default_wpa_units() -> String {
    "/run/systemd/system/*.wants/netplan-wpa@*.service".to_string()
}

fn default_ip() -> String {
    shell::IP_CMD.to_string()
}

fn default_udevadm() -> String {
    shell::UDEVADM_CMD.to_string()
}

fn default_systemctl() -> String {
    shell::SYSTEMCTL_CMD.to_string()
}

fn default_nmcli() -> String {
    shell::NMCLI_CMD.to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            generator: default_generator(),
            sysfs_net: default_sysfs_net(),
            config_dirs: default_config_dirs(),
            networkd_artifacts: default_networkd_artifacts(),
            network_manager_artifacts: default_network_manager_artifacts(),
            wpa_units: default_wpa_units(),
        }
    }
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            ip: default_ip(),
            udevadm: default_udevadm(),
            systemctl: default_systemctl(),
            nmcli: default_nmcli(),
        }
    }
}

impl ApplyConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> ApplyResult<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => {
                let config: Self = toml::from_str(&content).map_err(|e| {
                    ApplyError::configuration(format!(
                        "Failed to parse config file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                config.validate()?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(ApplyError::io(path, e)),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> ApplyResult<()> {
        if self.paths.generator.as_os_str().is_empty() {
            return Err(ApplyError::configuration("paths.generator must not be empty"));
        }
        if self.paths.sysfs_net.as_os_str().is_empty() {
            return Err(ApplyError::configuration("paths.sysfs_net must not be empty"));
        }
        if self.paths.config_dirs.is_empty() {
            return Err(ApplyError::configuration(
                "paths.config_dirs must list at least one directory",
            ));
        }
        let globs = [
            ("paths.networkd_artifacts", &self.paths.networkd_artifacts),
            (
                "paths.network_manager_artifacts",
                &self.paths.network_manager_artifacts,
            ),
            ("paths.wpa_units", &self.paths.wpa_units),
        ];
        for (field, pattern) in globs {
            glob::Pattern::new(pattern).map_err(|e| {
                ApplyError::configuration(format!("{} is not a valid glob: {}", field, e))
            })?;
        }
        let commands = [
            ("commands.ip", &self.commands.ip),
            ("commands.udevadm", &self.commands.udevadm),
            ("commands.systemctl", &self.commands.systemctl),
            ("commands.nmcli", &self.commands.nmcli),
        ];
        for (field, command) in commands {
            if command.trim().is_empty() {
                return Err(ApplyError::configuration(format!("{} must not be empty", field)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ApplyConfig::default();
        assert_eq!(config.paths.generator, PathBuf::from("/lib/netplan/generate"));
        assert_eq!(config.paths.sysfs_net, PathBuf::from("/sys/class/net"));
        assert_eq!(config.paths.config_dirs.len(), 3);
        assert_eq!(config.commands.ip, "/sbin/ip");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = ApplyConfig::load_or_default("/nonexistent/netapply.toml").unwrap();
        assert_eq!(config, ApplyConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("netapply.toml");
        fs::write(
            &path,
            "[paths]\ngenerator = \"/usr/libexec/netplan/generate\"\n\n[commands]\nip = \"/usr/sbin/ip\"\n",
        )
        .unwrap();

        let config = ApplyConfig::load_or_default(&path).unwrap();
        assert_eq!(
            config.paths.generator,
            PathBuf::from("/usr/libexec/netplan/generate")
        );
        assert_eq!(config.paths.sysfs_net, PathBuf::from("/sys/class/net"));
        assert_eq!(config.commands.ip, "/usr/sbin/ip");
        assert_eq!(config.commands.udevadm, "/bin/udevadm");
    }

    #[test]
    fn test_unparsable_file_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("netapply.toml");
        fs::write(&path, "[paths\n").unwrap();

        match ApplyConfig::load_or_default(&path) {
            Err(ApplyError::Configuration { message }) => {
                assert!(message.contains("Failed to parse config file"));
            }
            other => panic!("Expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_empty_config_dirs() {
        let mut config = ApplyConfig::default();
        config.paths.config_dirs.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_glob() {
        let mut config = ApplyConfig::default();
        config.paths.wpa_units = "/run/[".to_string();
        assert!(config.validate().is_err());
    }
}
