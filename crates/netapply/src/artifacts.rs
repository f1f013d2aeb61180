//! Generated artifact discovery.

use std::path::PathBuf;

use tracing::warn;

use netapply_common::{ArtifactProbe, Backend};

use crate::config::PathsConfig;

/// [`ArtifactProbe`] backed by filesystem globs.
#[derive(Debug, Clone)]
pub struct GlobProbe {
    networkd: String,
    network_manager: String,
    wpa_units: String,
}

impl GlobProbe {
    pub fn new(
        networkd: impl Into<String>,
        network_manager: impl Into<String>,
        wpa_units: impl Into<String>,
    ) -> Self {
        Self {
            networkd: networkd.into(),
            network_manager: network_manager.into(),
            wpa_units: wpa_units.into(),
        }
    }

    pub fn from_paths(paths: &PathsConfig) -> Self {
        Self::new(
            paths.networkd_artifacts.clone(),
            paths.network_manager_artifacts.clone(),
            paths.wpa_units.clone(),
        )
    }

    fn matches(pattern: &str) -> Vec<PathBuf> {
        match glob::glob(pattern) {
            Ok(paths) => paths.filter_map(Result::ok).collect(),
            Err(e) => {
                warn!("invalid glob {}: {}", pattern, e);
                Vec::new()
            }
        }
    }
}

impl ArtifactProbe for GlobProbe {
    fn has_artifacts(&self, backend: Backend) -> bool {
        let pattern = match backend {
            Backend::Networkd => &self.networkd,
            Backend::NetworkManager => &self.network_manager,
        };
        !Self::matches(pattern).is_empty()
    }

    fn auxiliary_units(&self) -> Vec<String> {
        Self::matches(&self.wpa_units)
            .into_iter()
            .filter_map(|p| p.file_name().map(|name| name.to_string_lossy().into_owned()))
            .collect()
    }
}
