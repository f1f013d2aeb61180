//! netapply - apply declared network configuration to a running host
//!
//! Regenerates backend configuration, restarts the backends whose
//! configuration changed, and renames down physical interfaces to the
//! names their match rules declare. Host access goes through the
//! [`SystemControl`], [`DeviceInventory`] and [`ArtifactProbe`] seams so
//! the whole pass can run against fakes.

mod artifacts;
mod classifier;
mod commands;
mod composite;
mod config;
mod context;
mod declared;
mod match_table;
mod orchestrator;
mod planner;
mod system;

pub use artifacts::GlobProbe;
pub use classifier::{DeviceClass, DeviceClassifier};
pub use commands::*;
pub use composite::CompositeFilter;
pub use config::{ApplyConfig, CommandsConfig, PathsConfig, DEFAULT_CONFIG_PATH};
pub use context::{ApplyContext, ApplyOptions};
pub use declared::{
    merge_yaml, CompositeSpec, DeclaredConfig, DeclaredConfigSource, MatchCriteria,
    NetplanConfigLoader, PhysicalMatchRule, RENDERER_KEY,
};
pub use match_table::MatchTables;
pub use orchestrator::{
    ApplyReport, BackendSnapshot, ItemFailure, Orchestrator, Phase, RestartDecision,
    GENERATION_FAILED_MESSAGE,
};
pub use planner::{LinkChange, RenameChangeSet, RenamePlanner};
pub use system::ShellControl;

pub use netapply_common::{
    ApplyError, ApplyResult, ArtifactProbe, Backend, BackendAction, DeviceInventory,
    SysfsInventory, SystemControl,
};
