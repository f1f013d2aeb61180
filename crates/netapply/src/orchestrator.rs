//! Backend lifecycle orchestrator.
//!
//! One reconciliation pass is a fixed sequence of [`Phase`]s. Each call to
//! [`Orchestrator::step`] runs the current phase to completion and moves to
//! the next one. Within a phase, per-device and per-backend operations are
//! best-effort: failures are collected into the [`ApplyReport`] and the pass
//! goes on. Generator failure, device enumeration failure and settle
//! failure end the pass.

use std::fmt;

use tracing::{debug, error, info, instrument, warn};

use netapply_common::{ApplyError, ApplyResult, ArtifactProbe, Backend, BackendAction};

use crate::commands::NETWORKD_STOP_UNITS;
use crate::context::ApplyContext;
use crate::planner::{RenameChangeSet, RenamePlanner};

/// Message carried by a non-fatal generation failure.
pub const GENERATION_FAILED_MESSAGE: &str = "the configuration could not be generated";

/// Phases of one reconciliation pass, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    SnapshotBefore,
    Generate,
    Decide,
    Stop,
    LinkRules,
    Rename,
    Settle,
    Start,
    Done,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::SnapshotBefore => "snapshot-before",
            Phase::Generate => "generate",
            Phase::Decide => "decide",
            Phase::Stop => "stop",
            Phase::LinkRules => "link-rules",
            Phase::Rename => "rename",
            Phase::Settle => "settle",
            Phase::Start => "start",
            Phase::Done => "done",
        }
    }

    /// The phase that follows this one.
    pub fn next(&self) -> Phase {
        match self {
            Phase::SnapshotBefore => Phase::Generate,
            Phase::Generate => Phase::Decide,
            Phase::Decide => Phase::Stop,
            Phase::Stop => Phase::LinkRules,
            Phase::LinkRules => Phase::Rename,
            Phase::Rename => Phase::Settle,
            Phase::Settle => Phase::Start,
            Phase::Start | Phase::Done => Phase::Done,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which backends had generated artifacts at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendSnapshot {
    pub networkd: bool,
    pub network_manager: bool,
}

impl BackendSnapshot {
    pub fn capture(probe: &dyn ArtifactProbe) -> Self {
        Self {
            networkd: probe.has_artifacts(Backend::Networkd),
            network_manager: probe.has_artifacts(Backend::NetworkManager),
        }
    }

    pub fn get(&self, backend: Backend) -> bool {
        match backend {
            Backend::Networkd => self.networkd,
            Backend::NetworkManager => self.network_manager,
        }
    }
}

/// Per-backend restart decision for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestartDecision {
    pub networkd: bool,
    pub network_manager: bool,
}

impl RestartDecision {
    /// A backend restarts if it has artifacts now, or had them before and
    /// lost them (it must still be stopped to drop stale state).
    pub fn decide(before: BackendSnapshot, after: BackendSnapshot) -> Self {
        let restart = |backend| after.get(backend) || before.get(backend);
        Self {
            networkd: restart(Backend::Networkd),
            network_manager: restart(Backend::NetworkManager),
        }
    }

    pub fn restarts(&self, backend: Backend) -> bool {
        match backend {
            Backend::Networkd => self.networkd,
            Backend::NetworkManager => self.network_manager,
        }
    }

    pub fn any(&self) -> bool {
        self.networkd || self.network_manager
    }
}

/// A failed device or service operation that did not end the pass.
#[derive(Debug)]
pub struct ItemFailure {
    pub phase: Phase,
    /// Device or unit the operation targeted.
    pub item: String,
    pub error: ApplyError,
}

/// Outcome of a completed pass.
#[derive(Debug, Default)]
pub struct ApplyReport {
    pub restarts: RestartDecision,
    /// Live interface names as enumerated in the decide phase.
    pub devices: Vec<String>,
    /// Renames that were applied.
    pub renames: RenameChangeSet,
    pub failures: Vec<ItemFailure>,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures_in(&self, phase: Phase) -> impl Iterator<Item = &ItemFailure> {
        self.failures.iter().filter(move |f| f.phase == phase)
    }
}

/// Drives one reconciliation pass.
pub struct Orchestrator {
    ctx: ApplyContext,
    phase: Phase,
    before: BackendSnapshot,
    report: ApplyReport,
}

impl Orchestrator {
    pub fn new(ctx: ApplyContext) -> Self {
        Self {
            ctx,
            phase: Phase::SnapshotBefore,
            before: BackendSnapshot::default(),
            report: ApplyReport::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn report(&self) -> &ApplyReport {
        &self.report
    }

    /// Runs the current phase and advances to the next one.
    pub async fn step(&mut self) -> ApplyResult<Phase> {
        debug!("Running phase {}", self.phase);
        match self.phase {
            Phase::SnapshotBefore => self.snapshot_before(),
            Phase::Generate => self.generate().await?,
            Phase::Decide => self.decide()?,
            Phase::Stop => self.stop_backends().await,
            Phase::LinkRules => self.trigger_link_rules().await,
            Phase::Rename => self.apply_renames().await,
            Phase::Settle => self.ctx.system.settle().await?,
            Phase::Start => self.start_backends().await,
            Phase::Done => {}
        }
        self.phase = self.phase.next();
        Ok(self.phase)
    }

    /// Runs every remaining phase.
    #[instrument(skip_all, name = "apply")]
    pub async fn run(mut self) -> ApplyResult<ApplyReport> {
        while self.phase != Phase::Done {
            self.step().await?;
        }
        if !self.report.is_clean() {
            warn!(
                "Apply finished with {} failed operation(s)",
                self.report.failures.len()
            );
        }
        Ok(self.report)
    }

    fn record(&mut self, item: &str, error: ApplyError) {
        error!("{} phase: {}", self.phase, error);
        self.report.failures.push(ItemFailure {
            phase: self.phase,
            item: item.to_string(),
            error,
        });
    }

    fn snapshot_before(&mut self) {
        self.before = BackendSnapshot::capture(self.ctx.artifacts.as_ref());
        debug!("Artifacts before generation: {:?}", self.before);
    }

    async fn generate(&mut self) -> ApplyResult<()> {
        if !self.ctx.options.run_generate {
            debug!("Skipping configuration generation");
            return Ok(());
        }
        let exit_code = self.ctx.system.run_generator().await?;
        if exit_code == 0 {
            return Ok(());
        }
        if self.ctx.options.exit_on_error {
            Err(ApplyError::GenerationFailed { exit_code })
        } else {
            Err(ApplyError::configuration(GENERATION_FAILED_MESSAGE))
        }
    }

    fn decide(&mut self) -> ApplyResult<()> {
        let after = BackendSnapshot::capture(self.ctx.artifacts.as_ref());
        self.report.restarts = RestartDecision::decide(self.before, after);
        self.report.devices = self
            .ctx
            .inventory
            .interfaces()
            .map_err(|source| ApplyError::Enumeration { source })?;
        info!(
            "Restart networkd: {}, NetworkManager: {}",
            self.report.restarts.networkd, self.report.restarts.network_manager
        );
        Ok(())
    }

    async fn stop_backends(&mut self) {
        let sync = self.ctx.options.sync;
        if self.report.restarts.networkd {
            let units = [NETWORKD_STOP_UNITS.to_string()];
            if let Err(e) = self
                .ctx
                .system
                .control_backend(Backend::Networkd, BackendAction::Stop, &units, sync)
                .await
            {
                self.record(Backend::Networkd.service_name(), e);
            }
        }
        if self.report.restarts.network_manager {
            if !self.ctx.system.network_manager_running().await {
                debug!("NetworkManager is not running, nothing to stop");
                return;
            }
            for device in &self.report.devices {
                // Many devices are not managed by NetworkManager.
                if let Err(e) = self.ctx.system.disconnect_device(device).await {
                    debug!("Ignoring disconnect failure for {}: {}", device, e);
                }
            }
            if let Err(e) = self
                .ctx
                .system
                .control_backend(Backend::NetworkManager, BackendAction::Stop, &[], sync)
                .await
            {
                self.record(Backend::NetworkManager.service_name(), e);
            }
        }
    }

    async fn trigger_link_rules(&mut self) {
        let devices = self.report.devices.clone();
        for device in &devices {
            if let Err(e) = self.ctx.system.trigger_link_rules(device).await {
                self.record(device, e);
            }
        }
    }

    async fn apply_renames(&mut self) {
        let changes = match self.ctx.declared.load() {
            Ok(declared) => {
                RenamePlanner::new(&declared, self.ctx.inventory.as_ref())
                    .plan(&self.report.devices)
            }
            Err(e) => {
                self.record("declared configuration", e);
                return;
            }
        };
        for (device, change) in changes {
            info!("Renaming {} to {}", device, change.name);
            match self.ctx.system.rename_device(&device, &change.name).await {
                Ok(()) => {
                    self.report.renames.insert(device, change);
                }
                Err(e) => self.record(&device, e),
            }
        }
    }

    async fn start_backends(&mut self) {
        let sync = self.ctx.options.sync;
        if self.report.restarts.networkd {
            let units = self.ctx.artifacts.auxiliary_units();
            if let Err(e) = self
                .ctx
                .system
                .control_backend(Backend::Networkd, BackendAction::Start, &units, sync)
                .await
            {
                self.record(Backend::Networkd.service_name(), e);
            }
        }
        if self.report.restarts.network_manager {
            if let Err(e) = self
                .ctx
                .system
                .control_backend(Backend::NetworkManager, BackendAction::Start, &[], sync)
                .await
            {
                self.record(Backend::NetworkManager.service_name(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::context::ApplyOptions;
    use crate::declared::DeclaredConfig;
    use netapply_test::FakeHost;
    use pretty_assertions::assert_eq;

    fn snapshot(networkd: bool) -> BackendSnapshot {
        BackendSnapshot {
            networkd,
            network_manager: false,
        }
    }

    #[test]
    fn test_restart_decision_table() {
        let cases = [
            (false, false, false),
            (true, false, true),
            (false, true, true),
            (true, true, true),
        ];
        for (before, after, expected) in cases {
            let decision = RestartDecision::decide(snapshot(before), snapshot(after));
            assert_eq!(
                decision.networkd, expected,
                "before={} after={}",
                before, after
            );
            assert!(!decision.network_manager);
        }
    }

    #[test]
    fn test_phase_order() {
        let mut phase = Phase::SnapshotBefore;
        let mut seen = vec![phase];
        while phase != Phase::Done {
            phase = phase.next();
            seen.push(phase);
        }
        assert_eq!(
            seen.iter().map(Phase::as_str).collect::<Vec<_>>(),
            vec![
                "snapshot-before",
                "generate",
                "decide",
                "stop",
                "link-rules",
                "rename",
                "settle",
                "start",
                "done"
            ]
        );
        assert_eq!(Phase::Done.next(), Phase::Done);
    }

    #[tokio::test]
    async fn test_step_advances_one_phase() {
        let host = Arc::new(FakeHost::new());
        let ctx = ApplyContext::with_host(
            host,
            Arc::new(DeclaredConfig::default()),
            ApplyOptions::default(),
        );
        let mut orchestrator = Orchestrator::new(ctx);

        assert_eq!(orchestrator.phase(), Phase::SnapshotBefore);
        assert_eq!(orchestrator.step().await.unwrap(), Phase::Generate);
        assert_eq!(orchestrator.step().await.unwrap(), Phase::Decide);
        assert_eq!(orchestrator.phase(), Phase::Decide);
        assert!(orchestrator.report().is_clean());
    }

    #[tokio::test]
    async fn test_failed_step_keeps_phase() {
        let host = Arc::new(FakeHost::new().with_generator_exit(1));
        let ctx = ApplyContext::with_host(
            host,
            Arc::new(DeclaredConfig::default()),
            ApplyOptions::default(),
        );
        let mut orchestrator = Orchestrator::new(ctx);

        orchestrator.step().await.unwrap();
        assert!(orchestrator.step().await.is_err());
        assert_eq!(orchestrator.phase(), Phase::Generate);
    }
}
