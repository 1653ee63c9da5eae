//! Runs the probe → classify pipeline and publishes finished reports.
//!
//! Probes for all subsystems are spawned together, then awaited in the fixed
//! subsystem order, so the state sequence seen by observers and the entry
//! order of the report are deterministic. Reports are published through a
//! `watch` channel only once complete, and at most one run is in flight.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::classifier::classify;
use super::rules::RuleTable;
use super::types::{HealthEntry, MetricReading, Report, Subsystem};
use crate::core::config::Config;
use crate::platform::{probe_for, Platform, PlatformProbe};

/// Default bound on a whole subsystem probe
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Progress of the current (or last) run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Probing(Subsystem),
    Classifying(Subsystem),
    Complete,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(Arc<Report>),
    /// Another run was already in flight; this trigger was dropped
    Skipped,
}

impl RunOutcome {
    pub fn report(&self) -> Option<&Arc<Report>> {
        match self {
            RunOutcome::Completed(report) => Some(report),
            RunOutcome::Skipped => None,
        }
    }
}

/// Clears the in-flight flag when a run ends, however it ends
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Orchestrator {
    platform: Platform,
    probe: Option<Arc<dyn PlatformProbe>>,
    rules: Arc<RuleTable>,
    probe_timeout: Duration,
    running: AtomicBool,
    sequence: AtomicU64,
    report_tx: watch::Sender<Option<Arc<Report>>>,
    state_tx: watch::Sender<RunState>,
}

impl Orchestrator {
    /// Orchestrator for the running host, configured from `config`
    pub fn for_host(config: &Config) -> crate::Result<Self> {
        let platform = Platform::detect();
        let probe = probe_for(&platform, config.command_timeout());
        let rules = Arc::new(config.rule_table()?);

        log::info!("Diagnosing platform: {}", platform);
        Ok(Self::new(platform, probe, rules, config.probe_timeout()))
    }

    /// `probe` must be `None` exactly when `platform` is unsupported
    pub fn new(
        platform: Platform,
        probe: Option<Arc<dyn PlatformProbe>>,
        rules: Arc<RuleTable>,
        probe_timeout: Duration,
    ) -> Self {
        let (report_tx, _) = watch::channel(None);
        let (state_tx, _) = watch::channel(RunState::Idle);

        Self {
            platform,
            probe,
            rules,
            probe_timeout,
            running: AtomicBool::new(false),
            sequence: AtomicU64::new(0),
            report_tx,
            state_tx,
        }
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Receiver that always holds the most recent complete report
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Report>>> {
        self.report_tx.subscribe()
    }

    pub fn latest(&self) -> Option<Arc<Report>> {
        self.report_tx.borrow().clone()
    }

    pub fn state(&self) -> watch::Receiver<RunState> {
        self.state_tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run a full diagnosis and publish the resulting report.
    ///
    /// Returns `Skipped` without doing anything if a run is already in flight.
    pub async fn run(&self) -> RunOutcome {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            log::info!("Diagnostic run already in progress, trigger dropped");
            return RunOutcome::Skipped;
        };

        let sequence = self.sequence.fetch_add(1, Ordering::AcqRel) + 1;
        log::debug!("Starting diagnostic run #{}", sequence);

        let entries = match &self.probe {
            Some(probe) => self.probe_all(probe).await,
            None => {
                log::warn!("{} cannot be diagnosed", self.platform);
                vec![HealthEntry::unsupported_platform()]
            }
        };

        let report = Arc::new(Report::new(sequence, self.platform.clone(), entries));
        self.report_tx.send_replace(Some(Arc::clone(&report)));
        self.set_state(RunState::Complete);

        log::debug!(
            "Diagnostic run #{} complete with {} entries",
            sequence,
            report.len()
        );
        RunOutcome::Completed(report)
    }

    async fn probe_all(&self, probe: &Arc<dyn PlatformProbe>) -> Vec<HealthEntry> {
        let handles: Vec<(Subsystem, JoinHandle<Vec<MetricReading>>)> = Subsystem::PROBED
            .iter()
            .map(|&subsystem| {
                let probe = Arc::clone(probe);
                let timeout = self.probe_timeout;
                let handle = tokio::spawn(async move {
                    match tokio::time::timeout(timeout, probe.collect(subsystem)).await {
                        Ok(readings) => readings,
                        Err(_) => {
                            log::warn!("{} probe timed out after {:?}", subsystem, timeout);
                            vec![MetricReading::failed(subsystem, "timeout")]
                        }
                    }
                });
                (subsystem, handle)
            })
            .collect();

        let mut entries = Vec::new();
        for (subsystem, handle) in handles {
            self.set_state(RunState::Probing(subsystem));
            let readings = match handle.await {
                Ok(readings) => readings,
                Err(e) => {
                    log::error!("{} probe task failed: {}", subsystem, e);
                    vec![MetricReading::failed(subsystem, format!("probe task failed: {}", e))]
                }
            };

            self.set_state(RunState::Classifying(subsystem));
            entries.extend(readings.iter().map(|reading| classify(reading, &self.rules)));
        }

        entries
    }

    fn set_state(&self, state: RunState) {
        log::debug!("Run state: {:?}", state);
        self.state_tx.send_replace(state);
    }

    /// Re-run the diagnosis every `every` until `shutdown` fires.
    ///
    /// Each tick triggers its own run; ticks that land while a run is still in
    /// flight are dropped.
    pub fn spawn_refresh(
        self: &Arc<Self>,
        every: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let orchestrator = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let orchestrator = Arc::clone(&orchestrator);
                        tokio::spawn(async move {
                            orchestrator.run().await;
                        });
                    }
                    _ = shutdown.recv() => {
                        log::debug!("Refresh task shutting down");
                        break;
                    }
                }
            }
        })
    }
}
