use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::{broadcast, Notify};

use hdiag::core::diagnostics::{
    GpuController, HealthState, Measurement, MetricReading, Orchestrator, RuleTable, RunOutcome,
    RunState, Subsystem, DEFAULT_PROBE_TIMEOUT,
};
use hdiag::platform::{Platform, PlatformProbe};

/// Probe with fixed readings and optional misbehavior per subsystem
#[derive(Default)]
struct ScriptedProbe {
    mounts: Vec<(&'static str, f32)>,
    memory_percent: f32,
    failing: Option<Subsystem>,
    hanging: Option<Subsystem>,
    /// CPU collection waits on this before returning
    gate: Option<Arc<Notify>>,
}

impl ScriptedProbe {
    fn healthy() -> Self {
        Self {
            mounts: vec![("/", 40.0)],
            memory_percent: 35.0,
            ..Default::default()
        }
    }

    fn reading(&self, subsystem: Subsystem) -> Vec<MetricReading> {
        if self.failing == Some(subsystem) {
            return vec![MetricReading::failed(subsystem, "access denied")];
        }

        match subsystem {
            Subsystem::Cpu => vec![MetricReading::ok(
                subsystem,
                Measurement::Temperature { celsius: 55.0 },
            )],
            Subsystem::Memory => vec![MetricReading::ok(
                subsystem,
                Measurement::MemoryUsage {
                    used_percent: self.memory_percent,
                },
            )],
            Subsystem::Storage => self
                .mounts
                .iter()
                .map(|(mount, percent)| {
                    MetricReading::ok(
                        subsystem,
                        Measurement::StorageUsage {
                            mount_point: mount.to_string(),
                            used_percent: *percent,
                        },
                    )
                })
                .collect(),
            Subsystem::Gpu => vec![MetricReading::ok(
                subsystem,
                Measurement::Gpu {
                    controllers: vec![GpuController::new(
                        "NVIDIA GeForce RTX 3060",
                        Some("OK".to_string()),
                    )],
                },
            )],
            Subsystem::Network => vec![MetricReading::ok(
                subsystem,
                Measurement::NetworkTotals {
                    bytes_sent: 1_000,
                    bytes_received: 2_000,
                },
            )],
            Subsystem::Drivers => vec![MetricReading::ok(
                subsystem,
                Measurement::PendingUpdates { entries: vec![] },
            )],
            Subsystem::Diagnosis => vec![],
        }
    }
}

impl PlatformProbe for ScriptedProbe {
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    fn collect(&self, subsystem: Subsystem) -> BoxFuture<'_, Vec<MetricReading>> {
        Box::pin(async move {
            if self.hanging == Some(subsystem) {
                std::future::pending::<()>().await;
            }
            if subsystem == Subsystem::Cpu {
                if let Some(gate) = &self.gate {
                    gate.notified().await;
                }
            }
            self.reading(subsystem)
        })
    }
}

fn orchestrator(probe: ScriptedProbe, probe_timeout: Duration) -> Orchestrator {
    Orchestrator::new(
        Platform::Linux,
        Some(Arc::new(probe)),
        Arc::new(RuleTable::default()),
        probe_timeout,
    )
}

fn subsystems(outcome: &RunOutcome) -> Vec<Subsystem> {
    outcome
        .report()
        .expect("run should complete")
        .entries()
        .iter()
        .map(|e| e.subsystem)
        .collect()
}

#[tokio::test]
async fn test_entries_follow_fixed_order() {
    let probe = ScriptedProbe {
        mounts: vec![("/", 10.0), ("/home", 95.0), ("/boot", 50.0)],
        ..ScriptedProbe::healthy()
    };
    let outcome = orchestrator(probe, DEFAULT_PROBE_TIMEOUT).run().await;

    assert_eq!(
        subsystems(&outcome),
        vec![
            Subsystem::Cpu,
            Subsystem::Memory,
            Subsystem::Storage,
            Subsystem::Storage,
            Subsystem::Storage,
            Subsystem::Gpu,
            Subsystem::Network,
            Subsystem::Drivers,
        ]
    );

    let report = outcome.report().unwrap();
    let storage: Vec<_> = report.entries_for(Subsystem::Storage).collect();
    assert_eq!(storage.len(), 3);
    assert_eq!(storage[0].state, HealthState::Good);
    assert_eq!(storage[1].state, HealthState::Warning);
    assert_eq!(storage[1].detail, "High usage on /home: 95%");
    assert_eq!(storage[2].state, HealthState::Good);
}

#[tokio::test]
async fn test_healthy_host_is_all_good() {
    let outcome = orchestrator(ScriptedProbe::healthy(), DEFAULT_PROBE_TIMEOUT)
        .run()
        .await;
    let report = outcome.report().unwrap();

    assert!(report.entries().iter().all(|e| e.state == HealthState::Good));
    assert!(report.entries().iter().all(|e| e.remediation.is_none()));
    assert_eq!(report.overall_state(), HealthState::Good);
}

#[tokio::test]
async fn test_one_failure_does_not_spoil_the_run() {
    let probe = ScriptedProbe {
        failing: Some(Subsystem::Drivers),
        ..ScriptedProbe::healthy()
    };
    let outcome = orchestrator(probe, DEFAULT_PROBE_TIMEOUT).run().await;
    let report = outcome.report().unwrap();

    assert_eq!(report.len(), 6);
    let drivers = report.entries_for(Subsystem::Drivers).next().unwrap();
    assert_eq!(drivers.state, HealthState::Error);
    assert!(drivers.detail.contains("access denied"));

    let others = report
        .entries()
        .iter()
        .filter(|e| e.subsystem != Subsystem::Drivers);
    for entry in others {
        assert_eq!(entry.state, HealthState::Good, "{:?}", entry);
    }
}

#[tokio::test]
async fn test_hanging_probe_times_out() {
    let probe = ScriptedProbe {
        hanging: Some(Subsystem::Gpu),
        ..ScriptedProbe::healthy()
    };
    let outcome = orchestrator(probe, Duration::from_millis(50)).run().await;
    let report = outcome.report().unwrap();

    let gpu = report.entries_for(Subsystem::Gpu).next().unwrap();
    assert_eq!(gpu.state, HealthState::Error);
    assert!(gpu.detail.contains("timeout"));
    assert_eq!(report.len(), 6);
}

#[tokio::test]
async fn test_second_trigger_during_run_is_skipped() {
    let gate = Arc::new(Notify::new());
    let probe = ScriptedProbe {
        gate: Some(Arc::clone(&gate)),
        ..ScriptedProbe::healthy()
    };
    let orchestrator = Arc::new(orchestrator(probe, DEFAULT_PROBE_TIMEOUT));
    let mut reports = orchestrator.subscribe();

    let first = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move { orchestrator.run().await })
    };

    let mut state = orchestrator.state();
    state
        .wait_for(|s| matches!(s, RunState::Probing(_)))
        .await
        .unwrap();
    assert!(orchestrator.is_running());

    // Nothing is published while the first run is in flight
    assert!(orchestrator.latest().is_none());
    let second = orchestrator.run().await;
    assert!(matches!(second, RunOutcome::Skipped));

    gate.notify_one();
    let first = first.await.unwrap();
    assert_eq!(first.report().unwrap().sequence(), 1);

    reports.changed().await.unwrap();
    let published = reports.borrow_and_update().clone().unwrap();
    assert_eq!(published.sequence(), 1);
    assert!(!orchestrator.is_running());
    assert_eq!(*orchestrator.state().borrow(), RunState::Complete);
}

#[tokio::test]
async fn test_sequential_runs_replace_report() {
    let orchestrator = orchestrator(ScriptedProbe::healthy(), DEFAULT_PROBE_TIMEOUT);

    let first = orchestrator.run().await;
    let second = orchestrator.run().await;

    assert_eq!(first.report().unwrap().sequence(), 1);
    assert_eq!(second.report().unwrap().sequence(), 2);
    assert_eq!(orchestrator.latest().unwrap().sequence(), 2);
}

#[tokio::test]
async fn test_unsupported_platform_yields_single_entry() {
    let orchestrator = Orchestrator::new(
        Platform::from_os_name("haiku"),
        None,
        Arc::new(RuleTable::default()),
        DEFAULT_PROBE_TIMEOUT,
    );
    let outcome = orchestrator.run().await;
    let report = outcome.report().unwrap();

    assert_eq!(report.len(), 1);
    let entry = &report.entries()[0];
    assert_eq!(entry.subsystem, Subsystem::Diagnosis);
    assert_eq!(entry.state, HealthState::Unsupported);
    assert_eq!(entry.detail, "Unsupported operating system");
}

#[tokio::test]
async fn test_refresh_publishes_until_shutdown() {
    let orchestrator = Arc::new(orchestrator(ScriptedProbe::healthy(), DEFAULT_PROBE_TIMEOUT));
    let mut reports = orchestrator.subscribe();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let refresh = orchestrator.spawn_refresh(Duration::from_millis(20), shutdown_rx);

    reports.changed().await.unwrap();
    reports.changed().await.unwrap();
    let latest = reports.borrow_and_update().clone().unwrap();
    assert!(latest.sequence() >= 2);

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), refresh)
        .await
        .expect("refresh task should stop")
        .unwrap();
}
