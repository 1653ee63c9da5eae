use std::collections::BTreeMap;

use hdiag::core::diagnostics::{
    classify, GpuController, HealthState, Measurement, MetricReading, RuleSpec, RuleTable,
    Subsystem,
};

fn rules() -> RuleTable {
    RuleTable::default()
}

#[test]
fn test_memory_pressure_scenario() {
    let reading = MetricReading::ok(
        Subsystem::Memory,
        Measurement::MemoryUsage { used_percent: 95.0 },
    );
    let entry = classify(&reading, &rules());

    assert_eq!(entry.state, HealthState::Warning);
    assert_eq!(entry.detail, "High usage: 95%");
    assert_eq!(
        entry.remediation.as_deref(),
        Some("Check for resource-intensive applications or processes.")
    );
}

#[test]
fn test_idle_network_scenario() {
    let reading = MetricReading::ok(
        Subsystem::Network,
        Measurement::NetworkTotals {
            bytes_sent: 0,
            bytes_received: 0,
        },
    );
    let entry = classify(&reading, &rules());

    assert_eq!(entry.state, HealthState::NotFound);
    assert_eq!(entry.detail, "No network activity detected");
    assert_eq!(
        entry.remediation.as_deref(),
        Some("Check network connections and settings.")
    );
}

#[test]
fn test_failures_are_errors_for_every_subsystem() {
    for subsystem in Subsystem::PROBED {
        let reading = MetricReading::failed(subsystem, "boom: exit code 3");
        let entry = classify(&reading, &rules());

        assert_eq!(entry.state, HealthState::Error, "{}", subsystem);
        assert!(entry.detail.contains("boom: exit code 3"), "{}", entry.detail);
    }
}

#[test]
fn test_unavailable_is_good_for_every_subsystem() {
    for subsystem in Subsystem::PROBED {
        let entry = classify(&MetricReading::unavailable(subsystem), &rules());
        assert_eq!(entry.state, HealthState::Good, "{}", subsystem);
        assert!(entry.remediation.is_none());
    }

    let cpu = classify(&MetricReading::unavailable(Subsystem::Cpu), &rules());
    assert_eq!(cpu.detail, "CPU temperature data not available");
}

#[test]
fn test_classify_is_idempotent() {
    let reading = MetricReading::ok(
        Subsystem::Cpu,
        Measurement::Temperature { celsius: 84.5 },
    );
    let rules = rules();

    let first = classify(&reading, &rules);
    let second = classify(&reading, &rules);
    assert_eq!(first, second);
    assert_eq!(first.detail, "High temperature: 84.5°C");
}

#[test]
fn test_threshold_boundary_is_strict() {
    let reading = MetricReading::ok(
        Subsystem::Storage,
        Measurement::StorageUsage {
            mount_point: "C:\\".to_string(),
            used_percent: 90.0,
        },
    );
    let entry = classify(&reading, &rules());

    assert_eq!(entry.state, HealthState::Good);
    assert_eq!(entry.detail, "Usage on C:\\: 90%");
}

#[test]
fn test_faulty_gpu_is_reported() {
    let reading = MetricReading::ok(
        Subsystem::Gpu,
        Measurement::Gpu {
            controllers: vec![
                GpuController::new("Intel(R) UHD Graphics 630", Some("OK".to_string())),
                GpuController::new("AMD Radeon RX 6600", Some("Degraded".to_string())),
            ],
        },
    );
    let entry = classify(&reading, &rules());

    assert_eq!(entry.state, HealthState::Warning);
    assert_eq!(
        entry.detail,
        "Potential issue with GPU: AMD Radeon RX 6600 - Status: Degraded"
    );
}

#[test]
fn test_unknown_gpu_is_not_found() {
    let reading = MetricReading::ok(
        Subsystem::Gpu,
        Measurement::Gpu {
            controllers: vec![GpuController::new("Microsoft Basic Display Adapter", None)],
        },
    );
    let entry = classify(&reading, &rules());

    assert_eq!(entry.state, HealthState::NotFound);
    assert_eq!(entry.detail, "No GPU or unsupported GPU found");
}

#[test]
fn test_overridden_threshold_applies() {
    let mut overrides = BTreeMap::new();
    overrides.insert(
        Subsystem::Cpu,
        RuleSpec {
            trigger: "value >= 70".parse().unwrap(),
            state: HealthState::Error,
            remediation: Some("Shut down and clean the fans.".to_string()),
        },
    );
    let rules = RuleTable::with_overrides(&overrides).unwrap();

    let reading = MetricReading::ok(Subsystem::Cpu, Measurement::Temperature { celsius: 70.0 });
    let entry = classify(&reading, &rules);

    assert_eq!(entry.state, HealthState::Error);
    assert_eq!(entry.remediation.as_deref(), Some("Shut down and clean the fans."));

    // Untouched subsystems keep the defaults
    let memory = MetricReading::ok(
        Subsystem::Memory,
        Measurement::MemoryUsage { used_percent: 95.0 },
    );
    assert_eq!(classify(&memory, &rules).state, HealthState::Warning);
}

#[test]
fn test_pending_driver_updates() {
    let reading = MetricReading::ok(
        Subsystem::Drivers,
        Measurement::PendingUpdates {
            entries: vec!["nvidia-driver-535".to_string(), "linux-firmware".to_string()],
        },
    );
    let entry = classify(&reading, &rules());

    assert_eq!(entry.state, HealthState::Warning);
    assert_eq!(entry.detail, "Some drivers may need updating (2 pending)");
    assert_eq!(
        entry.remediation.as_deref(),
        Some("Update drivers using the respective update tool.")
    );
}

#[test]
fn test_lowered_threshold_keeps_remediation() {
    let config: hdiag::Config = serde_json::from_str(
        r#"{ "thresholds": { "memory": { "trigger": "value > 85", "state": "Warning" } } }"#,
    )
    .unwrap();
    let rules = config.rule_table().unwrap();

    let reading = MetricReading::ok(
        Subsystem::Memory,
        Measurement::MemoryUsage { used_percent: 88.0 },
    );
    let entry = classify(&reading, &rules);

    assert_eq!(entry.state, HealthState::Warning);
    assert_eq!(entry.detail, "High usage: 88%");
    assert_eq!(
        entry.remediation.as_deref(),
        Some("Check for resource-intensive applications or processes.")
    );
}
