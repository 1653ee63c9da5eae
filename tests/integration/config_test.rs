use std::time::Duration;

use hdiag::core::config::{Config, MailSettings};
use hdiag::core::diagnostics::{HealthState, Predicate, Subsystem};
use hdiag::DiagError;
use tempfile::TempDir;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.command_timeout(), Duration::from_secs(5));
    assert_eq!(config.probe_timeout(), Duration::from_secs(10));
    assert_eq!(config.refresh_interval(), Duration::from_millis(1000));
    assert!(config.thresholds.is_empty());
    assert_eq!(config.mail.subject, "Computer Diagnostic Report");
}

#[test]
fn test_missing_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load_from(&dir.path().join("config.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_empty_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "  \n").unwrap();

    assert_eq!(Config::load_from(&path).unwrap(), Config::default());
}

#[test]
fn test_malformed_file_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(Config::load_from(&path), Err(DiagError::Config(_))));
}

#[test]
fn test_mismatched_trigger_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{ "thresholds": { "network": { "trigger": "value > 10", "state": "Warning" } } }"#,
    )
    .unwrap();

    assert!(Config::load_from(&path).is_err());
}

#[test]
fn test_config_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hdiag").join("config.json");

    let mut config = Config {
        refresh_interval_ms: 2500,
        mail: MailSettings {
            recipient: "helpdesk@example.com".to_string(),
            ..Default::default()
        },
        ..Default::default()
    };
    config.thresholds = config.effective().unwrap().thresholds;
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);

    let rules = loaded.rule_table().unwrap();
    let cpu = rules.rule_for(Subsystem::Cpu).unwrap();
    assert_eq!(cpu.trigger, Predicate::above(80.0));
    assert_eq!(cpu.state, HealthState::Warning);
}
