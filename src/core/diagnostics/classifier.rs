//! Pure mapping from a metric reading to a health entry.

use super::rules::RuleTable;
use super::types::{
    GpuController, HealthEntry, HealthState, Measurement, MetricReading, Outcome, Subsystem,
};

/// Classify a reading against the rule table.
///
/// `Failed` readings always become `Error` entries carrying the reason, and
/// `Unavailable` readings always become `Good`; neither consults the table.
pub fn classify(reading: &MetricReading, rules: &RuleTable) -> HealthEntry {
    let subsystem = reading.subsystem();

    match reading.outcome() {
        Outcome::Failed(reason) => HealthEntry::new(
            subsystem,
            HealthState::Error,
            format!("Unable to check {} health: {}", subsystem, reason),
        ),
        Outcome::Unavailable => {
            HealthEntry::new(subsystem, HealthState::Good, subsystem.unavailable_detail())
        }
        Outcome::Ok(measurement) => classify_measurement(subsystem, measurement, rules),
    }
}

fn classify_measurement(
    subsystem: Subsystem,
    measurement: &Measurement,
    rules: &RuleTable,
) -> HealthEntry {
    if let Measurement::Gpu { controllers } = measurement {
        if !controllers.iter().any(|c| c.vendor.is_some()) {
            return HealthEntry::new(
                subsystem,
                HealthState::NotFound,
                "No GPU or unsupported GPU found",
            );
        }
    }

    let triggered = rules
        .rule_for(subsystem)
        .filter(|rule| rule.trigger.matches(measurement));

    let state = triggered.map_or(HealthState::Good, |rule| rule.state);
    let detail = describe(measurement, triggered.is_some());
    let remediation = triggered
        .filter(|rule| rule.state != HealthState::Good)
        .and_then(|rule| rule.remediation.clone());

    HealthEntry::new(subsystem, state, detail).with_remediation(remediation)
}

fn describe(measurement: &Measurement, triggered: bool) -> String {
    match measurement {
        Measurement::Temperature { celsius } => {
            if triggered {
                format!("High temperature: {}°C", format_number(*celsius))
            } else {
                format!("Temperature: {}°C", format_number(*celsius))
            }
        }
        Measurement::MemoryUsage { used_percent } => {
            if triggered {
                format!("High usage: {}%", format_number(*used_percent))
            } else {
                format!("Usage: {}%", format_number(*used_percent))
            }
        }
        Measurement::StorageUsage {
            mount_point,
            used_percent,
        } => {
            if triggered {
                format!("High usage on {}: {}%", mount_point, format_number(*used_percent))
            } else {
                format!("Usage on {}: {}%", mount_point, format_number(*used_percent))
            }
        }
        Measurement::Gpu { controllers } => describe_gpu(controllers, triggered),
        Measurement::NetworkTotals { .. } => {
            if triggered {
                "No network activity detected".to_string()
            } else {
                "Network health is good".to_string()
            }
        }
        Measurement::PendingUpdates { entries } => {
            if triggered {
                format!("Some drivers may need updating ({} pending)", entries.len())
            } else {
                "All drivers are up-to-date".to_string()
            }
        }
    }
}

fn describe_gpu(controllers: &[GpuController], triggered: bool) -> String {
    if triggered {
        controllers
            .iter()
            .filter(|c| c.is_faulty())
            .map(|c| {
                format!(
                    "Potential issue with GPU: {} - Status: {}",
                    c.name,
                    c.status.as_deref().unwrap_or("Unknown")
                )
            })
            .collect::<Vec<_>>()
            .join("; ")
    } else {
        let names = controllers
            .iter()
            .filter(|c| c.vendor.is_some())
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        format!("GPU: {} - Status: OK", names)
    }
}

/// Render with at most one decimal, dropping a trailing `.0`
pub fn format_number(value: f32) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{:.0}", rounded)
    } else {
        format!("{:.1}", rounded)
    }
}
