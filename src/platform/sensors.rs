//! Sensor readings shared by every supported platform.
//!
//! These go through `sysinfo`, whose calls block; each collector builds its
//! own sysinfo handle, reads it and drops it before returning.

use sysinfo::{Components, Disks, MemoryRefreshKind, Networks, RefreshKind, System};

use crate::core::diagnostics::{Measurement, MetricReading, Subsystem};

/// Labels of temperature sensors that belong to the CPU package or its cores
const CPU_SENSOR_MARKERS: [&str; 6] = ["cpu", "core", "package", "tctl", "tdie", "k10temp"];

/// Collect the readings of a sensor-backed subsystem on the blocking pool.
///
/// GPU and driver freshness are platform-specific and not handled here.
pub async fn collect(subsystem: Subsystem) -> Vec<MetricReading> {
    let result = tokio::task::spawn_blocking(move || match subsystem {
        Subsystem::Cpu => vec![cpu_temperature()],
        Subsystem::Memory => vec![memory_usage()],
        Subsystem::Storage => storage_usage(),
        Subsystem::Network => vec![network_totals()],
        other => vec![MetricReading::unavailable(other)],
    })
    .await;

    match result {
        Ok(readings) => readings,
        Err(e) => vec![MetricReading::failed(
            subsystem,
            format!("sensor task failed: {}", e),
        )],
    }
}

fn is_cpu_sensor(label: &str) -> bool {
    let label = label.to_ascii_lowercase();
    CPU_SENSOR_MARKERS.iter().any(|marker| label.contains(marker))
}

/// Hottest CPU temperature sensor, or `Unavailable` when none is exposed
pub fn cpu_temperature() -> MetricReading {
    let components = Components::new_with_refreshed_list();

    let hottest = components
        .list()
        .iter()
        .filter(|c| is_cpu_sensor(c.label()))
        .filter_map(|c| c.temperature())
        .filter(|t| t.is_finite() && *t > 0.0)
        .fold(None, |max: Option<f32>, t| Some(max.map_or(t, |m| m.max(t))));

    match hottest {
        Some(celsius) => MetricReading::ok(Subsystem::Cpu, Measurement::Temperature { celsius }),
        None => {
            log::debug!("No CPU temperature sensor exposed by this host");
            MetricReading::unavailable(Subsystem::Cpu)
        }
    }
}

pub fn memory_usage() -> MetricReading {
    let sys = System::new_with_specifics(
        RefreshKind::nothing().with_memory(MemoryRefreshKind::nothing().with_ram()),
    );

    let total = sys.total_memory();
    if total == 0 {
        return MetricReading::unavailable(Subsystem::Memory);
    }

    let used_percent = (sys.used_memory() as f32 / total as f32) * 100.0;
    MetricReading::ok(Subsystem::Memory, Measurement::MemoryUsage { used_percent })
}

/// One reading per mounted partition
pub fn storage_usage() -> Vec<MetricReading> {
    let disks = Disks::new_with_refreshed_list();

    disks
        .list()
        .iter()
        .map(|disk| {
            let total = disk.total_space();
            let used = total.saturating_sub(disk.available_space());
            let used_percent = if total > 0 {
                (used as f32 / total as f32) * 100.0
            } else {
                0.0
            };

            MetricReading::ok(
                Subsystem::Storage,
                Measurement::StorageUsage {
                    mount_point: disk.mount_point().to_string_lossy().to_string(),
                    used_percent,
                },
            )
        })
        .collect()
}

/// Cumulative bytes over all interfaces since they came up
pub fn network_totals() -> MetricReading {
    let networks = Networks::new_with_refreshed_list();

    let (bytes_sent, bytes_received) = networks
        .list()
        .iter()
        .fold((0u64, 0u64), |(sent, recv), (_, data)| {
            (
                sent.saturating_add(data.total_transmitted()),
                recv.saturating_add(data.total_received()),
            )
        });

    MetricReading::ok(
        Subsystem::Network,
        Measurement::NetworkTotals {
            bytes_sent,
            bytes_received,
        },
    )
}
