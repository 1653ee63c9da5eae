//! macOS probe: `system_profiler` for displays, `softwareupdate` for updates.

use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};

use super::command;
use super::{into_reading, sensors, Platform, PlatformProbe};
use crate::core::diagnostics::{GpuController, Measurement, MetricReading, Subsystem};
use crate::error::ProbeError;

const NO_UPDATES_MARKER: &str = "No new software available";

pub struct MacProbe {
    command_timeout: Duration,
}

impl MacProbe {
    pub fn new(command_timeout: Duration) -> Self {
        Self { command_timeout }
    }

    async fn gpu_controllers(&self) -> Result<Vec<GpuController>, ProbeError> {
        let output = command::run_checked(
            "system_profiler",
            &["SPDisplaysDataType"],
            self.command_timeout,
        )
        .await?;
        Ok(parse_displays(&output.stdout))
    }

    async fn software_updates(&self) -> Result<Vec<String>, ProbeError> {
        let output =
            command::run_checked("softwareupdate", &["--list"], self.command_timeout).await?;
        // The "nothing available" notice goes to stderr.
        Ok(parse_software_updates(&format!("{}\n{}", output.stdout, output.stderr)))
    }
}

impl PlatformProbe for MacProbe {
    fn platform(&self) -> Platform {
        Platform::MacOs
    }

    fn collect(&self, subsystem: Subsystem) -> BoxFuture<'_, Vec<MetricReading>> {
        async move {
            match subsystem {
                Subsystem::Gpu => {
                    let result = self
                        .gpu_controllers()
                        .await
                        .map(|controllers| Measurement::Gpu { controllers });
                    vec![into_reading(Subsystem::Gpu, result)]
                }
                Subsystem::Drivers => {
                    let result = self
                        .software_updates()
                        .await
                        .map(|entries| Measurement::PendingUpdates { entries });
                    vec![into_reading(Subsystem::Drivers, result)]
                }
                other => sensors::collect(other).await,
            }
        }
        .boxed()
    }
}

/// `Chipset Model` entries of `system_profiler SPDisplaysDataType`
pub fn parse_displays(output: &str) -> Vec<GpuController> {
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Chipset Model:"))
        .map(|model| GpuController::new(model.trim(), None))
        .collect()
}

/// Update labels listed by `softwareupdate --list`
pub fn parse_software_updates(output: &str) -> Vec<String> {
    if output.contains(NO_UPDATES_MARKER) {
        return Vec::new();
    }

    output
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('*'))
        .map(|entry| {
            let entry = entry.trim();
            entry.strip_prefix("Label:").unwrap_or(entry).trim().to_string()
        })
        .filter(|entry| !entry.is_empty())
        .collect()
}
