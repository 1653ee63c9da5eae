//! Windows probe: CIM video controllers and pending driver updates, both
//! queried through PowerShell and returned as JSON.

use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::command;
use super::{into_reading, sensors, Platform, PlatformProbe};
use crate::core::diagnostics::{GpuController, Measurement, MetricReading, Subsystem};
use crate::error::ProbeError;

const VIDEO_CONTROLLERS_SCRIPT: &str = "ConvertTo-Json -Compress -InputObject @(\
Get-CimInstance -ClassName Win32_VideoController | Select-Object Name, Status)";

const PENDING_DRIVERS_SCRIPT: &str = "$searcher = (New-Object -ComObject Microsoft.Update.Session).CreateUpdateSearcher(); \
$result = $searcher.Search(\"IsInstalled=0 and Type='Driver'\"); \
ConvertTo-Json -Compress -InputObject @($result.Updates | ForEach-Object { $_.Title })";

#[derive(Debug, Deserialize)]
struct VideoControllerPs {
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "Status")]
    status: Option<String>,
}

pub struct WindowsProbe {
    command_timeout: Duration,
}

impl WindowsProbe {
    pub fn new(command_timeout: Duration) -> Self {
        Self { command_timeout }
    }

    async fn gpu_controllers(&self) -> Result<Vec<GpuController>, ProbeError> {
        let controllers: Vec<VideoControllerPs> =
            run_powershell_json(VIDEO_CONTROLLERS_SCRIPT, self.command_timeout).await?;
        Ok(into_controllers(controllers))
    }

    async fn pending_drivers(&self) -> Result<Vec<String>, ProbeError> {
        run_powershell_json(PENDING_DRIVERS_SCRIPT, self.command_timeout).await
    }
}

impl PlatformProbe for WindowsProbe {
    fn platform(&self) -> Platform {
        Platform::Windows
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
                        .pending_drivers()
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

fn into_controllers(raw: Vec<VideoControllerPs>) -> Vec<GpuController> {
    raw.into_iter()
        .filter_map(|c| {
            let name = c.name?;
            Some(GpuController::new(name, c.status))
        })
        .collect()
}

/// Run a PowerShell script whose stdout is a single JSON document
async fn run_powershell_json<T: DeserializeOwned>(
    script: &str,
    timeout: Duration,
) -> Result<T, ProbeError> {
    let output = command::run_checked(
        "powershell",
        &["-NoProfile", "-NonInteractive", "-Command", script],
        timeout,
    )
    .await?;

    parse_json_output(&output.stdout)
}

/// Empty output means PowerShell had nothing to serialize, i.e. an empty list
fn parse_json_output<T: DeserializeOwned>(stdout: &str) -> Result<T, ProbeError> {
    let trimmed = stdout.trim();
    let document = if trimmed.is_empty() { "[]" } else { trimmed };

    serde_json::from_str(document)
        .map_err(|e| ProbeError::Parse(format!("JSON parsing failed: {e}. Output: {trimmed}")))
}
