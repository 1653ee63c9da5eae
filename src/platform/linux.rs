//! Linux probe: vendor GPU tools and the distribution package manager.

use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use once_cell::sync::Lazy;
use regex::Regex;

use super::command::{self, non_zero_exit};
use super::{into_reading, sensors, Platform, PlatformProbe};
use crate::core::diagnostics::{GpuController, Measurement, MetricReading, Subsystem};
use crate::error::ProbeError;

static NVIDIA_PRODUCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*Product Name\s*:\s*(.+?)\s*$").expect("valid regex"));

static LSPCI_DISPLAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(?:VGA compatible controller|3D controller|Display controller)\s*:\s*(.+?)\s*$")
        .expect("valid regex")
});

/// `dnf check-update` exits with 100 when updates are available
const DNF_UPDATES_AVAILABLE: i32 = 100;

pub struct LinuxProbe {
    command_timeout: Duration,
}

impl LinuxProbe {
    pub fn new(command_timeout: Duration) -> Self {
        Self { command_timeout }
    }

    async fn gpu_controllers(&self) -> Result<Vec<GpuController>, ProbeError> {
        self.gpu_controllers_from("nvidia-smi", "lspci").await
    }

    /// Prefer the NVIDIA tool when present, then fall back to the PCI listing.
    ///
    /// Only a failure of the last tool tried is reported; a broken NVIDIA
    /// driver must not hide the other controllers.
    async fn gpu_controllers_from(
        &self,
        nvidia_smi: &str,
        lspci: &str,
    ) -> Result<Vec<GpuController>, ProbeError> {
        if command::is_installed(nvidia_smi) {
            match command::run_checked(nvidia_smi, &["-q"], self.command_timeout).await {
                Ok(output) => {
                    let controllers = parse_nvidia_smi(&output.stdout);
                    if !controllers.is_empty() {
                        return Ok(controllers);
                    }
                }
                Err(e) => log::debug!("nvidia-smi failed, trying lspci: {}", e),
            }
        }

        if command::is_installed(lspci) {
            let output = command::run_checked(lspci, &[], self.command_timeout).await?;
            return Ok(parse_lspci(&output.stdout));
        }

        log::debug!("Neither nvidia-smi nor lspci gave a controller list");
        Ok(Vec::new())
    }

    async fn pending_updates(&self) -> MetricReading {
        let result = if command::is_installed("apt") {
            self.apt_upgradable().await
        } else if command::is_installed("dnf") {
            self.dnf_check_update().await
        } else {
            log::debug!("No supported package manager found");
            return MetricReading::unavailable(Subsystem::Drivers);
        };

        into_reading(
            Subsystem::Drivers,
            result.map(|entries| Measurement::PendingUpdates { entries }),
        )
    }

    async fn apt_upgradable(&self) -> Result<Vec<String>, ProbeError> {
        let output =
            command::run_checked("apt", &["list", "--upgradable"], self.command_timeout).await?;
        Ok(parse_apt_upgradable(&output.stdout))
    }

    async fn dnf_check_update(&self) -> Result<Vec<String>, ProbeError> {
        let output =
            command::run_bounded("dnf", &["check-update", "-q"], self.command_timeout).await?;
        match output.code {
            Some(0) => Ok(Vec::new()),
            Some(DNF_UPDATES_AVAILABLE) => Ok(parse_dnf_check_update(&output.stdout)),
            _ => Err(non_zero_exit("dnf", &output)),
        }
    }
}

impl PlatformProbe for LinuxProbe {
    fn platform(&self) -> Platform {
        Platform::Linux
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
                Subsystem::Drivers => vec![self.pending_updates().await],
                other => sensors::collect(other).await,
            }
        }
        .boxed()
    }
}

/// Controllers listed in `nvidia-smi -q` output
pub fn parse_nvidia_smi(output: &str) -> Vec<GpuController> {
    let controllers: Vec<_> = NVIDIA_PRODUCT_RE
        .captures_iter(output)
        .map(|caps| GpuController::new(&caps[1], None))
        .collect();

    if controllers.is_empty() && output.contains("NVIDIA") {
        return vec![GpuController::new("NVIDIA GPU", None)];
    }
    controllers
}

/// Display controllers from plain `lspci` output
pub fn parse_lspci(output: &str) -> Vec<GpuController> {
    LSPCI_DISPLAY_RE
        .captures_iter(output)
        .map(|caps| GpuController::new(&caps[1], None))
        .collect()
}

/// Package lines of `apt list --upgradable` (the `Listing...` banner is skipped)
pub fn parse_apt_upgradable(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| line.contains("[upgradable from"))
        .map(str::to_string)
        .collect()
}

/// Package lines of `dnf check-update -q`
pub fn parse_dnf_check_update(output: &str) -> Vec<String> {
    output
        .lines()
        .take_while(|line| !line.starts_with("Obsoleting Packages"))
        .filter(|line| !line.starts_with(char::is_whitespace))
        .filter(|line| line.split_whitespace().count() == 3)
        .map(|line| line.trim().to_string())
        .collect()
}
