// Platform-specific code module

pub mod command;
pub mod linux;
pub mod macos;
pub mod sensors;
pub mod windows;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::core::diagnostics::{Measurement, MetricReading, Subsystem};
use crate::error::ProbeError;

pub use linux::LinuxProbe;
pub use macos::MacProbe;
pub use windows::WindowsProbe;

/// Operating system family the diagnostics run on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Windows,
    Linux,
    MacOs,
    Unsupported(String),
}

impl Platform {
    /// Platform of the running host
    pub fn detect() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Map an OS identifier (`std::env::consts::OS` style) to a platform
    pub fn from_os_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "windows" => Platform::Windows,
            "linux" => Platform::Linux,
            "macos" | "darwin" => Platform::MacOs,
            _ => Platform::Unsupported(name.to_string()),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Platform::Unsupported(_))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Windows => f.write_str("Windows"),
            Platform::Linux => f.write_str("Linux"),
            Platform::MacOs => f.write_str("macOS"),
            Platform::Unsupported(name) => write!(f, "Unsupported ({})", name),
        }
    }
}

/// Collects raw readings for one subsystem on one platform.
///
/// Implementations never fail: collection problems are reported as
/// `Failed` or `Unavailable` readings. Storage yields one reading per mount
/// point; every other subsystem yields exactly one.
pub trait PlatformProbe: Send + Sync {
    fn platform(&self) -> Platform;

    fn collect(&self, subsystem: Subsystem) -> BoxFuture<'_, Vec<MetricReading>>;
}

/// Turn the result of a shelled-out collection into a reading
pub(crate) fn into_reading(
    subsystem: Subsystem,
    result: Result<Measurement, ProbeError>,
) -> MetricReading {
    match result {
        Ok(measurement) => MetricReading::ok(subsystem, measurement),
        Err(e) => {
            log::warn!("{} probe failed: {}", subsystem, e);
            MetricReading::failed(subsystem, e.to_string())
        }
    }
}

/// Probe implementation for `platform`, or `None` when it is unsupported
pub fn probe_for(platform: &Platform, command_timeout: Duration) -> Option<Arc<dyn PlatformProbe>> {
    match platform {
        Platform::Windows => Some(Arc::new(WindowsProbe::new(command_timeout))),
        Platform::Linux => Some(Arc::new(LinuxProbe::new(command_timeout))),
        Platform::MacOs => Some(Arc::new(MacProbe::new(command_timeout))),
        Platform::Unsupported(_) => None,
    }
}
