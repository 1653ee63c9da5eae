use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// One monitored facet of the host.
///
/// Declaration order is the probe order, which is also the row order of every
/// report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subsystem {
    Cpu,
    Memory,
    Storage,
    Gpu,
    Network,
    Drivers,
    /// Pseudo-subsystem carrying run-level verdicts (unsupported platform).
    Diagnosis,
}

impl Subsystem {
    /// Subsystems probed on every supported platform, in report order.
    pub const PROBED: [Subsystem; 6] = [
        Subsystem::Cpu,
        Subsystem::Memory,
        Subsystem::Storage,
        Subsystem::Gpu,
        Subsystem::Network,
        Subsystem::Drivers,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Subsystem::Cpu => "CPU",
            Subsystem::Memory => "Memory",
            Subsystem::Storage => "Storage",
            Subsystem::Gpu => "GPU",
            Subsystem::Network => "Network",
            Subsystem::Drivers => "Drivers",
            Subsystem::Diagnosis => "Diagnosis",
        }
    }

    /// Detail shown when the host does not expose data for this subsystem
    pub fn unavailable_detail(&self) -> String {
        match self {
            Subsystem::Cpu => "CPU temperature data not available".to_string(),
            other => format!("{} data not available", other.name()),
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classification outcome for one health entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HealthState {
    Good,
    Warning,
    Error,
    NotFound,
    Unsupported,
}

impl HealthState {
    pub const ALL: [HealthState; 5] = [
        HealthState::Good,
        HealthState::Warning,
        HealthState::Error,
        HealthState::NotFound,
        HealthState::Unsupported,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            HealthState::Good => "Good",
            HealthState::Warning => "Warning",
            HealthState::Error => "Error",
            HealthState::NotFound => "Not Found",
            HealthState::Unsupported => "Unsupported",
        }
    }

    /// Rank used when aggregating a report into a single verdict
    pub fn severity(&self) -> u8 {
        match self {
            HealthState::Good => 0,
            HealthState::NotFound => 1,
            HealthState::Unsupported => 2,
            HealthState::Warning => 3,
            HealthState::Error => 4,
        }
    }

    pub fn is_actionable(&self) -> bool {
        matches!(self, HealthState::Warning | HealthState::Error)
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GpuVendor {
    Nvidia,
    Amd,
    Intel,
}

impl GpuVendor {
    /// Look for a vendor marker in free-form tool output or a device name
    pub fn detect(text: &str) -> Option<GpuVendor> {
        let text = text.to_ascii_lowercase();

        if text.contains("nvidia") {
            Some(GpuVendor::Nvidia)
        } else if text.contains("amd") || text.contains("radeon") {
            Some(GpuVendor::Amd)
        } else if text.contains("intel") {
            Some(GpuVendor::Intel)
        } else {
            None
        }
    }
}

/// A display controller as reported by the OS or a vendor tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuController {
    pub name: String,
    pub vendor: Option<GpuVendor>,
    /// Controller status, when the platform reports one (`OK` when healthy)
    pub status: Option<String>,
}

impl GpuController {
    pub fn new(name: impl Into<String>, status: Option<String>) -> Self {
        let name = name.into();
        Self {
            vendor: GpuVendor::detect(&name),
            name,
            status,
        }
    }

    pub fn is_faulty(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|status| !status.trim().eq_ignore_ascii_case("ok"))
    }
}

/// Raw value produced by a probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Measurement {
    Temperature { celsius: f32 },
    MemoryUsage { used_percent: f32 },
    StorageUsage { mount_point: String, used_percent: f32 },
    Gpu { controllers: Vec<GpuController> },
    NetworkTotals { bytes_sent: u64, bytes_received: u64 },
    PendingUpdates { entries: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    Ok(Measurement),
    /// The host exposes no data for this subsystem (not a fault)
    Unavailable,
    Failed(String),
}

/// A single probe result. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReading {
    subsystem: Subsystem,
    collected_at: DateTime<Utc>,
    outcome: Outcome,
}

impl MetricReading {
    pub fn new(subsystem: Subsystem, outcome: Outcome) -> Self {
        Self {
            subsystem,
            collected_at: Utc::now(),
            outcome,
        }
    }

    pub fn ok(subsystem: Subsystem, measurement: Measurement) -> Self {
        Self::new(subsystem, Outcome::Ok(measurement))
    }

    pub fn unavailable(subsystem: Subsystem) -> Self {
        Self::new(subsystem, Outcome::Unavailable)
    }

    pub fn failed<S: Into<String>>(subsystem: Subsystem, reason: S) -> Self {
        Self::new(subsystem, Outcome::Failed(reason.into()))
    }

    pub fn subsystem(&self) -> Subsystem {
        self.subsystem
    }

    pub fn collected_at(&self) -> DateTime<Utc> {
        self.collected_at
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }
}

/// Classified result for one subsystem (or one mount point for storage)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthEntry {
    pub subsystem: Subsystem,
    pub state: HealthState,
    pub detail: String,
    pub remediation: Option<String>,
}

impl HealthEntry {
    pub fn new<S: Into<String>>(subsystem: Subsystem, state: HealthState, detail: S) -> Self {
        Self {
            subsystem,
            state,
            detail: detail.into(),
            remediation: None,
        }
    }

    pub fn with_remediation(mut self, remediation: Option<String>) -> Self {
        self.remediation = remediation;
        self
    }

    /// The single entry of a run on a platform that cannot be diagnosed
    pub fn unsupported_platform() -> Self {
        Self::new(
            Subsystem::Diagnosis,
            HealthState::Unsupported,
            "Unsupported operating system",
        )
    }
}

/// Number of entries per health state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub counts: BTreeMap<HealthState, usize>,
}

impl ReportSummary {
    pub fn count(&self, state: HealthState) -> usize {
        self.counts.get(&state).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// The complete set of health entries from one diagnostic run.
///
/// Reports are never patched: every run builds a new one and consumers
/// receive it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    sequence: u64,
    generated_at: DateTime<Utc>,
    platform: Platform,
    entries: Vec<HealthEntry>,
}

impl Report {
    pub fn new(sequence: u64, platform: Platform, entries: Vec<HealthEntry>) -> Self {
        Self {
            sequence,
            generated_at: Utc::now(),
            platform,
            entries,
        }
    }

    /// Build a standalone report, e.g. for exporting entries produced elsewhere
    pub fn from_entries(platform: Platform, entries: Vec<HealthEntry>) -> Self {
        Self::new(0, platform, entries)
    }

    /// Run number assigned by the orchestrator (1 for the first run)
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn entries(&self) -> &[HealthEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries_for(&self, subsystem: Subsystem) -> impl Iterator<Item = &HealthEntry> + '_ {
        self.entries.iter().filter(move |e| e.subsystem == subsystem)
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary::default();
        for entry in &self.entries {
            *summary.counts.entry(entry.state).or_insert(0) += 1;
        }
        summary
    }

    /// Most severe state in the report (`Good` when empty)
    pub fn overall_state(&self) -> HealthState {
        self.entries
            .iter()
            .map(|e| e.state)
            .max_by_key(|s| s.severity())
            .unwrap_or(HealthState::Good)
    }
}
