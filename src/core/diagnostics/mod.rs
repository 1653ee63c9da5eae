//! Host health diagnostics.
//!
//! Readings come from a [`crate::platform::PlatformProbe`], are turned into
//! health entries by [`classify`] and assembled into a [`Report`] by the
//! [`Orchestrator`].

pub mod classifier;
pub mod orchestrator;
pub mod rules;
pub mod types;

pub use classifier::classify;
pub use orchestrator::{Orchestrator, RunOutcome, RunState, DEFAULT_PROBE_TIMEOUT};
pub use rules::{Comparison, Predicate, RuleSpec, RuleTable, ThresholdRule};
pub use types::{
    GpuController, GpuVendor, HealthEntry, HealthState, Measurement, MetricReading, Outcome,
    Report, ReportSummary, Subsystem,
};
