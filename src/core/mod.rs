// Core business logic module

pub mod config;
pub mod diagnostics;
pub mod export;
pub mod host_info;
mod pdf;

// Re-export commonly used items
pub use config::{Config, MailSettings};
pub use diagnostics::{HealthEntry, HealthState, Orchestrator, Report, RunOutcome, Subsystem};
pub use export::{compose_mail, export, mailto_url, ExportFormat};
pub use host_info::{collect_host_info, HostInfo};
