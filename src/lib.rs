// hdiag Library - Public API

// Re-export error types
pub mod error;
pub use error::{DiagError, ExportError, ProbeError, Result};

// Module declarations
pub mod cli;
pub mod commands;
pub mod core;
pub mod platform;
pub mod ui;

// Re-export commonly used types
pub use crate::core::config::Config;
pub use crate::core::diagnostics::{HealthEntry, HealthState, Orchestrator, Report, Subsystem};
pub use crate::platform::Platform;

/// Initialize logging; `RUST_LOG` overrides the default level
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}
