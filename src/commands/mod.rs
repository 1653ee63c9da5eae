// Command handlers module
pub mod completions;
pub mod config;
pub mod diagnose;
pub mod export;
pub mod info;
pub mod version;
pub mod watch;

// Re-exports for cleaner imports
pub use diagnose::execute as diagnose;
pub use export::execute as export;
pub use info::execute as info;
pub use version::execute as version;
pub use watch::execute as watch;

use anyhow::{Context, Result};
use tokio::runtime::Runtime;

/// Runtime the diagnosis commands drive the orchestrator on
pub(crate) fn build_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .thread_name("hdiag-worker")
        .build()
        .context("Failed to start async runtime")
}
