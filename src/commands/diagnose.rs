use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ArgMatches;

use crate::core::diagnostics::{Orchestrator, Report, RunState};
use crate::core::Config;
use crate::ui::{clear_line, print_report, show_run_progress};

use super::build_runtime;

/// Execute the diagnose command
pub fn execute(matches: &ArgMatches, config: &Config) -> Result<()> {
    let json_output = matches.get_flag("json");
    let export_path = matches.get_one::<PathBuf>("export");
    let email = matches.get_flag("email");

    let report = run_once(config, !json_output)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(report.as_ref())?);
    } else {
        print_report(&report);
    }

    if let Some(path) = export_path {
        super::export::export_report(&report, path, email, config)?;
    }

    Ok(())
}

/// Run one diagnosis on a fresh orchestrator, optionally drawing progress
pub(crate) fn run_once(config: &Config, show_progress: bool) -> Result<Arc<Report>> {
    let orchestrator =
        Orchestrator::for_host(config).context("Failed to set up diagnostics")?;
    let runtime = build_runtime()?;

    runtime.block_on(async {
        let progress = show_progress.then(|| {
            let mut state = orchestrator.state();
            tokio::spawn(async move {
                while state.changed().await.is_ok() {
                    let current = *state.borrow_and_update();
                    show_run_progress(current);
                    if current == RunState::Complete {
                        break;
                    }
                }
            })
        });

        let outcome = orchestrator.run().await;

        if let Some(handle) = progress {
            handle.abort();
            clear_line();
        }

        outcome
            .report()
            .cloned()
            .context("A diagnosis was already running")
    })
}
