//! Continuous diagnosis: re-run on an interval and redraw the table.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use tokio::sync::broadcast;

use crate::core::diagnostics::{Orchestrator, Report};
use crate::core::Config;
use crate::ui::print_report;

use super::build_runtime;

/// Execute the watch command
pub fn execute(matches: &ArgMatches, config: &Config) -> Result<()> {
    let every = matches
        .get_one::<u64>("interval")
        .copied()
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.refresh_interval());

    let orchestrator = Arc::new(
        Orchestrator::for_host(config).context("Failed to set up diagnostics")?,
    );

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let ctrlc_tx = shutdown_tx.clone();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(());
    })
    .map_err(|e| anyhow::anyhow!("Failed to set Ctrl+C handler: {}", e))?;

    let runtime = build_runtime()?;
    let result = runtime.block_on(async {
        let mut reports = orchestrator.subscribe();
        let mut shutdown = shutdown_tx.subscribe();
        let refresh = orchestrator.spawn_refresh(every, shutdown_tx.subscribe());

        loop {
            tokio::select! {
                changed = reports.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let latest = reports.borrow_and_update().clone();
                    if let Some(report) = latest {
                        render_frame(&report, every)?;
                    }
                }
                _ = shutdown.recv() => break,
            }
        }

        let _ = refresh.await;
        Ok::<(), anyhow::Error>(())
    });

    // A probe may still be waiting on a child process
    runtime.shutdown_timeout(Duration::from_secs(1));

    println!();
    println!("{}", "Stopped watching.".yellow());
    result
}

fn render_frame(report: &Report, every: Duration) -> Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;

    print_report(report);
    println!(
        "{}",
        format!(
            "Run #{} · refreshing every {} ms · Press Ctrl+C to stop",
            report.sequence(),
            every.as_millis()
        )
        .dimmed()
    );

    stdout.flush()?;
    Ok(())
}
