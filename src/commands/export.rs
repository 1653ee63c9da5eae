use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;

use crate::core::diagnostics::Report;
use crate::core::export::{compose_mail, export, mailto_url};
use crate::core::Config;

use super::diagnose::run_once;

/// Execute the export command
pub fn execute(matches: &ArgMatches, config: &Config) -> Result<()> {
    let path = matches
        .get_one::<PathBuf>("path")
        .context("Path argument is required")?;
    let email = matches.get_flag("email");

    let report = run_once(config, true)?;
    export_report(&report, path, email, config)
}

/// Export `report` to `path` and optionally hand it to the mail client
pub(crate) fn export_report(
    report: &Report,
    path: &Path,
    email: bool,
    config: &Config,
) -> Result<()> {
    export(report, path).with_context(|| format!("Failed to export report to {}", path.display()))?;

    println!(
        "{} {}",
        "Report exported to".green().bold(),
        path.display().to_string().cyan()
    );

    if email {
        // The mail client needs the full path to find the attachment
        let attachment = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        match compose_mail(&attachment, &config.mail) {
            Ok(()) => println!("{}", "Opened the mail client.".green()),
            Err(e) => {
                log::warn!("Mail hand-off failed: {}", e);
                println!(
                    "{}",
                    format!("⚠️  Warning: Could not open the mail client: {}", e).yellow()
                );
                if let Ok(url) = mailto_url(&attachment, &config.mail) {
                    println!("{}", "Open this link manually:".dimmed());
                    println!("  {}", url.as_str().cyan());
                }
            }
        }
    }

    Ok(())
}
