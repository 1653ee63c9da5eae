use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;

use crate::core::Config;

pub fn execute(matches: &ArgMatches, config_path: &Path) -> Result<()> {
    match matches.subcommand() {
        Some(("show", _)) => show(config_path),
        Some(("path", _)) => {
            println!("{}", config_path.display());
            Ok(())
        }
        Some(("init", sub_matches)) => init(config_path, sub_matches.get_flag("force")),
        _ => {
            println!("Use 'hdiag config --help' for more information.");
            Ok(())
        }
    }
}

fn show(config_path: &Path) -> Result<()> {
    let config = Config::load_from(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    let effective = config.effective()?;

    if !config_path.exists() {
        println!(
            "{}",
            format!("No config file at {}, showing defaults.", config_path.display()).dimmed()
        );
    }
    println!("{}", serde_json::to_string_pretty(&effective)?);
    Ok(())
}

fn init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        println!(
            "{}",
            format!("Config file already exists: {}", config_path.display()).yellow()
        );
        println!("{}", "Use --force to overwrite it.".dimmed());
        return Ok(());
    }

    Config::default()
        .effective()?
        .save_to(config_path)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!(
        "{} {}",
        "Config written to".green().bold(),
        config_path.display().to_string().cyan()
    );
    Ok(())
}
