use anyhow::{Context, Result};
use std::path::PathBuf;

use hdiag::cli::build_cli;
use hdiag::commands;
use hdiag::core::config::Config;

fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    hdiag::init_logging(matches.get_flag("verbose"));

    let config_path = match matches.get_one::<PathBuf>("config") {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    let load_config = || {
        Config::load_from(&config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))
    };

    match matches.subcommand() {
        Some(("diagnose", sub_matches)) => commands::diagnose(sub_matches, &load_config()?)?,
        Some(("watch", sub_matches)) => commands::watch(sub_matches, &load_config()?)?,
        Some(("export", sub_matches)) => commands::export(sub_matches, &load_config()?)?,
        Some(("info", sub_matches)) => commands::info(sub_matches)?,
        Some(("config", sub_matches)) => commands::config::execute(sub_matches, &config_path)?,
        Some(("completions", sub_matches)) => {
            let mut cli = build_cli();
            commands::completions::execute(sub_matches, &mut cli)?;
        }
        Some(("version", _)) => commands::version()?,
        _ => {
            println!("Welcome to hdiag!");
            println!("Run 'hdiag diagnose' to check this computer, or 'hdiag --help' for more information.");
        }
    }

    Ok(())
}
