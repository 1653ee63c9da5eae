use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;

/// Build the command-line interface
pub fn build_cli() -> Command {
    Command::new("hdiag")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Check the health of this computer's hardware and drivers")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Use a configuration file other than the default one")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(
            Command::new("diagnose")
                .about("Run a diagnosis once and show the health table")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the report as JSON instead of a table")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("export")
                        .long("export")
                        .value_name("PATH")
                        .help("Also export the report (CSV; a .json or .pdf path selects JSON or PDF)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("email")
                        .long("email")
                        .help("Open the mail client with the exported report")
                        .action(ArgAction::SetTrue)
                        .requires("export"),
                ),
        )
        .subcommand(
            Command::new("watch")
                .about("Keep re-running the diagnosis until Ctrl+C")
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .value_name("MS")
                        .help("Refresh interval in milliseconds (default from config, 1000)")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Run a diagnosis once and export the report")
                .arg(
                    Arg::new("path")
                        .help("Destination file (CSV; a .json or .pdf path selects JSON or PDF)")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .index(1),
                )
                .arg(
                    Arg::new("email")
                        .long("email")
                        .help("Open the mail client with the exported report")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("info")
                .about("Show information about this computer")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Inspect or create the configuration file")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(
                    Command::new("show").about("Print the effective configuration"),
                )
                .subcommand(Command::new("path").about("Print the configuration file location"))
                .subcommand(
                    Command::new("init")
                        .about("Write a configuration file with every default spelled out")
                        .arg(
                            Arg::new("force")
                                .long("force")
                                .help("Overwrite an existing file")
                                .action(ArgAction::SetTrue),
                        ),
                ),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .help("Shell to generate completions for (bash, zsh, fish, powershell, elvish)")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(Command::new("version").about("Shows version information"))
}
