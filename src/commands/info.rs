use anyhow::Result;
use clap::ArgMatches;

use crate::core::host_info::collect_host_info;
use crate::ui::print_host_info;

/// Execute the info command
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let info = collect_host_info();

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print_host_info(&info);
    }

    Ok(())
}
