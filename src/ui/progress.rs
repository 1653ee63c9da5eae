// Progress indicators for a diagnosis run

use colored::Colorize;
use std::io::{self, Write};

use crate::core::diagnostics::{RunState, Subsystem};

/// Display a simple progress bar
///
/// # Arguments
/// * `processed` - Number of items processed
/// * `total` - Total number of items
/// * `prefix` - Text to display before the progress bar
pub fn show_progress_bar(processed: usize, total: usize, prefix: &str) {
    let percentage = percent(processed, total);

    let bar_length: usize = 30;
    let filled = percentage * bar_length / 100;
    let empty = bar_length.saturating_sub(filled);

    print!(
        "\r{} [{}{}] {}% ({}/{}) ",
        prefix.white(),
        "=".repeat(filled).green(),
        " ".repeat(empty),
        percentage,
        processed,
        total
    );

    io::stdout().flush().ok();
}

/// Clear the current line (useful for progress bars)
pub fn clear_line() {
    print!("\r{}\r", " ".repeat(80));
    io::stdout().flush().ok();
}

fn percent(processed: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    (processed.min(total) * 100) / total
}

/// Subsystems finished so far and the label for `state`
pub fn run_position(state: RunState) -> (usize, String) {
    let total = Subsystem::PROBED.len();
    let index_of = |subsystem: Subsystem| {
        Subsystem::PROBED
            .iter()
            .position(|s| *s == subsystem)
            .unwrap_or(0)
    };

    match state {
        RunState::Idle => (0, "Starting".to_string()),
        RunState::Probing(subsystem) => (index_of(subsystem), format!("Probing {}", subsystem.name())),
        RunState::Classifying(subsystem) => {
            (index_of(subsystem), format!("Checking {}", subsystem.name()))
        }
        RunState::Complete => (total, "Done".to_string()),
    }
}

/// Render one progress update for a run
pub fn show_run_progress(state: RunState) {
    let (processed, label) = run_position(state);
    show_progress_bar(processed, Subsystem::PROBED.len(), &format!("{:<18}", label));
}
