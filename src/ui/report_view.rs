use colored::*;
use unicode_width::UnicodeWidthStr;

use crate::core::diagnostics::{HealthState, Report};
use crate::core::export::HEADERS;

/// Widest the Details and Potential Solutions columns get before wrapping
const MAX_TEXT_WIDTH: usize = 48;

/// Color a state label the way the table shows it
pub fn colorize_state(state: HealthState, text: &str) -> ColoredString {
    match state {
        HealthState::Good => text.green(),
        HealthState::Warning => text.yellow().bold(),
        HealthState::Error => text.red().bold(),
        HealthState::NotFound => text.bright_black(),
        HealthState::Unsupported => text.magenta(),
    }
}

/// Pad `text` with spaces to `width` display columns
pub fn pad(text: &str, width: usize) -> String {
    let current = UnicodeWidthStr::width(text);
    format!("{}{}", text, " ".repeat(width.saturating_sub(current)))
}

/// Greedy word wrap on display width; a single long word stays whole
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            UnicodeWidthStr::width(word)
        } else {
            UnicodeWidthStr::width(current.as_str()) + 1 + UnicodeWidthStr::width(word)
        };

        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn column_width<'a>(header: &str, cells: impl Iterator<Item = &'a str>, cap: usize) -> usize {
    cells
        .map(UnicodeWidthStr::width)
        .chain(std::iter::once(UnicodeWidthStr::width(header)))
        .max()
        .unwrap_or(0)
        .min(cap.max(UnicodeWidthStr::width(header)))
}

/// Print the report as a four-column table followed by a summary line
pub fn print_report(report: &Report) {
    let entries = report.entries();

    let widths = [
        column_width(HEADERS[0], entries.iter().map(|e| e.subsystem.name()), usize::MAX),
        column_width(HEADERS[1], entries.iter().map(|e| e.state.label()), usize::MAX),
        column_width(HEADERS[2], entries.iter().map(|e| e.detail.as_str()), MAX_TEXT_WIDTH),
        column_width(
            HEADERS[3],
            entries.iter().map(|e| e.remediation.as_deref().unwrap_or("")),
            MAX_TEXT_WIDTH,
        ),
    ];

    println!(
        "\n{}  {}",
        "SYSTEM DIAGNOSIS".bold().bright_cyan(),
        format!(
            "{} · {}",
            report.platform(),
            report
                .generated_at()
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
        )
        .dimmed()
    );

    let header_line = HEADERS
        .iter()
        .zip(widths.iter())
        .map(|(header, width)| pad(header, *width))
        .collect::<Vec<_>>()
        .join("  ");
    println!("{}", header_line.bold());
    println!("{}", "-".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)));

    for entry in entries {
        let details = wrap(&entry.detail, widths[2]);
        let solutions = wrap(entry.remediation.as_deref().unwrap_or(""), widths[3]);
        let rows = details.len().max(solutions.len());

        for i in 0..rows {
            let (component, status) = if i == 0 {
                (entry.subsystem.name(), entry.state.label())
            } else {
                ("", "")
            };

            println!(
                "{}  {}  {}  {}",
                pad(component, widths[0]).cyan(),
                colorize_state(entry.state, &pad(status, widths[1])),
                pad(details.get(i).map(String::as_str).unwrap_or(""), widths[2]),
                solutions.get(i).map(String::as_str).unwrap_or("").dimmed()
            );
        }
    }

    print_summary(report);
}

fn print_summary(report: &Report) {
    let summary = report.summary();
    let parts: Vec<String> = HealthState::ALL
        .iter()
        .filter(|state| summary.count(**state) > 0)
        .map(|state| {
            colorize_state(*state, &format!("{} {}", summary.count(*state), state.label()))
                .to_string()
        })
        .collect();

    let overall = report.overall_state();
    println!();
    println!(
        "{} {}   {}",
        "Overall:".white().bold(),
        colorize_state(overall, overall.label()),
        parts.join(", ")
    );
}
