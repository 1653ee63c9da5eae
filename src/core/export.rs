//! Report export and the mail hand-off of an exported file.
//!
//! The exported document is a fixed four-column table, one row per health
//! entry. The exporter only sees the finished report.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use url::form_urlencoded;
use url::Url;

use crate::core::config::MailSettings;
use crate::core::diagnostics::{HealthEntry, Report};
use crate::core::pdf;
use crate::error::{DiagError, ExportError, Result};

/// Column headers, in the fixed order of every export
pub const HEADERS: [&str; 4] = ["Component", "Health Status", "Details", "Potential Solutions"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Pdf,
}

impl ExportFormat {
    /// `.json` and `.pdf` destinations get JSON and PDF; everything else is CSV
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            Some(ext) if ext.eq_ignore_ascii_case("pdf") => ExportFormat::Pdf,
            _ => ExportFormat::Csv,
        }
    }
}

/// One exported row. Field order matches [`HEADERS`].
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Component")]
    component: &'a str,
    #[serde(rename = "Health Status")]
    health_status: &'a str,
    #[serde(rename = "Details")]
    details: &'a str,
    #[serde(rename = "Potential Solutions")]
    potential_solutions: &'a str,
}

impl<'a> From<&'a HealthEntry> for ExportRow<'a> {
    fn from(entry: &'a HealthEntry) -> Self {
        Self {
            component: entry.subsystem.name(),
            health_status: entry.state.label(),
            details: &entry.detail,
            potential_solutions: entry.remediation.as_deref().unwrap_or(""),
        }
    }
}

/// Write `report` to `destination`, choosing the format from its extension
pub fn export(report: &Report, destination: &Path) -> std::result::Result<(), ExportError> {
    export_as(report, destination, ExportFormat::from_path(destination))
}

pub fn export_as(
    report: &Report,
    destination: &Path,
    format: ExportFormat,
) -> std::result::Result<(), ExportError> {
    let destination_error = |source: std::io::Error| ExportError::Destination {
        path: destination.to_path_buf(),
        source,
    };

    let file = File::create(destination).map_err(destination_error)?;
    let mut writer = BufWriter::new(file);

    match format {
        ExportFormat::Csv => write_csv(report, &mut writer, destination)?,
        ExportFormat::Json => write_json(report, &mut writer)?,
        ExportFormat::Pdf => {
            let document = pdf::render(report).map_err(ExportError::Serialization)?;
            writer.write_all(&document).map_err(destination_error)?;
        }
    }

    writer.flush().map_err(destination_error)?;
    log::info!(
        "Exported {} entries to {}",
        report.len(),
        destination.display()
    );
    Ok(())
}

fn write_csv<W: Write>(
    report: &Report,
    out: W,
    destination: &Path,
) -> std::result::Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);

    let map_err = |e: csv::Error| {
        if e.is_io_error() {
            match e.into_kind() {
                csv::ErrorKind::Io(source) => ExportError::Destination {
                    path: destination.to_path_buf(),
                    source,
                },
                other => ExportError::Serialization(format!("{:?}", other)),
            }
        } else {
            ExportError::Serialization(e.to_string())
        }
    };

    writer.write_record(HEADERS).map_err(map_err)?;
    for entry in report.entries() {
        let row = ExportRow::from(entry);
        writer
            .write_record([
                row.component,
                row.health_status,
                row.details,
                row.potential_solutions,
            ])
            .map_err(map_err)?;
    }

    writer.flush().map_err(|source| ExportError::Destination {
        path: destination.to_path_buf(),
        source,
    })
}

fn write_json<W: Write>(report: &Report, out: W) -> std::result::Result<(), ExportError> {
    let rows: Vec<ExportRow<'_>> = report.entries().iter().map(ExportRow::from).collect();
    serde_json::to_writer_pretty(out, &rows).map_err(|e| ExportError::Serialization(e.to_string()))
}

fn encode(value: &str) -> String {
    // Mail clients show `+` literally, so spaces are sent as %20.
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// `mailto:` URL referencing an exported report
pub fn mailto_url(attachment: &Path, mail: &MailSettings) -> Result<Url> {
    let url = format!(
        "mailto:{}?subject={}&body={}&attachment={}",
        encode(&mail.recipient).replace("%40", "@"),
        encode(&mail.subject),
        encode(&mail.body),
        encode(&attachment.to_string_lossy()),
    );

    Url::parse(&url).map_err(|e| DiagError::transport(format!("Invalid mailto URL: {}", e)))
}

/// Open the default mail client with a message referencing the exported file
pub fn compose_mail(attachment: &Path, mail: &MailSettings) -> Result<()> {
    let url = mailto_url(attachment, mail)?;
    log::debug!("Opening mail client: {}", url);

    webbrowser::open(url.as_str())
        .map_err(|e| DiagError::transport(format!("Could not open mail client: {}", e)))
}
