use hdiag::core::diagnostics::{HealthEntry, HealthState, Report, Subsystem};
use hdiag::core::export::{export, export_as, ExportFormat, HEADERS};
use hdiag::platform::Platform;
use hdiag::ExportError;
use tempfile::TempDir;

fn sample_report() -> Report {
    Report::from_entries(
        Platform::Linux,
        vec![
            HealthEntry::new(Subsystem::Cpu, HealthState::Good, "Temperature: 52°C"),
            HealthEntry::new(Subsystem::Memory, HealthState::Warning, "High usage: 95%")
                .with_remediation(Some(
                    "Check for resource-intensive applications or processes.".to_string(),
                )),
            HealthEntry::new(
                Subsystem::Storage,
                HealthState::Good,
                "Usage on /mnt/data, backup: 12%",
            ),
            HealthEntry::new(
                Subsystem::Drivers,
                HealthState::Error,
                "Unable to check Drivers health: \"apt\" exited with code 100",
            ),
        ],
    )
}

#[test]
fn test_csv_has_header_and_one_row_per_entry() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.csv");
    let report = sample_report();

    export(&report, &path).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), HEADERS.to_vec());

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), report.len());

    assert_eq!(&rows[1][0], "Memory");
    assert_eq!(&rows[1][1], "Warning");
    assert_eq!(&rows[1][2], "High usage: 95%");
    assert_eq!(
        &rows[1][3],
        "Check for resource-intensive applications or processes."
    );

    // Commas and quotes survive the round trip
    assert_eq!(&rows[2][2], "Usage on /mnt/data, backup: 12%");
    assert!(rows[3][2].contains("\"apt\""));
    assert_eq!(&rows[0][3], "");
}

#[test]
fn test_empty_report_exports_headers_only() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.csv");

    export(&Report::from_entries(Platform::Linux, vec![]), &path).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 1);
    assert!(contents.starts_with("Component,Health Status,Details,Potential Solutions"));
}

#[test]
fn test_json_export() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.json");
    let report = sample_report();

    export(&report, &path).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let rows = value.as_array().unwrap();
    assert_eq!(rows.len(), report.len());
    assert_eq!(rows[0]["Component"], "CPU");
    assert_eq!(rows[1]["Health Status"], "Warning");
    assert_eq!(rows[0]["Potential Solutions"], "");
}

#[test]
fn test_forced_format_ignores_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.txt");

    export_as(&sample_report(), &path, ExportFormat::Json).unwrap();
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.trim_start().starts_with('['));
}

#[test]
fn test_unwritable_destination() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("report.csv");

    let err = export(&sample_report(), &path).unwrap_err();
    match err {
        ExportError::Destination { path: failed, .. } => assert_eq!(failed, path),
        other => panic!("expected a destination error, got {:?}", other),
    }
}

#[test]
fn test_export_does_not_touch_report() {
    let dir = TempDir::new().unwrap();
    let report = sample_report();
    let before = report.clone();

    export(&report, &dir.path().join("a.csv")).unwrap();
    export(&report, &dir.path().join("b.json")).unwrap();
    assert_eq!(report, before);
}

#[test]
fn test_pdf_export() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.pdf");

    export(&sample_report(), &path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    let contains = |needle: &[u8]| bytes.windows(needle.len()).any(|w| w == needle);
    assert!(contains(b"(Potential Solutions)"));
    assert!(contains(b"(High usage: 95%)"));
    // Degree sign is carried in the standard font encoding
    assert!(contains(b"(Temperature: 52\xB0C)"));

    let document = lopdf::Document::load(&path).unwrap();
    assert_eq!(document.get_pages().len(), 1);
}

#[test]
fn test_long_pdf_report_spans_pages() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("long.pdf");
    let entries = (0..120)
        .map(|i| {
            HealthEntry::new(
                Subsystem::Storage,
                HealthState::Good,
                format!("Usage on /mnt/volume{}: {}%", i, i % 100),
            )
        })
        .collect();

    export(&Report::from_entries(Platform::Linux, entries), &path).unwrap();

    let document = lopdf::Document::load(&path).unwrap();
    assert!(document.get_pages().len() > 1);
}
