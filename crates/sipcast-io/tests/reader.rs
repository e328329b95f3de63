//! File-level tests for the sales reader and upload screening.

use std::path::{Path, PathBuf};

use sipcast_io::{IoError, SalesReader, SalesRecord, ensure_tabular};

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn fixture_round_trip() {
    let path = fixture_path("mixed_headers.csv");
    ensure_tabular(&path).expect("fixture is a csv");

    let records = SalesReader::new(&path).read().expect("fixture should parse");
    assert_eq!(records.len(), 5);
    assert_eq!(records[0], SalesRecord::new(Some(31.5), "Sunny", "Cola"));
    assert_eq!(records[1], SalesRecord::new(None, "Rainy", "Hot Coffee"));
    assert_eq!(
        records.iter().filter(|r| r.temperature.is_none()).count(),
        1
    );
}

#[test]
fn errors_name_the_source() {
    let path = Path::new("upload/sales.csv");
    let err = SalesReader::new(path)
        .read_str("temperature,weather,product\nhot,Sunny,Cola\n")
        .unwrap_err();
    assert!(matches!(err, IoError::InvalidTemperature { row_index: 0, .. }));
    let message = err.to_string();
    assert!(message.contains("upload/sales.csv"), "{message}");
}

#[test]
fn non_csv_upload_rejected_before_reading() {
    let err = ensure_tabular(Path::new("upload/sales.pdf")).unwrap_err();
    assert!(err.to_string().contains("pdf"));
}
