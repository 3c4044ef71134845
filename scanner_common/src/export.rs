//! CSV export of scan results.
//!
//! Output is UTF-8 text prefixed with a byte-order mark so spreadsheet tools detect the
//! encoding, with `\r\n` record terminators. Columns come from the first record only:
//! later records lose keys the first one lacks and render its missing keys as empty
//! cells.
use std::fs;
use std::io;
use std::path::Path;

use csv::{Terminator, WriterBuilder};
use log::{info, warn};

use crate::error::ScannerError;
use crate::record::ScanRecord;
use crate::result::Result;

/// UTF-8 byte-order mark.
pub const BOM: char = '\u{feff}';

/// Render `records` as BOM-prefixed CSV text. Empty input yields an empty string.
pub fn format_csv(records: &[ScanRecord]) -> Result<String> {
    let Some(first) = records.first() else {
        return Ok(String::new());
    };
    let header: Vec<&str> = first.keys().collect();

    let mut writer = WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());
    writer.write_record(&header)?;
    for record in records {
        let row = header
            .iter()
            .map(|key| record.get(key).map(ToString::to_string).unwrap_or_default());
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ScannerError::Io(e.into_error()))?;
    let body = String::from_utf8(bytes)
        .map_err(|e| ScannerError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;

    let mut text = String::with_capacity(body.len() + BOM.len_utf8());
    text.push(BOM);
    text.push_str(&body);
    Ok(text)
}

/// Write the CSV export of `records` to `path`. Nothing is written for an empty slice.
pub fn save_csv(records: &[ScanRecord], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if records.is_empty() {
        warn!("No records to save, skipping {}", path.display());
        return Ok(());
    }
    fs::write(path, format_csv(records)?)?;
    info!("Saved {} records to {}", records.len(), path.display());
    Ok(())
}

/// Download file name of the CSV export for a scan date.
pub fn export_file_name(date: &str) -> String {
    format!("stock_scan_{}.csv", date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_empty_text() {
        assert_eq!(format_csv(&[]).unwrap(), "");
    }

    #[test]
    fn header_follows_first_record_order() {
        let records = vec![ScanRecord::new().with("a", 1_i64).with("b", 2_i64)];
        assert_eq!(format_csv(&records).unwrap(), "\u{feff}a,b\r\n1,2\r\n");
    }

    #[test]
    fn later_records_are_projected_onto_first_header() {
        let records = vec![
            ScanRecord::new().with("code", "2330").with("close", 612.5),
            ScanRecord::new().with("close", 98.1).with("extra", true),
        ];
        assert_eq!(
            format_csv(&records).unwrap(),
            "\u{feff}code,close\r\n2330,612.5\r\n,98.1\r\n"
        );
    }

    #[test]
    fn quotes_cells_with_separators() {
        let records = vec![ScanRecord::new().with("name", "Foo, Inc.").with("ts", None::<i64>)];
        assert_eq!(
            format_csv(&records).unwrap(),
            "\u{feff}name,ts\r\n\"Foo, Inc.\",\r\n"
        );
    }

    #[test]
    fn save_writes_bom_prefixed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(export_file_name("2026-01-02"));
        let records = vec![ScanRecord::new().with("code", "2317")];

        save_csv(&records, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        assert_eq!(&bytes[3..], b"code\r\n2317\r\n");
    }

    #[test]
    fn save_skips_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        save_csv(&[], &path).unwrap();
        assert!(!path.exists());
    }
}
