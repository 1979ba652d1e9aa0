//! Output formatting and persistence for reports and record sets.
//!
//! Supports JSON rendering of any report table and CSV export of records in
//! the same column layout the loader reads.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use tracing::info;

use crate::record::CanonicalRecord;

/// Writes `value` as JSON followed by a newline. `pretty` selects indented
/// output; compact output keeps one value per line.
pub fn write_json<W: Write>(mut writer: W, value: &impl Serialize, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut writer, value)?;
    } else {
        serde_json::to_writer(&mut writer, value)?;
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Serializes records as input-format CSV rows into `writer`.
pub fn write_records<W: Write>(writer: W, records: &[CanonicalRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);

    for record in records {
        writer.serialize(record.to_raw())?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes records to a CSV file at `path`, gzip-compressed when `gzip` is set.
///
/// Overwrites any existing file.
pub fn export_records(path: &str, records: &[CanonicalRecord], gzip: bool) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {path}"))?;

    if gzip {
        let mut encoder = GzEncoder::new(file, Compression::default());
        write_records(&mut encoder, records)?;
        encoder.finish()?;
    } else {
        write_records(file, records)?;
    }

    info!(path, records = records.len(), gzip, "Records exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_rows;
    use crate::record::Region;
    use chrono::{NaiveDate, NaiveTime};
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn records() -> Vec<CanonicalRecord> {
        vec![CanonicalRecord::new(
            "Union Sq-14 St",
            Region::Manhattan,
            Some((40.7359, -73.9911)),
            NaiveDate::from_ymd_opt(2022, 3, 4).unwrap(),
            NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            321,
        )]
    }

    #[test]
    fn test_write_json_compact_is_single_line() {
        let mut buf = Vec::new();
        write_json(&mut buf, &records(), false).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("\"month\":\"2022-03\""));
    }

    #[test]
    fn test_write_records_header_and_format() {
        let mut buf = Vec::new();
        write_records(&mut buf, &records()).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            "transit_timestamp,station_complex,borough,latitude,longitude,ridership"
        );
        assert_eq!(
            lines[1],
            "03/04/2022 07:00:00 AM,Union Sq-14 St,Manhattan,40.7359,-73.9911,321"
        );
    }

    #[test]
    fn test_export_records_gzip_is_readable() {
        let path = temp_path("subway_ridership_test_export.csv.gz");
        let _ = fs::remove_file(&path);

        export_records(&path, &records(), true).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
        let rows = parse_rows(&bytes).unwrap();
        assert_eq!(rows.len(), 1);

        fs::remove_file(&path).unwrap();
    }
}
