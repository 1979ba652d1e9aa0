//! CSV decoder for the hourly ridership export.

use anyhow::Result;
use flate2::read::GzDecoder;
use std::io::Read;
use tracing::debug;

use crate::normalize::RejectReason;
use crate::record::RawRecord;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Decompresses `bytes` if they carry the gzip magic number, otherwise
/// returns them unchanged.
pub fn maybe_decompress(bytes: &[u8]) -> Result<Vec<u8>> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes.to_vec());
    }
    let mut out = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut out)?;
    debug!(compressed = bytes.len(), decompressed = out.len(), "Input was gzip compressed");
    Ok(out)
}

/// Decodes CSV (optionally gzip-compressed) into raw rows.
///
/// Columns are matched by header name and unknown columns are ignored. A row
/// the decoder cannot map onto [`RawRecord`] becomes
/// `Err(RejectReason::Malformed)` so the caller can tally it.
///
/// # Errors
///
/// Returns an error if decompression fails or the header row is unreadable.
pub fn parse_rows(bytes: &[u8]) -> Result<Vec<Result<RawRecord, RejectReason>>> {
    let bytes = maybe_decompress(bytes)?;
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes.as_slice());

    let headers = rdr.headers()?.clone();
    debug!(columns = ?headers, "CSV header read");

    let rows = rdr
        .deserialize::<RawRecord>()
        .enumerate()
        .map(|(i, result)| {
            result.map_err(|e| {
                debug!(row = i + 1, error = %e, "Row could not be decoded");
                RejectReason::Malformed
            })
        })
        .collect();

    Ok(rows)
}
