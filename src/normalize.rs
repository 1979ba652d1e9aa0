//! Record normalizer: raw export rows into [`CanonicalRecord`]s.
//!
//! Normalization never fails as a whole. Rows that cannot be turned into a
//! canonical record are dropped and counted in a [`RejectionTally`] keyed by
//! [`RejectReason`].

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::record::{CanonicalRecord, DayOfWeek, RawRecord, Region};

const DATE_FORMAT: &str = "%m/%d/%Y";
const TIME_FORMAT: &str = "%I:%M:%S %p";

/// Largest count a single row may carry. Sums of `u32`-sized counts stay
/// within `u64` for any table that fits in memory.
pub const MAX_RIDERSHIP: u64 = u32::MAX as u64;

/// Why a `transit_timestamp` value could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("expected `<date> <time> <AM|PM>`, found {0} token(s)")]
    TokenCount(usize),
    #[error("invalid date token '{0}', expected MM/DD/YYYY")]
    Date(String),
    #[error("invalid time token '{0}', expected HH:MM:SS")]
    Time(String),
    #[error("invalid meridiem token '{0}', expected AM or PM")]
    Meridiem(String),
}

/// Why a raw row was left out of the canonical set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum RejectReason {
    #[error("row could not be decoded")]
    Malformed,
    #[error("required field missing")]
    MissingField,
    #[error("unparsable timestamp")]
    UnparsableTimestamp,
    #[error("unknown region code")]
    UnknownRegion,
    #[error("invalid ridership value")]
    InvalidRidership,
}

/// Per-reason count of rejected rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RejectionTally {
    pub malformed: usize,
    pub missing_field: usize,
    pub unparsable_timestamp: usize,
    pub unknown_region: usize,
    pub invalid_ridership: usize,
}

impl RejectionTally {
    pub fn record(&mut self, reason: RejectReason) {
        match reason {
            RejectReason::Malformed => self.malformed += 1,
            RejectReason::MissingField => self.missing_field += 1,
            RejectReason::UnparsableTimestamp => self.unparsable_timestamp += 1,
            RejectReason::UnknownRegion => self.unknown_region += 1,
            RejectReason::InvalidRidership => self.invalid_ridership += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.malformed
            + self.missing_field
            + self.unparsable_timestamp
            + self.unknown_region
            + self.invalid_ridership
    }
}

/// Output of [`normalize`]: the surviving records and what was dropped.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub records: Vec<CanonicalRecord>,
    pub rejections: RejectionTally,
}

/// Maps a borough code to its region. Abbreviations and full names resolve
/// to the same value; anything else is `None`.
pub fn normalize_region(code: &str) -> Option<Region> {
    Region::from_code(code)
}

/// Decodes `MM/DD/YYYY HH:MM:SS AM|PM` into a date and a time of day.
///
/// The grammar is exactly three whitespace-separated tokens; date, time and
/// meridiem must each parse or the whole timestamp is rejected.
pub fn parse_timestamp(raw: &str) -> Result<(NaiveDate, NaiveTime), TimestampError> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let [date_token, time_token, meridiem] = tokens[..] else {
        return Err(TimestampError::TokenCount(tokens.len()));
    };

    let date = NaiveDate::parse_from_str(date_token, DATE_FORMAT)
        .map_err(|_| TimestampError::Date(date_token.to_string()))?;

    if !(meridiem.eq_ignore_ascii_case("AM") || meridiem.eq_ignore_ascii_case("PM")) {
        return Err(TimestampError::Meridiem(meridiem.to_string()));
    }

    let time = NaiveTime::parse_from_str(&format!("{time_token} {meridiem}"), TIME_FORMAT)
        .map_err(|_| TimestampError::Time(time_token.to_string()))?;

    Ok((date, time))
}

/// Month key (`YYYY-MM`) and weekday of `date`.
pub fn derive_calendar_fields(date: NaiveDate) -> (String, DayOfWeek) {
    (date.format("%Y-%m").to_string(), DayOfWeek::of(date))
}

/// Accepts plain digits, optionally followed by a zero fraction (some
/// exports write counts as `123.0`). Counts above [`MAX_RIDERSHIP`] are
/// rejected.
fn parse_ridership(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let digits = match raw.split_once('.') {
        Some((whole, fraction)) if !fraction.is_empty() && fraction.bytes().all(|b| b == b'0') => {
            whole
        }
        Some(_) => return None,
        None => raw,
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u64>().ok().filter(|count| *count <= MAX_RIDERSHIP)
}

fn required(field: &Option<String>) -> Result<&str, RejectReason> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(RejectReason::MissingField)
}

/// Converts one raw row, or reports why it cannot be converted.
pub fn normalize_record(raw: &RawRecord) -> Result<CanonicalRecord, RejectReason> {
    let timestamp = required(&raw.transit_timestamp)?;
    let station = required(&raw.station_complex)?;
    let borough = required(&raw.borough)?;
    let ridership = required(&raw.ridership)?;

    let (date, time_of_day) = parse_timestamp(timestamp).map_err(|e| {
        debug!(timestamp, error = %e, "Rejecting row with bad timestamp");
        RejectReason::UnparsableTimestamp
    })?;
    let region = normalize_region(borough).ok_or_else(|| {
        debug!(borough, "Rejecting row with unknown region code");
        RejectReason::UnknownRegion
    })?;
    let ridership = parse_ridership(ridership).ok_or(RejectReason::InvalidRidership)?;

    Ok(
        CanonicalRecord::new(station, region, None, date, time_of_day, ridership)
            .with_position(raw.latitude, raw.longitude),
    )
}

/// Normalizes a batch of rows, dropping and tallying the bad ones. Rows the
/// decoder already failed on arrive as `Err` and are tallied as malformed.
#[tracing::instrument(skip_all)]
pub fn normalize<I>(rows: I) -> Normalized
where
    I: IntoIterator<Item = Result<RawRecord, RejectReason>>,
{
    let mut out = Normalized::default();

    for row in rows {
        match row.and_then(|raw| normalize_record(&raw)) {
            Ok(record) => out.records.push(record),
            Err(reason) => out.rejections.record(reason),
        }
    }

    let rejected = out.rejections.total();
    if rejected > 0 {
        warn!(
            kept = out.records.len(),
            rejected,
            malformed = out.rejections.malformed,
            missing_field = out.rejections.missing_field,
            unparsable_timestamp = out.rejections.unparsable_timestamp,
            unknown_region = out.rejections.unknown_region,
            invalid_ridership = out.rejections.invalid_ridership,
            "Rows rejected during normalization"
        );
    } else {
        info!(kept = out.records.len(), "Normalization complete");
    }

    out
}
