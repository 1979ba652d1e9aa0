//! Filter engine: date range, region and station predicates over records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{CanonicalRecord, Region};

/// Selector value meaning "no restriction" on a dimension.
pub const ALL_SELECTOR: &str = "All";

/// Caller contract violations when building queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("top-N requires n >= 1")]
    InvalidTopN,
    #[error("unknown region selector '{0}'")]
    UnknownRegion(String),
    #[error("no date range given and the dataset is empty")]
    MissingDateRange,
}

/// Conjunction of a date range and optional region/station equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub start: NaiveDate,
    /// Inclusive.
    pub end: NaiveDate,
    pub region: Option<Region>,
    pub station: Option<String>,
}

impl RecordFilter {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        RecordFilter {
            start,
            end,
            region: None,
            station: None,
        }
    }

    pub fn with_region(mut self, region: Option<Region>) -> Self {
        self.region = region;
        self
    }

    pub fn with_station(mut self, station: Option<String>) -> Self {
        self.station = station;
        self
    }

    pub fn matches(&self, record: &CanonicalRecord) -> bool {
        self.start <= record.date()
            && record.date() <= self.end
            && self.region.is_none_or(|region| record.region() == region)
            && self
                .station
                .as_deref()
                .is_none_or(|station| record.station_name() == station)
    }

    /// Keeps the matching records, in input order. The result borrows the
    /// input, so it can be filtered again or passed to any aggregation.
    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a CanonicalRecord>
    where
        I: IntoIterator<Item = &'a CanonicalRecord>,
    {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// A filter selection as the presentation layer submits it: loose strings
/// and optional dates, resolved against the dataset's date bounds.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FilterRequest {
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub station: Option<String>,
    #[serde(default)]
    pub top: Option<usize>,
}

impl FilterRequest {
    /// Builds a [`RecordFilter`]; missing dates default to `bounds`.
    pub fn resolve(&self, bounds: Option<(NaiveDate, NaiveDate)>) -> Result<RecordFilter, QueryError> {
        let start = self.start.or(bounds.map(|(min, _)| min));
        let end = self.end.or(bounds.map(|(_, max)| max));
        let (Some(start), Some(end)) = (start, end) else {
            return Err(QueryError::MissingDateRange);
        };

        Ok(RecordFilter::new(start, end)
            .with_region(parse_region_selector(self.region.as_deref())?)
            .with_station(parse_selector(self.station.as_deref()).map(str::to_string)))
    }
}

/// Number of calendar days in `start..=end`; zero when the range is inverted.
pub fn total_days(start: NaiveDate, end: NaiveDate) -> u64 {
    u64::try_from((end - start).num_days() + 1).unwrap_or(0)
}

/// Treats a missing, blank or `All` selector as "no restriction".
pub fn parse_selector(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(ALL_SELECTOR))
}

/// Like [`parse_selector`], resolving the value as a region code or name.
pub fn parse_region_selector(value: Option<&str>) -> Result<Option<Region>, QueryError> {
    parse_selector(value)
        .map(|code| Region::from_code(code).ok_or_else(|| QueryError::UnknownRegion(code.to_string())))
        .transpose()
}
