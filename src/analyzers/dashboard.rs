//! One-shot bundle of every dashboard table for a given filter.

use crate::analyzers::aggregate::{
    by_region_totals, by_weekday_average, by_weekday_totals, daily_totals, key_metrics,
    monthly_totals, station_locations, top_stations,
};
use crate::analyzers::types::{
    DailyTotal, KeyMetrics, MonthlyTotal, RegionTotal, StationLocation, StationTotal,
    WeekdayAverage, WeekdayTotal,
};
use crate::filter::{QueryError, RecordFilter, total_days};
use crate::normalize::RejectionTally;
use crate::source::{DatasetOrigin, LoadedDataset};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Length of the ranked station table.
pub const DEFAULT_TOP_N: usize = 20;

/// Everything the presentation layer renders for one filter selection.
#[derive(Debug, Serialize)]
pub struct DashboardReport {
    pub schema_version: u8,
    pub generated_at: DateTime<Utc>,
    pub filter: RecordFilter,
    pub origin: DatasetOrigin,
    pub notice: Option<String>,
    pub rejections: RejectionTally,
    pub matched_records: usize,
    pub metrics: KeyMetrics,
    pub daily: Vec<DailyTotal>,
    pub monthly: Vec<MonthlyTotal>,
    pub regions: Vec<RegionTotal>,
    pub weekday_totals: Vec<WeekdayTotal>,
    pub weekday_averages: Vec<WeekdayAverage>,
    pub top_stations: Vec<StationTotal>,
    pub station_locations: Vec<StationLocation>,
}

/// Filters `dataset` and runs every aggregation over the result.
///
/// # Errors
///
/// Returns [`QueryError::InvalidTopN`] when `top_n` is zero.
#[tracing::instrument(skip(dataset), fields(records = dataset.records.len()))]
pub fn build_report(
    dataset: &LoadedDataset,
    filter: &RecordFilter,
    top_n: usize,
) -> Result<DashboardReport, QueryError> {
    let view = filter.apply(&dataset.records);
    let days = total_days(filter.start, filter.end);

    Ok(DashboardReport {
        schema_version: 1,
        generated_at: Utc::now(),
        filter: filter.clone(),
        origin: dataset.origin.clone(),
        notice: dataset.notice(),
        rejections: dataset.rejections,
        matched_records: view.len(),
        metrics: key_metrics(&view),
        daily: daily_totals(&view),
        monthly: monthly_totals(&view),
        regions: by_region_totals(&view),
        weekday_totals: by_weekday_totals(&view),
        weekday_averages: by_weekday_average(&view, days),
        top_stations: top_stations(&view, top_n)?,
        station_locations: station_locations(&view),
    })
}
