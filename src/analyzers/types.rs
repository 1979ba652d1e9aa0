//! Row shapes returned by the aggregation operations.

use chrono::NaiveDate;
use serde::Serialize;

use crate::record::{DayOfWeek, Region};

/// Total ridership for one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub ridership: u64,
}

/// Total ridership for one `YYYY-MM` month key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyTotal {
    pub month: String,
    pub ridership: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionTotal {
    pub region: Region,
    pub ridership: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekdayTotal {
    pub day_of_week: DayOfWeek,
    pub ridership: u64,
}

/// Weekday total divided by the approximate number of weeks in range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayAverage {
    pub day_of_week: DayOfWeek,
    pub avg_ridership: f64,
}

/// One row of the top-N station ranking. `rank` starts at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationTotal {
    pub rank: usize,
    pub station: String,
    pub region: Region,
    pub ridership: u64,
}

/// Station total with its coordinates, for map views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationLocation {
    pub station: String,
    pub region: Region,
    pub latitude: f64,
    pub longitude: f64,
    pub ridership: u64,
}

/// Headline numbers shown above every view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyMetrics {
    pub total_ridership: u64,
    pub avg_daily_ridership: f64,
    pub active_stations: usize,
    pub peak_day: Option<DailyTotal>,
}

/// Values available to the date, region and station selectors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub regions: Vec<Region>,
    pub stations: Vec<String>,
}
