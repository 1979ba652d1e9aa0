//! Record shapes flowing through the ridership pipeline.
//!
//! [`RawRecord`] mirrors one row of the hourly ridership export as-is.
//! [`CanonicalRecord`] is the validated, immutable unit every downstream
//! stage (filter, aggregation, presentation) works with.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single row of the input table, before any validation.
///
/// Every field is optional: the export is not guaranteed to be uniform and
/// unknown extra columns are ignored by the decoder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub transit_timestamp: Option<String>,
    #[serde(default)]
    pub station_complex: Option<String>,
    #[serde(default)]
    pub borough: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub ridership: Option<String>,
}

/// NYC borough served by the subway records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    Manhattan,
    Brooklyn,
    Bronx,
    Queens,
}

impl Region {
    pub const ALL: [Region; 4] = [
        Region::Manhattan,
        Region::Brooklyn,
        Region::Bronx,
        Region::Queens,
    ];

    /// Resolves an abbreviation (`BK`, `M`, `BX`, `Q`) or an already
    /// spelled-out name to a region. Matching ignores surrounding
    /// whitespace and ASCII case.
    pub fn from_code(code: &str) -> Option<Region> {
        let code = code.trim();
        Region::ALL.into_iter().find(|region| {
            code.eq_ignore_ascii_case(region.abbreviation())
                || code.eq_ignore_ascii_case(region.name())
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Region::Manhattan => "Manhattan",
            Region::Brooklyn => "Brooklyn",
            Region::Bronx => "Bronx",
            Region::Queens => "Queens",
        }
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            Region::Manhattan => "M",
            Region::Brooklyn => "BK",
            Region::Bronx => "BX",
            Region::Queens => "Q",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Day of the week, ordered Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// Canonical Monday→Sunday ordering used by every weekday table.
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn of(date: NaiveDate) -> Self {
        date.weekday().into()
    }

    pub fn name(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }

    pub fn is_weekend(self) -> bool {
        matches!(self, DayOfWeek::Saturday | DayOfWeek::Sunday)
    }

    /// Zero-based position in [`DayOfWeek::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        DayOfWeek::ALL[weekday.num_days_from_monday() as usize]
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated ridership observation.
///
/// Built only through [`CanonicalRecord::new`], which derives `month` and
/// `day_of_week` from `date`, so the three can never disagree. Records are
/// immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    station_name: String,
    region: Region,
    latitude: Option<f64>,
    longitude: Option<f64>,
    date: NaiveDate,
    time_of_day: NaiveTime,
    month: String,
    day_of_week: DayOfWeek,
    ridership: u64,
}

impl CanonicalRecord {
    pub fn new(
        station_name: impl Into<String>,
        region: Region,
        coordinates: Option<(f64, f64)>,
        date: NaiveDate,
        time_of_day: NaiveTime,
        ridership: u64,
    ) -> Self {
        let (month, day_of_week) = crate::normalize::derive_calendar_fields(date);
        CanonicalRecord {
            station_name: station_name.into(),
            region,
            latitude: coordinates.map(|(lat, _)| lat),
            longitude: coordinates.map(|(_, lon)| lon),
            date,
            time_of_day,
            month,
            day_of_week,
            ridership,
        }
    }

    /// Replaces both coordinates. Either may be absent on its own.
    pub fn with_position(mut self, latitude: Option<f64>, longitude: Option<f64>) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }

    pub fn station_name(&self) -> &str {
        &self.station_name
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn latitude(&self) -> Option<f64> {
        self.latitude
    }

    pub fn longitude(&self) -> Option<f64> {
        self.longitude
    }

    /// Both coordinates, when the source carried them.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time_of_day(&self) -> NaiveTime {
        self.time_of_day
    }

    /// Month key, `YYYY-MM`.
    pub fn month(&self) -> &str {
        &self.month
    }

    pub fn day_of_week(&self) -> DayOfWeek {
        self.day_of_week
    }

    pub fn ridership(&self) -> u64 {
        self.ridership
    }

    /// Renders the record back into the input row shape, with the timestamp
    /// in `MM/DD/YYYY HH:MM:SS AM|PM` form and the full region name.
    pub fn to_raw(&self) -> RawRecord {
        RawRecord {
            transit_timestamp: Some(format!(
                "{} {}",
                self.date.format("%m/%d/%Y"),
                self.time_of_day.format("%I:%M:%S %p")
            )),
            station_complex: Some(self.station_name.clone()),
            borough: Some(self.region.name().to_string()),
            latitude: self.latitude,
            longitude: self.longitude,
            ridership: Some(self.ridership.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_from_code_abbreviations() {
        assert_eq!(Region::from_code("BK"), Some(Region::Brooklyn));
        assert_eq!(Region::from_code("M"), Some(Region::Manhattan));
        assert_eq!(Region::from_code("BX"), Some(Region::Bronx));
        assert_eq!(Region::from_code("Q"), Some(Region::Queens));
    }

    #[test]
    fn test_region_from_code_is_case_and_space_insensitive() {
        assert_eq!(Region::from_code(" bk "), Some(Region::Brooklyn));
        assert_eq!(Region::from_code("MANHATTAN"), Some(Region::Manhattan));
        assert_eq!(Region::from_code("Staten Island"), None);
        assert_eq!(Region::from_code(""), None);
    }

    #[test]
    fn test_day_of_week_from_chrono() {
        assert_eq!(DayOfWeek::from(Weekday::Mon), DayOfWeek::Monday);
        assert_eq!(DayOfWeek::from(Weekday::Sun), DayOfWeek::Sunday);
        assert_eq!(DayOfWeek::Sunday.index(), 6);
        assert!(DayOfWeek::Saturday.is_weekend());
        assert!(!DayOfWeek::Friday.is_weekend());
    }

    #[test]
    fn test_canonical_record_derives_calendar_fields() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let record = CanonicalRecord::new(
            "Fordham Rd",
            Region::Bronx,
            Some((40.8618, -73.8867)),
            date,
            NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            1200,
        );

        assert_eq!(record.month(), "2023-01");
        assert_eq!(record.day_of_week(), DayOfWeek::Monday);
        assert_eq!(record.coordinates(), Some((40.8618, -73.8867)));
    }

    #[test]
    fn test_to_raw_uses_twelve_hour_clock() {
        let record = CanonicalRecord::new(
            "Penn Station",
            Region::Manhattan,
            None,
            NaiveDate::from_ymd_opt(2022, 2, 1).unwrap(),
            NaiveTime::from_hms_opt(13, 5, 0).unwrap(),
            42,
        );
        let raw = record.to_raw();

        assert_eq!(raw.transit_timestamp.as_deref(), Some("02/01/2022 01:05:00 PM"));
        assert_eq!(raw.borough.as_deref(), Some("Manhattan"));
        assert_eq!(raw.ridership.as_deref(), Some("42"));
        assert_eq!(raw.latitude, None);
    }
}
