use crate::analyzers::types::{
    DailyTotal, FilterOptions, KeyMetrics, MonthlyTotal, RegionTotal, StationLocation,
    StationTotal, WeekdayAverage, WeekdayTotal,
};
use crate::analyzers::utility::mean;
use crate::filter::QueryError;
use crate::record::{CanonicalRecord, DayOfWeek, Region};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Sum of ridership over every record.
pub fn total_ridership(records: &[&CanonicalRecord]) -> u64 {
    records.iter().map(|r| r.ridership()).sum()
}

/// Per-date totals, ascending by date.
pub fn daily_totals(records: &[&CanonicalRecord]) -> Vec<DailyTotal> {
    let mut by_date: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for record in records {
        *by_date.entry(record.date()).or_default() += record.ridership();
    }

    by_date
        .into_iter()
        .map(|(date, ridership)| DailyTotal { date, ridership })
        .collect()
}

/// Per-month totals, ascending by month key.
pub fn monthly_totals(records: &[&CanonicalRecord]) -> Vec<MonthlyTotal> {
    let mut by_month: BTreeMap<&str, u64> = BTreeMap::new();
    for record in records {
        *by_month.entry(record.month()).or_default() += record.ridership();
    }

    by_month
        .into_iter()
        .map(|(month, ridership)| MonthlyTotal {
            month: month.to_string(),
            ridership,
        })
        .collect()
}

/// Mean of the per-date totals. Rows are grouped by date first, so several
/// stations on one day count as a single day. Returns 0.0 for empty input.
pub fn avg_daily_ridership(records: &[&CanonicalRecord]) -> f64 {
    let per_day: Vec<f64> = daily_totals(records)
        .iter()
        .map(|d| d.ridership as f64)
        .collect();
    mean(&per_day)
}

/// Number of distinct station names.
pub fn active_station_count(records: &[&CanonicalRecord]) -> usize {
    records
        .iter()
        .map(|r| r.station_name())
        .collect::<HashSet<_>>()
        .len()
}

/// Date with the highest daily total; the earliest such date on ties.
/// `None` when there are no records.
pub fn peak_day(records: &[&CanonicalRecord]) -> Option<DailyTotal> {
    daily_totals(records)
        .into_iter()
        .reduce(|best, day| if day.ridership > best.ridership { day } else { best })
}

/// Per-region totals, descending by total, then by region name.
pub fn by_region_totals(records: &[&CanonicalRecord]) -> Vec<RegionTotal> {
    let mut by_region: HashMap<Region, u64> = HashMap::new();
    for record in records {
        *by_region.entry(record.region()).or_default() += record.ridership();
    }

    let mut totals: Vec<RegionTotal> = by_region
        .into_iter()
        .map(|(region, ridership)| RegionTotal { region, ridership })
        .collect();
    totals.sort_by(|a, b| {
        b.ridership
            .cmp(&a.ridership)
            .then_with(|| a.region.name().cmp(b.region.name()))
    });
    totals
}

/// Exactly seven rows, Monday through Sunday, zero-filled.
pub fn by_weekday_totals(records: &[&CanonicalRecord]) -> Vec<WeekdayTotal> {
    let mut sums = [0u64; 7];
    for record in records {
        sums[record.day_of_week().index()] += record.ridership();
    }

    DayOfWeek::ALL
        .into_iter()
        .map(|day_of_week| WeekdayTotal {
            day_of_week,
            ridership: sums[day_of_week.index()],
        })
        .collect()
}

/// Weekday totals divided by `max(1, total_days / 7)`.
///
/// The divisor approximates how often each weekday occurs in the range; it
/// is exact only when `total_days` is a multiple of seven. See
/// [`weekday_occurrences`] for the exact counts.
pub fn by_weekday_average(records: &[&CanonicalRecord], total_days: u64) -> Vec<WeekdayAverage> {
    let weeks = (total_days / 7).max(1) as f64;

    by_weekday_totals(records)
        .into_iter()
        .map(|t| WeekdayAverage {
            day_of_week: t.day_of_week,
            avg_ridership: t.ridership as f64 / weeks,
        })
        .collect()
}

/// How many times each weekday (Monday first) falls within `start..=end`.
pub fn weekday_occurrences(start: NaiveDate, end: NaiveDate) -> [u64; 7] {
    let mut counts = [0u64; 7];
    for date in start.iter_days().take_while(|d| *d <= end) {
        counts[DayOfWeek::of(date).index()] += 1;
    }
    counts
}

/// The `n` busiest (station, region) pairs, descending by total with ties
/// broken by station name.
///
/// # Errors
///
/// Returns [`QueryError::InvalidTopN`] when `n` is zero.
pub fn top_stations(records: &[&CanonicalRecord], n: usize) -> Result<Vec<StationTotal>, QueryError> {
    if n == 0 {
        return Err(QueryError::InvalidTopN);
    }

    let mut by_station: HashMap<(&str, Region), u64> = HashMap::new();
    for record in records {
        *by_station
            .entry((record.station_name(), record.region()))
            .or_default() += record.ridership();
    }

    let mut ranked: Vec<((&str, Region), u64)> = by_station.into_iter().collect();
    ranked.sort_by(|((a_name, a_region), a_sum), ((b_name, b_region), b_sum)| {
        b_sum
            .cmp(a_sum)
            .then_with(|| a_name.cmp(b_name))
            .then_with(|| a_region.cmp(b_region))
    });

    Ok(ranked
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(i, ((station, region), ridership))| StationTotal {
            rank: i + 1,
            station: station.to_string(),
            region,
            ridership,
        })
        .collect())
}

/// Per-station totals with the first coordinates seen for that station.
/// Stations with no coordinates on any record are left out.
pub fn station_locations(records: &[&CanonicalRecord]) -> Vec<StationLocation> {
    let mut by_station: HashMap<(&str, Region), (Option<(f64, f64)>, u64)> = HashMap::new();
    for record in records {
        let entry = by_station
            .entry((record.station_name(), record.region()))
            .or_insert((None, 0));
        if entry.0.is_none() {
            entry.0 = record.coordinates();
        }
        entry.1 += record.ridership();
    }

    let mut locations: Vec<StationLocation> = by_station
        .into_iter()
        .filter_map(|((station, region), (coords, ridership))| {
            let (latitude, longitude) = coords?;
            Some(StationLocation {
                station: station.to_string(),
                region,
                latitude,
                longitude,
                ridership,
            })
        })
        .collect();
    locations.sort_by(|a, b| {
        b.ridership
            .cmp(&a.ridership)
            .then_with(|| a.station.cmp(&b.station))
    });
    locations
}

pub fn key_metrics(records: &[&CanonicalRecord]) -> KeyMetrics {
    KeyMetrics {
        total_ridership: total_ridership(records),
        avg_daily_ridership: avg_daily_ridership(records),
        active_stations: active_station_count(records),
        peak_day: peak_day(records),
    }
}

/// Selector values for the full dataset. Regions and stations keep their
/// first-appearance order; stations are limited to `region` when given.
pub fn filter_options(records: &[CanonicalRecord], region: Option<Region>) -> FilterOptions {
    let mut regions = Vec::new();
    let mut stations = Vec::new();
    let mut seen_stations = HashSet::new();

    for record in records {
        if !regions.contains(&record.region()) {
            regions.push(record.region());
        }
        if region.is_none_or(|r| r == record.region()) && seen_stations.insert(record.station_name()) {
            stations.push(record.station_name().to_string());
        }
    }

    FilterOptions {
        min_date: records.iter().map(|r| r.date()).min(),
        max_date: records.iter().map(|r| r.date()).max(),
        regions,
        stations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(station: &str, region: Region, date: NaiveDate, ridership: u64) -> CanonicalRecord {
        CanonicalRecord::new(station, region, Some((40.7, -73.9)), date, NaiveTime::MIN, ridership)
    }

    fn view(records: &[CanonicalRecord]) -> Vec<&CanonicalRecord> {
        records.iter().collect()
    }

    fn sample() -> Vec<CanonicalRecord> {
        vec![
            record("A", Region::Brooklyn, date(2023, 1, 2), 100),
            record("B", Region::Manhattan, date(2023, 1, 2), 50),
            record("A", Region::Brooklyn, date(2023, 1, 3), 70),
            record("C", Region::Queens, date(2023, 2, 5), 80),
        ]
    }

    #[test]
    fn test_two_record_scenario() {
        let records = vec![
            record("A", Region::Brooklyn, date(2023, 1, 2), 100),
            record("B", Region::Manhattan, date(2023, 1, 2), 50),
        ];
        let v = view(&records);

        assert_eq!(total_ridership(&v), 150);
        assert_eq!(
            by_region_totals(&v),
            vec![
                RegionTotal { region: Region::Brooklyn, ridership: 100 },
                RegionTotal { region: Region::Manhattan, ridership: 50 },
            ]
        );
        assert_eq!(
            peak_day(&v),
            Some(DailyTotal { date: date(2023, 1, 2), ridership: 150 })
        );
    }

    #[test]
    fn test_daily_totals_sum_to_total() {
        let records = sample();
        let v = view(&records);
        let daily = daily_totals(&v);

        assert_eq!(daily.len(), 3);
        assert!(daily.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(daily.iter().map(|d| d.ridership).sum::<u64>(), total_ridership(&v));
    }

    #[test]
    fn test_monthly_totals() {
        let records = sample();
        assert_eq!(
            monthly_totals(&view(&records)),
            vec![
                MonthlyTotal { month: "2023-01".to_string(), ridership: 220 },
                MonthlyTotal { month: "2023-02".to_string(), ridership: 80 },
            ]
        );
    }

    #[test]
    fn test_avg_daily_groups_by_date_first() {
        let records = sample();
        // day totals 150, 70, 80; a row mean would be 75
        assert_eq!(avg_daily_ridership(&view(&records)), 100.0);
    }

    #[test]
    fn test_active_station_count() {
        let records = sample();
        assert_eq!(active_station_count(&view(&records)), 3);
    }

    #[test]
    fn test_peak_day_tie_takes_earliest() {
        let records = vec![
            record("A", Region::Bronx, date(2023, 3, 2), 10),
            record("A", Region::Bronx, date(2023, 3, 1), 10),
        ];
        assert_eq!(peak_day(&view(&records)).unwrap().date, date(2023, 3, 1));
    }

    #[test]
    fn test_by_weekday_totals_fixed_order_zero_filled() {
        let records = sample();
        let totals = by_weekday_totals(&view(&records));

        assert_eq!(totals.len(), 7);
        let order: Vec<DayOfWeek> = totals.iter().map(|t| t.day_of_week).collect();
        assert_eq!(order, DayOfWeek::ALL.to_vec());
        // 2023-01-02 Monday, 2023-01-03 Tuesday, 2023-02-05 Sunday
        assert_eq!(totals[0].ridership, 150);
        assert_eq!(totals[1].ridership, 70);
        assert_eq!(totals[2].ridership, 0);
        assert_eq!(totals[6].ridership, 80);
    }

    #[test]
    fn test_by_weekday_average_approximation() {
        let records = sample();
        let v = view(&records);

        // 14 days -> divisor 2
        let avg = by_weekday_average(&v, 14);
        assert_eq!(avg[0].avg_ridership, 75.0);

        // under a week still divides by 1
        let avg = by_weekday_average(&v, 3);
        assert_eq!(avg[0].avg_ridership, 150.0);
    }

    #[test]
    fn test_weekday_average_divisor_differs_from_exact_counts() {
        // 2023-01-02 (Mon) ..= 2023-01-14 (Sat): 13 days, divisor 13 / 7 = 1,
        // yet Monday through Saturday each occur twice
        let counts = weekday_occurrences(date(2023, 1, 2), date(2023, 1, 14));
        assert_eq!(counts, [2, 2, 2, 2, 2, 2, 1]);
        assert_eq!(weekday_occurrences(date(2023, 1, 5), date(2023, 1, 1)), [0; 7]);
    }

    #[test]
    fn test_top_stations_order_and_truncation() {
        let records = vec![
            record("Zeta", Region::Queens, date(2023, 1, 2), 50),
            record("Alpha", Region::Bronx, date(2023, 1, 2), 50),
            record("Mid", Region::Manhattan, date(2023, 1, 2), 200),
            record("Low", Region::Brooklyn, date(2023, 1, 2), 1),
        ];
        let v = view(&records);

        let top = top_stations(&v, 3).unwrap();
        let names: Vec<&str> = top.iter().map(|s| s.station.as_str()).collect();
        assert_eq!(names, vec!["Mid", "Alpha", "Zeta"]);
        assert_eq!(top[0].rank, 1);
        assert_eq!(top[2].rank, 3);

        assert_eq!(top_stations(&v, 10).unwrap().len(), 4);
    }

    #[test]
    fn test_top_stations_rejects_zero() {
        let records = sample();
        assert_eq!(top_stations(&view(&records), 0), Err(QueryError::InvalidTopN));
    }

    #[test]
    fn test_station_locations_skip_missing_coordinates() {
        let records = vec![
            CanonicalRecord::new("NoGeo", Region::Queens, None, date(2023, 1, 2), NaiveTime::MIN, 9),
            record("A", Region::Brooklyn, date(2023, 1, 2), 5),
            record("A", Region::Brooklyn, date(2023, 1, 3), 6),
        ];
        let locations = station_locations(&view(&records));

        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].station, "A");
        assert_eq!(locations[0].ridership, 11);
    }

    #[test]
    fn test_empty_input_is_well_formed() {
        let v: Vec<&CanonicalRecord> = Vec::new();

        assert_eq!(total_ridership(&v), 0);
        assert!(daily_totals(&v).is_empty());
        assert!(monthly_totals(&v).is_empty());
        assert_eq!(avg_daily_ridership(&v), 0.0);
        assert_eq!(active_station_count(&v), 0);
        assert_eq!(peak_day(&v), None);
        assert!(by_region_totals(&v).is_empty());
        assert!(by_weekday_totals(&v).iter().all(|t| t.ridership == 0));
        assert!(top_stations(&v, 5).unwrap().is_empty());
        assert!(station_locations(&v).is_empty());
    }

    #[test]
    fn test_filter_options_restricts_stations_by_region() {
        let records = sample();

        let all = filter_options(&records, None);
        assert_eq!(all.min_date, Some(date(2023, 1, 2)));
        assert_eq!(all.max_date, Some(date(2023, 2, 5)));
        assert_eq!(all.regions, vec![Region::Brooklyn, Region::Manhattan, Region::Queens]);
        assert_eq!(all.stations, vec!["A", "B", "C"]);

        let brooklyn = filter_options(&records, Some(Region::Brooklyn));
        assert_eq!(brooklyn.stations, vec!["A"]);
    }
}
