use chrono::NaiveDate;
use thiserror::Error;

use super::precision::{parse_record_date, DateParseError};

const DAYS_PER_YEAR: f64 = 365.25;

/// Half-open `[start, end)` interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days().max(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateRangeError {
    #[error("missing start date")]
    MissingStart,
    #[error("invalid start date: {0}")]
    Start(#[source] DateParseError),
    #[error("invalid end date: {0}")]
    End(#[source] DateParseError),
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

/// Resolves raw start/end strings into a range. A missing end means the
/// position is ongoing and ends at `today`; a start in the future yields an
/// empty range at `today`.
pub fn resolve_range(
    start: Option<&str>,
    end: Option<&str>,
    today: NaiveDate,
) -> Result<DateRange, DateRangeError> {
    let start_raw = start
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(DateRangeError::MissingStart)?;
    let start = parse_record_date(start_raw, today)
        .map_err(DateRangeError::Start)?
        .date;

    let end = match end.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse_record_date(raw, today).map_err(DateRangeError::End)?.date,
        None => today,
    };

    if end < start {
        if end == today {
            return Ok(DateRange { start: today, end: today });
        }
        return Err(DateRangeError::EndBeforeStart { start, end });
    }

    Ok(DateRange { start, end })
}

/// Merges overlapping or touching ranges. Output is sorted by start.
pub fn merge_ranges(mut ranges: Vec<DateRange>) -> Vec<DateRange> {
    ranges.sort();
    let mut merged: Vec<DateRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => {
                last.end = last.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// Length of the union of `ranges`, in years.
pub fn total_years(ranges: &[DateRange]) -> f64 {
    let days: i64 = merge_ranges(ranges.to_vec())
        .iter()
        .map(DateRange::days)
        .sum();
    days as f64 / DAYS_PER_YEAR
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn open_end_uses_reference_date() {
        let today = d(2024, 1, 1);
        let range = resolve_range(Some("2020-01"), None, today).unwrap();
        assert_eq!(range, DateRange { start: d(2020, 1, 1), end: today });

        let present = resolve_range(Some("2020-01"), Some("present"), today).unwrap();
        assert_eq!(present, range);
    }

    #[test]
    fn rejects_inverted_and_unparseable_ranges() {
        let today = d(2024, 1, 1);
        assert!(matches!(
            resolve_range(Some("2022-01"), Some("2020-01"), today),
            Err(DateRangeError::EndBeforeStart { .. })
        ));
        assert_eq!(
            resolve_range(None, Some("2020-01"), today),
            Err(DateRangeError::MissingStart)
        );
        assert!(matches!(
            resolve_range(Some("soon"), None, today),
            Err(DateRangeError::Start(_))
        ));
        assert!(matches!(
            resolve_range(Some("2020"), Some("whenever"), today),
            Err(DateRangeError::End(_))
        ));
    }

    #[test]
    fn future_start_is_empty_not_invalid() {
        let today = d(2024, 1, 1);
        let range = resolve_range(Some("2025-01"), None, today).unwrap();
        assert_eq!(range.days(), 0);
    }

    #[test]
    fn overlapping_ranges_are_counted_once() {
        let ranges = vec![
            DateRange { start: d(2018, 1, 1), end: d(2020, 1, 1) },
            DateRange { start: d(2019, 1, 1), end: d(2021, 1, 1) },
            DateRange { start: d(2022, 1, 1), end: d(2023, 1, 1) },
        ];
        let merged = merge_ranges(ranges.clone());
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], DateRange { start: d(2018, 1, 1), end: d(2021, 1, 1) });

        let years = total_years(&ranges);
        assert!((years - 4.0).abs() < 0.01, "years = {years}");
    }

    #[test]
    fn empty_history_is_zero_years() {
        assert_eq!(total_years(&[]), 0.0);
    }
}
