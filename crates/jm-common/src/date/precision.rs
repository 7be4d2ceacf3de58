use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

/// Resolution of a parsed date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePrecision {
    /// YYYY-MM-DD
    Day,
    /// YYYY-MM, MM/YYYY (first day of the month)
    Month,
    /// YYYY (January 1st)
    Year,
    /// "present" / "current" resolved to the reference date
    Present,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub date: NaiveDate,
    pub precision: DatePrecision,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    #[error("date is empty")]
    Empty,
    #[error("unrecognised date format: {0}")]
    Format(String),
    #[error("date out of range: {0}")]
    OutOfRange(String),
}

lazy_static! {
    static ref DAY_RE: Regex =
        Regex::new(r"^(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})$").expect("day regex");
    static ref MONTH_RE: Regex = Regex::new(r"^(\d{4})[-/.](\d{1,2})$").expect("month regex");
    static ref MONTH_FIRST_RE: Regex =
        Regex::new(r"^(\d{1,2})[-/.](\d{4})$").expect("month-first regex");
    static ref YEAR_RE: Regex = Regex::new(r"^(\d{4})$").expect("year regex");
}

fn is_present_marker(raw: &str) -> bool {
    matches!(
        raw.to_ascii_lowercase().as_str(),
        "present" | "current" | "now" | "ongoing" | "today"
    )
}

fn capture_num<T: std::str::FromStr>(caps: &regex::Captures<'_>, idx: usize) -> Option<T> {
    caps.get(idx)?.as_str().parse().ok()
}

fn ymd(raw: &str, year: i32, month: u32, day: u32) -> Result<NaiveDate, DateParseError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| DateParseError::OutOfRange(raw.to_string()))
}

/// Parses a date as it appears in experience records.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM`, `MM/YYYY`, `YYYY` and the markers
/// `present`/`current`, which resolve to `today`.
pub fn parse_record_date(raw: &str, today: NaiveDate) -> Result<ParsedDate, DateParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DateParseError::Empty);
    }

    if is_present_marker(trimmed) {
        return Ok(ParsedDate {
            date: today,
            precision: DatePrecision::Present,
        });
    }

    let format_err = || DateParseError::Format(trimmed.to_string());

    if let Some(caps) = DAY_RE.captures(trimmed) {
        let year = capture_num(&caps, 1).ok_or_else(format_err)?;
        let month = capture_num(&caps, 2).ok_or_else(format_err)?;
        let day = capture_num(&caps, 3).ok_or_else(format_err)?;
        return Ok(ParsedDate {
            date: ymd(trimmed, year, month, day)?,
            precision: DatePrecision::Day,
        });
    }

    let month_caps = MONTH_RE
        .captures(trimmed)
        .map(|caps| (capture_num::<i32>(&caps, 1), capture_num::<u32>(&caps, 2)))
        .or_else(|| {
            MONTH_FIRST_RE
                .captures(trimmed)
                .map(|caps| (capture_num::<i32>(&caps, 2), capture_num::<u32>(&caps, 1)))
        });
    if let Some((year, month)) = month_caps {
        let year = year.ok_or_else(format_err)?;
        let month = month.ok_or_else(format_err)?;
        return Ok(ParsedDate {
            date: ymd(trimmed, year, month, 1)?,
            precision: DatePrecision::Month,
        });
    }

    if let Some(caps) = YEAR_RE.captures(trimmed) {
        let year = capture_num(&caps, 1).ok_or_else(format_err)?;
        return Ok(ParsedDate {
            date: ymd(trimmed, year, 1, 1)?,
            precision: DatePrecision::Year,
        });
    }

    Err(format_err())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn parses_supported_formats() {
        let day = parse_record_date("2020-03-15", today()).unwrap();
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2020, 3, 15).unwrap());
        assert_eq!(day.precision, DatePrecision::Day);

        let month = parse_record_date("2019-07", today()).unwrap();
        assert_eq!(month.date, NaiveDate::from_ymd_opt(2019, 7, 1).unwrap());
        assert_eq!(month.precision, DatePrecision::Month);

        let month_first = parse_record_date("07/2019", today()).unwrap();
        assert_eq!(month_first.date, month.date);

        let year = parse_record_date(" 2018 ", today()).unwrap();
        assert_eq!(year.date, NaiveDate::from_ymd_opt(2018, 1, 1).unwrap());
        assert_eq!(year.precision, DatePrecision::Year);
    }

    #[test]
    fn present_resolves_to_reference_date() {
        let parsed = parse_record_date("Present", today()).unwrap();
        assert_eq!(parsed.date, today());
        assert_eq!(parsed.precision, DatePrecision::Present);
    }

    #[test]
    fn rejects_garbage_and_impossible_dates() {
        assert_eq!(parse_record_date("", today()), Err(DateParseError::Empty));
        assert!(matches!(
            parse_record_date("last spring", today()),
            Err(DateParseError::Format(_))
        ));
        assert!(matches!(
            parse_record_date("2020-13", today()),
            Err(DateParseError::OutOfRange(_))
        ));
        assert!(matches!(
            parse_record_date("2021-02-30", today()),
            Err(DateParseError::OutOfRange(_))
        ));
    }
}
