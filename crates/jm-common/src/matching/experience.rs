use chrono::NaiveDate;
use serde::Serialize;
use strum::AsRefStr;

use super::{status_from_score, MatchStatus};
use crate::date::{resolve_range, total_years, DateRange};
use crate::taxonomy::ExperienceLevel;
use crate::{ExperienceRecord, ExperienceRequirement};

/// What the experience score was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExperienceBasis {
    Level,
    YearsRange,
    NoRequirement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExperienceEvaluation {
    pub score: f64,
    pub status: MatchStatus,
    pub basis: ExperienceBasis,
    pub candidate_years: f64,
    pub candidate_level: ExperienceLevel,
    pub required_level: Option<ExperienceLevel>,
    pub valid_records: usize,
    pub invalid_records: usize,
    pub details: String,
}

impl ExperienceEvaluation {
    /// No record produced a usable date range.
    pub fn history_missing(&self) -> bool {
        self.valid_records == 0
    }
}

/// Level comparison. Equal → 1.0, one rung above → `overqualified_score`,
/// one below → 0.5, two or more apart → 0.25 minus 0.125 per extra rung.
pub fn level_match_score(
    candidate: ExperienceLevel,
    required: ExperienceLevel,
    overqualified_score: f64,
) -> f64 {
    let diff = candidate.rank() - required.rank();
    match diff {
        0 => 1.0,
        1 => overqualified_score.clamp(0.0, 1.0),
        -1 => 0.5,
        d => (0.25 - 0.125 * f64::from(d.abs() - 2)).max(0.0),
    }
}

/// Proportional score against a `[min_years, max_years]` window.
pub fn years_range_score(years: f64, min_years: Option<f64>, max_years: Option<f64>) -> f64 {
    let min = min_years.filter(|m| m.is_finite() && *m > 0.0);
    let max = max_years
        .filter(|m| m.is_finite() && *m >= 0.0)
        .filter(|m| min.is_none_or(|min| *m >= min));

    match (min, max) {
        (Some(min), _) if years < min => (1.0 - (min - years) / min).clamp(0.0, 1.0),
        (_, Some(max)) if years > max && max == 0.0 => 0.0,
        (_, Some(max)) if years > max => (1.0 - (years - max) / max).clamp(0.0, 1.0),
        _ => 1.0,
    }
}

/// Union of all parseable ranges. Returns (years, valid, invalid).
pub fn history_years(records: &[ExperienceRecord], today: NaiveDate) -> (f64, usize, usize) {
    let mut ranges: Vec<DateRange> = Vec::with_capacity(records.len());
    let mut invalid = 0;

    for record in records {
        match resolve_range(record.start.as_deref(), record.end.as_deref(), today) {
            Ok(range) => ranges.push(range),
            Err(err) => {
                tracing::debug!(
                    title = %record.title,
                    organization = %record.organization,
                    error = %err,
                    "skipping experience record"
                );
                invalid += 1;
            }
        }
    }

    (total_years(&ranges), ranges.len(), invalid)
}

pub fn evaluate_experience(
    records: &[ExperienceRecord],
    requirement: &ExperienceRequirement,
    today: NaiveDate,
    overqualified_score: f64,
) -> ExperienceEvaluation {
    let (candidate_years, valid_records, invalid_records) = history_years(records, today);
    let candidate_level = ExperienceLevel::from_years(candidate_years);

    let required_level = requirement
        .level
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
        .and_then(|raw| {
            let parsed = ExperienceLevel::parse_label(raw);
            if parsed.is_none() {
                tracing::debug!(level = raw, "ignoring unparseable required level");
            }
            parsed
        });
    let has_range = requirement.min_years.is_some() || requirement.max_years.is_some();

    let (score, basis, details) = match required_level {
        Some(required) => {
            let score = level_match_score(candidate_level, required, overqualified_score);
            let mut details = format!(
                "{:.1} years ({}) vs required {}",
                candidate_years, candidate_level, required
            );
            if has_range {
                details.push_str(&format!(
                    "; range {}-{} years not scored",
                    fmt_bound(requirement.min_years),
                    fmt_bound(requirement.max_years)
                ));
            }
            (score, ExperienceBasis::Level, details)
        }
        None if has_range => {
            let score =
                years_range_score(candidate_years, requirement.min_years, requirement.max_years);
            let details = format!(
                "{:.1} years vs required {}-{} years",
                candidate_years,
                fmt_bound(requirement.min_years),
                fmt_bound(requirement.max_years)
            );
            (score, ExperienceBasis::YearsRange, details)
        }
        None => (
            1.0,
            ExperienceBasis::NoRequirement,
            format!("no experience requirement ({:.1} years)", candidate_years),
        ),
    };

    let details = if invalid_records > 0 {
        format!("{details}; {invalid_records} record(s) skipped")
    } else {
        details
    };

    ExperienceEvaluation {
        score,
        status: status_from_score(score, valid_records == 0),
        basis,
        candidate_years,
        candidate_level,
        required_level,
        valid_records,
        invalid_records,
        details,
    }
}

fn fmt_bound(bound: Option<f64>) -> String {
    bound.map(|v| format!("{v}")).unwrap_or_else(|| "?".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn record(start: &str, end: Option<&str>) -> ExperienceRecord {
        ExperienceRecord {
            title: "Engineer".into(),
            organization: "Acme".into(),
            start: Some(start.into()),
            end: end.map(Into::into),
            ..ExperienceRecord::default()
        }
    }

    fn level_req(level: &str) -> ExperienceRequirement {
        ExperienceRequirement {
            level: Some(level.into()),
            ..ExperienceRequirement::default()
        }
    }

    #[test]
    fn level_grid() {
        use ExperienceLevel::*;
        assert_eq!(level_match_score(Senior, Senior, 0.85), 1.0);
        assert_eq!(level_match_score(Lead, Senior, 0.85), 0.85);
        assert_eq!(level_match_score(Mid, Senior, 0.85), 0.5);
        assert_eq!(level_match_score(Junior, Senior, 0.85), 0.25);
        assert_eq!(level_match_score(Entry, Senior, 0.85), 0.125);
        assert_eq!(level_match_score(Entry, Lead, 0.85), 0.0);
        assert_eq!(level_match_score(Principal, Mid, 0.85), 0.125);
    }

    #[test]
    fn junior_against_senior_is_low() {
        let records = vec![record("2022-01", None)];
        let eval = evaluate_experience(&records, &level_req("senior"), today(), 0.85);
        assert_eq!(eval.candidate_level, ExperienceLevel::Junior);
        assert!(eval.score <= 0.25);
        assert_eq!(eval.basis, ExperienceBasis::Level);
    }

    #[test]
    fn years_range_is_proportional() {
        assert_eq!(years_range_score(4.0, Some(3.0), Some(6.0)), 1.0);
        assert!((years_range_score(1.5, Some(3.0), None) - 0.5).abs() < 1e-9);
        assert!((years_range_score(9.0, Some(3.0), Some(6.0)) - 0.5).abs() < 1e-9);
        assert_eq!(years_range_score(0.0, Some(0.0), None), 1.0);
        assert_eq!(years_range_score(20.0, None, Some(5.0)), 0.0);
    }

    #[test]
    fn level_wins_over_range() {
        let records = vec![record("2016-01", Some("2024-01"))];
        let requirement = ExperienceRequirement {
            level: Some("Senior".into()),
            min_years: Some(12.0),
            max_years: None,
        };
        let eval = evaluate_experience(&records, &requirement, today(), 0.85);
        assert_eq!(eval.basis, ExperienceBasis::Level);
        assert_eq!(eval.score, 1.0);
        assert!(eval.details.contains("not scored"));
    }

    #[test]
    fn no_requirement_scores_one() {
        let eval = evaluate_experience(&[], &ExperienceRequirement::default(), today(), 0.85);
        assert_eq!(eval.score, 1.0);
        assert_eq!(eval.basis, ExperienceBasis::NoRequirement);
        assert!(eval.history_missing());
        assert_eq!(eval.candidate_level, ExperienceLevel::Entry);
    }

    #[test]
    fn invalid_records_are_counted_and_skipped() {
        let records = vec![
            record("2018-01", Some("2020-01")),
            record("2021-05", Some("2019-01")),
            record("sometime", None),
        ];
        let eval = evaluate_experience(&records, &level_req("junior"), today(), 0.85);
        assert_eq!(eval.valid_records, 1);
        assert_eq!(eval.invalid_records, 2);
        assert!((eval.candidate_years - 2.0).abs() < 0.01);
        assert!(eval.details.contains("2 record(s) skipped"));
    }

    #[test]
    fn overlapping_jobs_are_not_double_counted() {
        let records = vec![
            record("2018-01", Some("2022-01")),
            record("2020-01", Some("2022-01")),
        ];
        let (years, valid, invalid) = history_years(&records, today());
        assert!((years - 4.0).abs() < 0.01);
        assert_eq!((valid, invalid), (2, 0));
    }

    #[test]
    fn unparseable_level_falls_back_to_range() {
        let records = vec![record("2020-01", Some("2022-01"))];
        let requirement = ExperienceRequirement {
            level: Some("rockstar".into()),
            min_years: Some(4.0),
            max_years: None,
        };
        let eval = evaluate_experience(&records, &requirement, today(), 0.85);
        assert_eq!(eval.basis, ExperienceBasis::YearsRange);
        assert!((eval.score - 0.5).abs() < 0.01);
    }
}
