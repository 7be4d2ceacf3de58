use serde::Serialize;
use strum::AsRefStr;

use super::{status_from_score, MatchStatus};
use crate::{CandidateProfile, JobPosting, Location, RemoteOption};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LocationMatchKind {
    /// Role can be done from anywhere.
    Remote,
    SameCity,
    Nearby,
    SameRegion,
    SameCountry,
    NoMatch,
    /// Location missing on either side.
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationEvaluation {
    pub score: f64,
    pub status: MatchStatus,
    pub kind: LocationMatchKind,
    /// Effective option; a missing or invalid value counts as on-site only.
    pub remote_option: RemoteOption,
    pub details: String,
}

/// Lower-cased, punctuation folded to single spaces.
fn norm_part(raw: Option<&str>) -> Option<String> {
    let folded: String = raw?
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();
    let joined = folded.split_whitespace().collect::<Vec<_>>().join(" ");
    (!joined.is_empty()).then_some(joined)
}

#[derive(Debug)]
struct NormalizedLocation {
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
    full: String,
}

impl NormalizedLocation {
    fn from_location(location: Option<&Location>) -> Option<Self> {
        let location = location.filter(|l| !l.is_empty())?;
        let city = norm_part(location.city.as_deref());
        let region = norm_part(location.region.as_deref());
        let country = norm_part(location.country.as_deref());
        let full = [&city, &region, &country]
            .iter()
            .filter_map(|p| p.as_deref())
            .collect::<Vec<_>>()
            .join(" ");
        Some(Self {
            city,
            region,
            country,
            full,
        })
    }
}

fn both_equal(a: &Option<String>, b: &Option<String>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

fn conflicting(a: &Option<String>, b: &Option<String>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a != b)
}

fn contains_word_sequence(haystack: &str, needle: &str) -> bool {
    format!(" {haystack} ").contains(&format!(" {needle} "))
}

fn is_nearby(candidate: &NormalizedLocation, job: &NormalizedLocation) -> bool {
    if both_equal(&candidate.region, &job.region) {
        return true;
    }
    let contained = |city: &Option<String>, other: &NormalizedLocation| {
        city.as_deref()
            .is_some_and(|city| contains_word_sequence(&other.full, city))
    };
    contained(&candidate.city, job) || contained(&job.city, candidate)
}

fn evaluation(
    score: f64,
    kind: LocationMatchKind,
    remote_option: RemoteOption,
    details: String,
) -> LocationEvaluation {
    LocationEvaluation {
        score,
        status: status_from_score(score, kind == LocationMatchKind::Unknown),
        kind,
        remote_option,
        details,
    }
}

/// Location compatibility. Remote-only and flexible roles always score 1.0;
/// otherwise city, then nearby (hybrid only), then region/country are compared.
pub fn evaluate_location(candidate: &CandidateProfile, job: &JobPosting) -> LocationEvaluation {
    let remote_option = match job.remote_option_parsed() {
        Some(option) => option,
        None => {
            if let Some(raw) = job.remote_option.as_deref().filter(|r| !r.trim().is_empty()) {
                tracing::debug!(job_id = %job.id, remote_option = raw, "unparseable remote option, assuming on-site");
            }
            RemoteOption::OnSiteOnly
        }
    };

    let evaluation = evaluate_location_inner(candidate, job, remote_option);
    if remote_option == RemoteOption::OnSiteOnly && candidate.remote_preference == Some(true) {
        return LocationEvaluation {
            details: format!("{}; candidate prefers remote", evaluation.details),
            ..evaluation
        };
    }
    evaluation
}

fn evaluate_location_inner(
    candidate: &CandidateProfile,
    job: &JobPosting,
    remote_option: RemoteOption,
) -> LocationEvaluation {
    if remote_option.allows_full_remote() {
        return evaluation(
            1.0,
            LocationMatchKind::Remote,
            remote_option,
            format!("{} role, no location constraint", remote_option),
        );
    }

    let (Some(cand), Some(job_loc)) = (
        NormalizedLocation::from_location(candidate.location.as_ref()),
        NormalizedLocation::from_location(job.location.as_ref()),
    ) else {
        return evaluation(
            0.5,
            LocationMatchKind::Unknown,
            remote_option,
            "location unknown, neutral score".into(),
        );
    };

    let hybrid = remote_option == RemoteOption::Hybrid;
    let pair = format!("candidate {} vs job {}", cand.full, job_loc.full);

    if both_equal(&cand.city, &job_loc.city)
        && !conflicting(&cand.region, &job_loc.region)
        && !conflicting(&cand.country, &job_loc.country)
    {
        return evaluation(1.0, LocationMatchKind::SameCity, remote_option, format!("same city: {pair}"));
    }

    if hybrid && !conflicting(&cand.country, &job_loc.country) && is_nearby(&cand, &job_loc) {
        return evaluation(0.8, LocationMatchKind::Nearby, remote_option, format!("commutable for hybrid: {pair}"));
    }

    if both_equal(&cand.region, &job_loc.region) && !conflicting(&cand.country, &job_loc.country) {
        return evaluation(0.6, LocationMatchKind::SameRegion, remote_option, format!("same region: {pair}"));
    }

    if both_equal(&cand.country, &job_loc.country) {
        return evaluation(0.6, LocationMatchKind::SameCountry, remote_option, format!("same country: {pair}"));
    }

    let score = if hybrid { 0.2 } else { 0.0 };
    evaluation(score, LocationMatchKind::NoMatch, remote_option, format!("no location match ({remote_option}): {pair}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(location: Option<Location>) -> CandidateProfile {
        CandidateProfile {
            id: "c".into(),
            location,
            ..CandidateProfile::default()
        }
    }

    fn job(location: Option<Location>, remote: &str) -> JobPosting {
        JobPosting {
            id: "j".into(),
            location,
            remote_option: Some(remote.into()),
            ..JobPosting::default()
        }
    }

    #[test]
    fn remote_only_ignores_distance() {
        let eval = evaluate_location(
            &candidate(Some(Location::new("Berlin", "Berlin", "Germany"))),
            &job(Some(Location::new("Austin", "TX", "USA")), "remote_only"),
        );
        assert_eq!(eval.score, 1.0);
        assert_eq!(eval.kind, LocationMatchKind::Remote);
    }

    #[test]
    fn same_city_scores_full() {
        let eval = evaluate_location(
            &candidate(Some(Location::new("austin", "tx", "usa"))),
            &job(Some(Location::new("Austin", "TX", "USA")), "on_site_only"),
        );
        assert_eq!(eval.kind, LocationMatchKind::SameCity);
        assert_eq!(eval.score, 1.0);
    }

    #[test]
    fn hybrid_nearby_and_fallbacks() {
        let cand = candidate(Some(Location::new("Round Rock", "TX", "USA")));
        let hybrid = evaluate_location(&cand, &job(Some(Location::new("Austin", "TX", "USA")), "hybrid"));
        assert_eq!(hybrid.kind, LocationMatchKind::Nearby);
        assert_eq!(hybrid.score, 0.8);

        let onsite = evaluate_location(&cand, &job(Some(Location::new("Austin", "TX", "USA")), "on-site"));
        assert_eq!(onsite.kind, LocationMatchKind::SameRegion);
        assert_eq!(onsite.score, 0.6);

        let country = evaluate_location(&cand, &job(Some(Location::new("Denver", "CO", "USA")), "on_site_only"));
        assert_eq!(country.kind, LocationMatchKind::SameCountry);
        assert_eq!(country.score, 0.6);
    }

    #[test]
    fn no_match_depends_on_remote_option() {
        let cand = candidate(Some(Location::new("Paris", "IDF", "France")));
        let target = Some(Location::new("Austin", "TX", "USA"));
        assert_eq!(evaluate_location(&cand, &job(target.clone(), "on_site_only")).score, 0.0);
        assert_eq!(evaluate_location(&cand, &job(target, "hybrid")).score, 0.2);
    }

    #[test]
    fn missing_location_is_neutral_unknown() {
        let eval = evaluate_location(&candidate(None), &job(Some(Location::new("Austin", "TX", "USA")), "hybrid"));
        assert_eq!(eval.score, 0.5);
        assert_eq!(eval.kind, LocationMatchKind::Unknown);
        assert_eq!(eval.status, MatchStatus::Unknown);
    }

    #[test]
    fn invalid_remote_option_is_on_site_and_notes_preference() {
        let mut cand = candidate(Some(Location::new("Paris", "IDF", "France")));
        cand.remote_preference = Some(true);
        let eval = evaluate_location(&cand, &job(Some(Location::new("Austin", "TX", "USA")), "sometimes"));
        assert_eq!(eval.remote_option, RemoteOption::OnSiteOnly);
        assert_eq!(eval.score, 0.0);
        assert!(eval.details.contains("prefers remote"));
    }

    #[test]
    fn city_containment_counts_as_nearby() {
        let cand = candidate(Some(Location {
            city: Some("San Francisco".into()),
            ..Location::default()
        }));
        let target = Some(Location {
            city: Some("South San Francisco".into()),
            ..Location::default()
        });
        let eval = evaluate_location(&cand, &job(target, "hybrid"));
        assert_eq!(eval.kind, LocationMatchKind::Nearby);
    }
}
