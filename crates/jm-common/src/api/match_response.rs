use serde::{Deserialize, Serialize};

use crate::matching::scoring::{ComponentDetail, ComponentScores, MatchBreakdown};
use crate::matching::{MatchResult, RankedCandidate, RankedJob};
use crate::semantic::{FittedModel, SemanticMethod};
use crate::taxonomy::Proficiency;
use crate::CandidateProfile;

const TOP_SKILLS: usize = 5;

/// Scores leave the service rounded to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScoresDto {
    pub skills: f64,
    pub experience: f64,
    pub domain: f64,
    pub location: f64,
    pub semantic: f64,
}

impl From<&ComponentScores> for ComponentScoresDto {
    fn from(value: &ComponentScores) -> Self {
        Self {
            skills: round2(value.skills),
            experience: round2(value.experience),
            domain: round2(value.domain),
            location: round2(value.location),
            semantic: round2(value.semantic),
        }
    }
}

/// Body returned by `POST /api/match-score`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResponse {
    pub candidate_id: String,
    pub job_id: String,
    pub overall_score: f64,
    pub components: ComponentScoresDto,
    pub confidence: f64,
    pub semantic_method: SemanticMethod,
    pub matching_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub reasons: Vec<String>,
    pub gaps: Vec<String>,
    pub model_version: Option<u64>,
    pub breakdown: MatchBreakdown,
}

impl MatchResponse {
    pub fn from_match_result(result: &MatchResult) -> Self {
        Self {
            candidate_id: result.candidate_id.clone(),
            job_id: result.job_id.clone(),
            overall_score: round2(result.overall_score),
            components: ComponentScoresDto::from(&result.components),
            confidence: round2(result.confidence),
            semantic_method: result.semantic_method,
            matching_skills: result.matching_skills.clone(),
            missing_skills: result.missing_skills.clone(),
            reasons: result.reasons.clone(),
            gaps: result.gaps.clone(),
            model_version: result.model_version,
            breakdown: rounded_breakdown(&result.breakdown),
        }
    }
}

fn rounded_breakdown(breakdown: &MatchBreakdown) -> MatchBreakdown {
    let round = |detail: &ComponentDetail| ComponentDetail {
        score: round2(detail.score),
        ..detail.clone()
    };
    MatchBreakdown {
        skills: round(&breakdown.skills),
        experience: round(&breakdown.experience),
        domain: round(&breakdown.domain),
        location: round(&breakdown.location),
        semantic: round(&breakdown.semantic),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummary {
    pub id: String,
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub remote_option: Option<String>,
    pub domain_tags: Vec<String>,
}

/// One entry of `GET /api/find-jobs`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobMatchDto {
    pub job_summary: JobSummary,
    pub match_score: f64,
    pub confidence: f64,
    pub match_reasons: Vec<String>,
    pub missing_skills: Vec<String>,
}

impl From<&RankedJob<'_>> for JobMatchDto {
    fn from(ranked: &RankedJob<'_>) -> Self {
        let job = ranked.job;
        Self {
            job_summary: JobSummary {
                id: job.id.clone(),
                title: job.title.clone(),
                company: job.company.clone(),
                location: job
                    .location
                    .as_ref()
                    .map(|loc| loc.display())
                    .filter(|s| !s.is_empty()),
                remote_option: job.remote_option_parsed().map(|o| o.as_ref().to_string()),
                domain_tags: job.domain_tags.clone(),
            },
            match_score: round2(ranked.result.overall_score),
            confidence: round2(ranked.result.confidence),
            match_reasons: ranked.result.reasons.clone(),
            missing_skills: ranked.result.missing_skills.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSummary {
    pub id: String,
    pub name: Option<String>,
    pub location: Option<String>,
    pub experience_years: f64,
    pub top_skills: Vec<String>,
}

/// One entry of `GET /api/find-candidates`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateMatchDto {
    pub candidate_summary: CandidateSummary,
    pub match_score: f64,
    pub confidence: f64,
    pub match_reasons: Vec<String>,
}

impl From<&RankedCandidate<'_>> for CandidateMatchDto {
    fn from(ranked: &RankedCandidate<'_>) -> Self {
        let candidate = ranked.candidate;
        Self {
            candidate_summary: CandidateSummary {
                id: candidate.id.clone(),
                name: candidate.name.clone(),
                location: candidate
                    .location
                    .as_ref()
                    .map(|loc| loc.display())
                    .filter(|s| !s.is_empty()),
                experience_years: (ranked.result.candidate_years * 10.0).round() / 10.0,
                top_skills: top_skills(candidate),
            },
            match_score: round2(ranked.result.overall_score),
            confidence: round2(ranked.result.confidence),
            match_reasons: ranked.result.reasons.clone(),
        }
    }
}

/// Strongest skills first; listing order breaks ties.
fn top_skills(candidate: &CandidateProfile) -> Vec<String> {
    let mut skills: Vec<(u8, usize, &str)> = candidate
        .skills
        .iter()
        .enumerate()
        .filter(|(_, skill)| !skill.name.trim().is_empty())
        .map(|(position, skill)| {
            let rank = skill
                .proficiency
                .as_deref()
                .and_then(Proficiency::parse_label)
                .map_or(0, Proficiency::rank);
            (rank, position, skill.name.trim())
        })
        .collect();
    skills.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    skills
        .into_iter()
        .take(TOP_SKILLS)
        .map(|(_, _, name)| name.to_string())
        .collect()
}

/// Body returned by `POST /api/model/refit`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefitResponse {
    pub model_version: u64,
    pub vocabulary_size: usize,
    pub documents: usize,
}

impl From<&FittedModel> for RefitResponse {
    fn from(fitted: &FittedModel) -> Self {
        Self {
            model_version: fitted.version,
            vocabulary_size: fitted.model.vocabulary_size(),
            documents: fitted.model.documents(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{MatchScorer, MatchingConfig};
    use crate::{JobPosting, Location, SkillRecord, SkillRequirement};
    use chrono::NaiveDate;

    fn scored() -> (CandidateProfile, JobPosting, MatchResult) {
        let candidate = CandidateProfile {
            id: "c-1".into(),
            name: Some("Ada".into()),
            skills: vec![
                SkillRecord::new("SQL", Proficiency::Beginner),
                SkillRecord::new("Rust", Proficiency::Expert),
                SkillRecord::new("Go", Proficiency::Expert),
            ],
            location: Some(Location::new("Austin", "TX", "USA")),
            ..CandidateProfile::default()
        };
        let job = JobPosting {
            id: "j-1".into(),
            title: "Rust engineer".into(),
            required_skills: vec![SkillRequirement::new("rust", None)],
            remote_option: Some("Remote Only".into()),
            ..JobPosting::default()
        };
        let config = MatchingConfig::default()
            .with_reference_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let result = MatchScorer::new(config).score(&candidate, &job, None);
        (candidate, job, result)
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(0.8249), 0.82);
        assert_eq!(round2(0.8251), 0.83);
        assert_eq!(round2(1.0), 1.0);
    }

    #[test]
    fn job_dto_uses_canonical_remote_label() {
        let (_, job, result) = scored();
        let dto = JobMatchDto::from(&RankedJob { job: &job, result });
        assert_eq!(dto.job_summary.remote_option.as_deref(), Some("remote_only"));
        assert_eq!(dto.job_summary.location, None);
        assert!(dto.match_score <= 1.0);
    }

    #[test]
    fn candidate_dto_orders_top_skills_by_proficiency() {
        let (candidate, _, result) = scored();
        let dto = CandidateMatchDto::from(&RankedCandidate {
            candidate: &candidate,
            result,
        });
        assert_eq!(dto.candidate_summary.top_skills, vec!["Rust", "Go", "SQL"]);
        assert_eq!(dto.candidate_summary.location.as_deref(), Some("Austin, TX, USA"));
    }

    #[test]
    fn match_response_serializes_method_in_snake_case() {
        let (_, _, result) = scored();
        let json = serde_json::to_value(MatchResponse::from_match_result(&result)).unwrap();
        assert_eq!(json["semantic_method"], "fallback");
        assert_eq!(json["components"]["skills"], 1.0);
        assert!(json["model_version"].is_null());
    }

    #[test]
    fn breakdown_scores_are_rounded_like_components() {
        let candidate = CandidateProfile {
            id: "c-2".into(),
            skills: vec![SkillRecord::new("Python", Proficiency::Advanced)],
            ..CandidateProfile::default()
        };
        let job = JobPosting {
            id: "j-2".into(),
            required_skills: vec![
                SkillRequirement::new("Python", None),
                SkillRequirement::new("PostgreSQL", None),
                SkillRequirement::new("Kafka", None),
            ],
            ..JobPosting::default()
        };
        let config = MatchingConfig::default()
            .with_reference_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let result = MatchScorer::new(config).score(&candidate, &job, None);
        assert_ne!(result.breakdown.skills.score, round2(result.breakdown.skills.score));

        let response = MatchResponse::from_match_result(&result);
        assert_eq!(response.breakdown.skills.score, response.components.skills);
        assert_eq!(response.breakdown.semantic.score, response.components.semantic);
        assert_eq!(response.breakdown.skills.details, result.breakdown.skills.details);
    }
}
