use chrono::{NaiveDate, Utc};
use serde::Serialize;

use super::domain::{evaluate_domain, DomainEvaluation, DomainMatchKind};
use super::experience::{evaluate_experience, ExperienceBasis, ExperienceEvaluation};
use super::location::{evaluate_location, LocationEvaluation, LocationMatchKind};
use super::skills::{evaluate_skills, SkillMatchResult};
use super::weights::{ComponentWeights, DEFAULT_WEIGHTS};
use super::{status_from_score, MatchStatus};
use crate::semantic::{
    candidate_document, job_document, semantic_similarity, FittedModel, SemanticConfig,
    SemanticMethod, SemanticScore,
};
use crate::taxonomy::{ExperienceLevel, Taxonomy};
use crate::{CandidateProfile, JobPosting, RemoteOption};

const STRONG_THRESHOLD: f64 = 0.8;
const WEAK_THRESHOLD: f64 = 0.4;
const PARTIAL_MATCH_REASON: &str = "Partial match based on available criteria";

#[derive(Debug, Clone)]
pub struct MatchingConfig {
    pub weights: ComponentWeights,
    pub taxonomy: Taxonomy,
    /// Experience score one level above the requirement.
    pub overqualified_score: f64,
    /// Domain score for a related (not identical) industry.
    pub related_domain_score: f64,
    /// Confidence lost per missing input.
    pub confidence_step: f64,
    pub semantic: SemanticConfig,
    /// "Today" for open-ended experience ranges.
    pub reference_date: NaiveDate,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS,
            taxonomy: Taxonomy::default(),
            overqualified_score: 0.85,
            related_domain_score: 0.6,
            confidence_step: 0.15,
            semantic: SemanticConfig::default(),
            reference_date: Utc::now().date_naive(),
        }
    }
}

impl MatchingConfig {
    /// Defaults overridden by `JM_OVERQUALIFIED_SCORE`, `JM_RELATED_DOMAIN_SCORE`,
    /// `JM_SEMANTIC_MIN_CORPUS`, `JM_SEMANTIC_MAX_FEATURES` and
    /// `JM_REFERENCE_DATE` (YYYY-MM-DD). Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parse = |name: &str| lookup(name).and_then(|raw| parse_override(name, &raw));
        let unit = |name: &str| parse(name).filter(|v: &f64| v.is_finite() && (0.0..=1.0).contains(v));
        let defaults = Self::default();
        Self {
            overqualified_score: unit("JM_OVERQUALIFIED_SCORE")
                .unwrap_or(defaults.overqualified_score),
            related_domain_score: unit("JM_RELATED_DOMAIN_SCORE")
                .unwrap_or(defaults.related_domain_score),
            semantic: SemanticConfig {
                min_corpus_size: lookup("JM_SEMANTIC_MIN_CORPUS")
                    .and_then(|raw| parse_override("JM_SEMANTIC_MIN_CORPUS", &raw))
                    .unwrap_or(defaults.semantic.min_corpus_size),
                max_features: lookup("JM_SEMANTIC_MAX_FEATURES")
                    .and_then(|raw| parse_override::<usize>("JM_SEMANTIC_MAX_FEATURES", &raw))
                    .filter(|v| *v > 0)
                    .unwrap_or(defaults.semantic.max_features),
                ..defaults.semantic.clone()
            },
            reference_date: lookup("JM_REFERENCE_DATE")
                .and_then(|raw| parse_override("JM_REFERENCE_DATE", &raw))
                .unwrap_or(defaults.reference_date),
            ..defaults
        }
    }

    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = date;
        self
    }

    pub fn with_weights(mut self, weights: ComponentWeights) -> Self {
        self.weights = weights;
        self
    }
}

fn parse_override<T: std::str::FromStr>(name: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = raw, "ignoring unparseable override");
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComponentScores {
    pub skills: f64,
    pub experience: f64,
    pub domain: f64,
    pub location: f64,
    pub semantic: f64,
}

impl ComponentScores {
    fn all_finite(&self) -> bool {
        [self.skills, self.experience, self.domain, self.location, self.semantic]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Score, verdict and explanation for one component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentDetail {
    pub score: f64,
    pub status: MatchStatus,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchBreakdown {
    pub skills: ComponentDetail,
    pub experience: ComponentDetail,
    pub domain: ComponentDetail,
    pub location: ComponentDetail,
    pub semantic: ComponentDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub candidate_id: String,
    pub job_id: String,
    pub overall_score: f64,
    pub components: ComponentScores,
    pub confidence: f64,
    pub semantic_method: SemanticMethod,
    /// Model version used for the semantic component, if any was published.
    pub model_version: Option<u64>,
    pub matching_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub reasons: Vec<String>,
    pub gaps: Vec<String>,
    pub candidate_years: f64,
    pub candidate_level: ExperienceLevel,
    pub breakdown: MatchBreakdown,
}

impl MatchResult {
    pub fn is_finite(&self) -> bool {
        self.overall_score.is_finite() && self.confidence.is_finite() && self.components.all_finite()
    }
}

/// Pure pair scorer. The model snapshot is passed in so a whole ranking run
/// sees one version.
#[derive(Debug, Clone)]
pub struct MatchScorer {
    config: MatchingConfig,
}

impl MatchScorer {
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    pub fn score(
        &self,
        candidate: &CandidateProfile,
        job: &JobPosting,
        model: Option<&FittedModel>,
    ) -> MatchResult {
        let config = &self.config;
        let skills = evaluate_skills(&job.required_skills, &candidate.skills, &config.taxonomy);
        let experience = evaluate_experience(
            &candidate.experience,
            &job.experience,
            config.reference_date,
            config.overqualified_score,
        );
        let domain = evaluate_domain(candidate, job, &config.taxonomy, config.related_domain_score);
        let location = evaluate_location(candidate, job);
        let semantic = semantic_similarity(
            model,
            &candidate_document(candidate),
            &job_document(job),
        );

        let components = ComponentScores {
            skills: skills.score,
            experience: experience.score,
            domain: domain.score,
            location: location.score,
            semantic: semantic.value(),
        };
        let overall_score = config.weights.combine(
            components.skills,
            components.experience,
            components.domain,
            components.location,
            components.semantic,
        );

        let confidence = self.confidence(&skills, &experience, &domain, &location, semantic);
        let reasons = match_reasons(&skills, &experience, &domain, &location, semantic);
        let gaps = match_gaps(&skills, &experience);

        MatchResult {
            candidate_id: candidate.id.clone(),
            job_id: job.id.clone(),
            overall_score,
            components,
            confidence,
            semantic_method: semantic.method(),
            model_version: model.map(|fitted| fitted.version),
            matching_skills: skills.matching_skills(),
            missing_skills: skills.missing_skills.clone(),
            reasons,
            gaps,
            candidate_years: experience.candidate_years,
            candidate_level: experience.candidate_level,
            breakdown: MatchBreakdown {
                skills: ComponentDetail {
                    score: skills.score,
                    status: skills.status,
                    details: skills.details.clone(),
                },
                experience: ComponentDetail {
                    score: experience.score,
                    status: experience.status,
                    details: experience.details.clone(),
                },
                domain: ComponentDetail {
                    score: domain.score,
                    status: domain.status,
                    details: domain.details.clone(),
                },
                location: ComponentDetail {
                    score: location.score,
                    status: location.status,
                    details: location.details.clone(),
                },
                semantic: ComponentDetail {
                    score: semantic.value(),
                    status: status_from_score(semantic.value(), false),
                    details: format!("{} similarity", semantic.method()),
                },
            },
        }
    }

    fn confidence(
        &self,
        skills: &SkillMatchResult,
        experience: &ExperienceEvaluation,
        domain: &DomainEvaluation,
        location: &LocationEvaluation,
        semantic: SemanticScore,
    ) -> f64 {
        let missing = [
            skills.candidate_skill_count == 0,
            skills.required_count == 0,
            experience.history_missing(),
            domain.kind == DomainMatchKind::Unknown,
            location.kind == LocationMatchKind::Unknown,
            semantic.is_fallback(),
        ]
        .iter()
        .filter(|flag| **flag)
        .count();

        (1.0 - self.config.confidence_step * missing as f64).clamp(0.0, 1.0)
    }
}

fn remote_label(option: RemoteOption) -> String {
    option.as_ref().replace('_', "-")
}

fn match_reasons(
    skills: &SkillMatchResult,
    experience: &ExperienceEvaluation,
    domain: &DomainEvaluation,
    location: &LocationEvaluation,
    semantic: SemanticScore,
) -> Vec<String> {
    let mut reasons = Vec::new();

    if skills.score >= STRONG_THRESHOLD {
        if skills.required_count == 0 {
            reasons.push("No specific skills required".to_string());
        } else {
            reasons.push(format!(
                "Strong skill match: {} of {} required skills",
                skills.matched.len(),
                skills.required_count
            ));
        }
    } else if skills.score < WEAK_THRESHOLD {
        reasons.push(format!(
            "Limited skill match: {} of {} required skills",
            skills.matched.len(),
            skills.required_count
        ));
    }

    if experience.score >= STRONG_THRESHOLD && !experience.history_missing() {
        reasons.push(format!(
            "Experience level fits: {:.1} years ({})",
            experience.candidate_years, experience.candidate_level
        ));
    } else if experience.score < WEAK_THRESHOLD {
        let requirement = match (experience.basis, experience.required_level) {
            (ExperienceBasis::Level, Some(level)) => format!("{level} role"),
            _ => "the required range".to_string(),
        };
        reasons.push(format!(
            "Experience mismatch: {:.1} years ({}) for {}",
            experience.candidate_years, experience.candidate_level, requirement
        ));
    }

    match (domain.kind, domain.matched_pair.as_ref()) {
        (DomainMatchKind::Exact, Some((_, tag))) => {
            reasons.push(format!("Direct industry match: {tag}"));
        }
        (DomainMatchKind::Related, Some((candidate_tag, job_tag))) => {
            reasons.push(format!(
                "Related industry background: {candidate_tag} → {job_tag}"
            ));
        }
        (DomainMatchKind::Unrelated, _) => {
            reasons.push("No related industry experience".to_string());
        }
        (DomainMatchKind::Unknown, _) => {
            reasons.push("Industry fit unknown: domain tags missing".to_string());
        }
        _ => {}
    }

    if location.score >= STRONG_THRESHOLD {
        let reason = match location.kind {
            LocationMatchKind::Remote => format!(
                "Location compatible: {} role",
                remote_label(location.remote_option)
            ),
            LocationMatchKind::SameCity => "Location compatible: same city".to_string(),
            _ => "Location compatible: within commuting range".to_string(),
        };
        reasons.push(reason);
    } else if location.kind == LocationMatchKind::NoMatch {
        reasons.push(format!(
            "Location mismatch for {} role",
            remote_label(location.remote_option)
        ));
    }

    if semantic.value() >= STRONG_THRESHOLD {
        reasons.push("Strong profile/description similarity".to_string());
    } else if semantic.value() < WEAK_THRESHOLD {
        reasons.push("Limited profile/description similarity".to_string());
    }

    if reasons.is_empty() {
        reasons.push(PARTIAL_MATCH_REASON.to_string());
    }
    reasons
}

fn match_gaps(skills: &SkillMatchResult, experience: &ExperienceEvaluation) -> Vec<String> {
    let mut gaps = skills.missing_skills.clone();

    if experience.score < WEAK_THRESHOLD {
        match (experience.basis, experience.required_level) {
            (ExperienceBasis::Level, Some(required)) => gaps.push(format!(
                "Seniority gap: candidate is {}, role requires {}",
                experience.candidate_level, required
            )),
            (ExperienceBasis::YearsRange, _) => gaps.push(format!(
                "Experience gap: candidate has {:.1} years outside the required range",
                experience.candidate_years
            )),
            _ => {}
        }
    }
    gaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::Proficiency;
    use crate::{ExperienceRecord, ExperienceRequirement, Location, SkillRecord, SkillRequirement};

    fn config() -> MatchingConfig {
        MatchingConfig::default()
            .with_reference_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
    }

    fn full_candidate() -> CandidateProfile {
        CandidateProfile {
            id: "c-1".into(),
            summary: "Rust backend engineer building payment systems".into(),
            skills: vec![
                SkillRecord::new("Rust", Proficiency::Expert),
                SkillRecord::new("PostgreSQL", Proficiency::Advanced),
            ],
            experience: vec![ExperienceRecord {
                title: "Senior Engineer".into(),
                organization: "Bank".into(),
                domain_tags: vec!["banking".into()],
                start: Some("2016-01".into()),
                end: None,
                description: Some("Payment services in Rust".into()),
            }],
            location: Some(Location::new("Austin", "TX", "USA")),
            ..CandidateProfile::default()
        }
    }

    fn full_job() -> JobPosting {
        JobPosting {
            id: "j-1".into(),
            title: "Senior Rust Engineer".into(),
            description: "Build payment systems".into(),
            required_skills: vec![
                SkillRequirement::new("rust", Some(Proficiency::Advanced)),
                SkillRequirement::new("postgres", None),
            ],
            experience: ExperienceRequirement {
                level: Some("senior".into()),
                ..ExperienceRequirement::default()
            },
            domain_tags: vec!["finance".into()],
            location: Some(Location::new("Austin", "TX", "USA")),
            remote_option: Some("hybrid".into()),
            ..JobPosting::default()
        }
    }

    #[test]
    fn aggregates_weighted_components() {
        let scorer = MatchScorer::new(config());
        let result = scorer.score(&full_candidate(), &full_job(), None);

        assert_eq!(result.components.skills, 1.0);
        assert_eq!(result.components.experience, 1.0);
        assert_eq!(result.components.domain, 0.6);
        assert_eq!(result.components.location, 1.0);
        let expected = 0.35 + 0.25 + 0.15 * 0.6 + 0.10 + 0.15 * result.components.semantic;
        assert!((result.overall_score - expected).abs() < 1e-12);
        assert_eq!(result.semantic_method, SemanticMethod::Fallback);
        assert_eq!(result.model_version, None);
        assert!((result.confidence - 0.85).abs() < 1e-12);
        assert!(result.reasons.iter().any(|r| r.starts_with("Strong skill match: 2 of 2")));
        assert!(result
            .reasons
            .iter()
            .any(|r| r == "Related industry background: banking → finance"));
        assert!(result.gaps.is_empty());
    }

    #[test]
    fn empty_candidate_skills_reduce_confidence() {
        let mut candidate = full_candidate();
        candidate.skills.clear();
        let mut job = full_job();
        job.required_skills.push(SkillRequirement::new("Kafka", None));

        let result = MatchScorer::new(config()).score(&candidate, &job, None);
        assert_eq!(result.components.skills, 0.0);
        assert_eq!(result.missing_skills, vec!["rust", "postgres", "Kafka"]);
        assert!((result.confidence - 0.70).abs() < 1e-12);
        assert!(result.reasons.iter().any(|r| r.starts_with("Limited skill match")));
    }

    #[test]
    fn seniority_gap_is_reported() {
        let mut candidate = full_candidate();
        candidate.experience[0].start = Some("2022-01".into());
        let result = MatchScorer::new(config()).score(&candidate, &full_job(), None);
        assert!(result.components.experience <= 0.25);
        assert!(result
            .gaps
            .contains(&"Seniority gap: candidate is junior, role requires senior".to_string()));
    }

    #[test]
    fn bare_inputs_get_partial_reason_and_floor_confidence() {
        let candidate = CandidateProfile {
            id: "c".into(),
            ..CandidateProfile::default()
        };
        let job = JobPosting {
            id: "j".into(),
            remote_option: Some("hybrid".into()),
            ..JobPosting::default()
        };
        let result = MatchScorer::new(config()).score(&candidate, &job, None);
        assert_eq!(result.components.skills, 1.0);
        // Every confidence input is missing.
        assert!((result.confidence - 0.10).abs() < 1e-9);
        assert!(result.overall_score >= 0.0 && result.overall_score <= 1.0);
    }

    #[test]
    fn partial_reason_when_nothing_fires() {
        let taxonomy = Taxonomy::default();
        let candidate = CandidateProfile {
            id: "c".into(),
            skills: vec![SkillRecord::new("rust", Proficiency::Intermediate)],
            domain_tags: vec!["banking".into()],
            ..CandidateProfile::default()
        };
        let job = JobPosting {
            id: "j".into(),
            required_skills: vec![SkillRequirement::new("rust", Some(Proficiency::Advanced))],
            experience: ExperienceRequirement {
                level: Some("junior".into()),
                ..ExperienceRequirement::default()
            },
            domain_tags: vec!["finance".into()],
            ..JobPosting::default()
        };
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let skills = evaluate_skills(&job.required_skills, &candidate.skills, &taxonomy);
        let experience = evaluate_experience(&candidate.experience, &job.experience, date, 0.85);
        let domain = evaluate_domain(&candidate, &job, &taxonomy, 0.6);
        let location = evaluate_location(&candidate, &job);
        assert_eq!(skills.score, 0.66);
        assert_eq!(experience.score, 0.5);
        assert_eq!(domain.score, 0.6);
        assert_eq!(location.score, 0.5);

        let reasons = match_reasons(
            &skills,
            &experience,
            &domain,
            &location,
            SemanticScore::Primary(0.5),
        );
        assert_eq!(reasons, vec![PARTIAL_MATCH_REASON.to_string()]);

        let reasons = match_reasons(
            &skills,
            &experience,
            &domain,
            &location,
            SemanticScore::Fallback(0.0),
        );
        assert_eq!(reasons, vec!["Limited profile/description similarity".to_string()]);
    }

    #[test]
    fn missing_domain_tags_raise_a_concern() {
        let mut candidate = full_candidate();
        candidate.experience[0].domain_tags.clear();
        let result = MatchScorer::new(config()).score(&candidate, &full_job(), None);
        assert_eq!(result.components.domain, 0.0);
        assert!(result
            .reasons
            .contains(&"Industry fit unknown: domain tags missing".to_string()));
    }

    #[test]
    fn no_history_and_no_requirement_claims_no_experience_fit() {
        let candidate = CandidateProfile {
            id: "c".into(),
            ..CandidateProfile::default()
        };
        let job = JobPosting {
            id: "j".into(),
            ..JobPosting::default()
        };
        let result = MatchScorer::new(config()).score(&candidate, &job, None);
        assert_eq!(result.components.experience, 1.0);
        assert!(!result.reasons.iter().any(|r| r.starts_with("Experience level fits")));
    }

    #[test]
    fn overrides_are_parsed_and_range_checked() {
        let vars: std::collections::HashMap<&str, &str> = [
            ("JM_OVERQUALIFIED_SCORE", " 0.7 "),
            ("JM_RELATED_DOMAIN_SCORE", "1.5"),
            ("JM_SEMANTIC_MIN_CORPUS", "5"),
            ("JM_SEMANTIC_MAX_FEATURES", "0"),
            ("JM_REFERENCE_DATE", "2023-06-30"),
        ]
        .into_iter()
        .collect();
        let config = MatchingConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));
        let defaults = MatchingConfig::default();

        assert_eq!(config.overqualified_score, 0.7);
        // Outside [0, 1].
        assert_eq!(config.related_domain_score, defaults.related_domain_score);
        assert_eq!(config.semantic.min_corpus_size, 5);
        assert_eq!(config.semantic.max_features, defaults.semantic.max_features);
        assert_eq!(config.reference_date, NaiveDate::from_ymd_opt(2023, 6, 30).unwrap());

        assert_eq!(parse_override::<f64>("X", "abc"), None);
        assert_eq!(parse_override::<f64>("X", "NaN").filter(|v| v.is_finite()), None);
        assert!(config.weights.validate().is_ok());
    }
}
