use std::collections::BTreeSet;

use serde::Serialize;
use strum::AsRefStr;

use super::{status_from_score, MatchStatus};
use crate::taxonomy::{normalize_domain, Taxonomy};
use crate::{CandidateProfile, JobPosting};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DomainMatchKind {
    Exact,
    Related,
    Unrelated,
    /// One side carries no domain tags.
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomainEvaluation {
    pub score: f64,
    pub status: MatchStatus,
    pub kind: DomainMatchKind,
    /// Tag pair that decided an exact/related match (candidate, job).
    pub matched_pair: Option<(String, String)>,
    pub details: String,
}

fn tag_set<'a>(tags: impl IntoIterator<Item = &'a String>) -> BTreeSet<String> {
    tags.into_iter()
        .map(|tag| normalize_domain(tag))
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Declared domain tags plus the tags of every experience record.
pub fn candidate_domains(candidate: &CandidateProfile) -> BTreeSet<String> {
    tag_set(
        candidate
            .domain_tags
            .iter()
            .chain(candidate.experience.iter().flat_map(|r| r.domain_tags.iter())),
    )
}

pub fn evaluate_domain(
    candidate: &CandidateProfile,
    job: &JobPosting,
    taxonomy: &Taxonomy,
    related_score: f64,
) -> DomainEvaluation {
    let candidate_tags = candidate_domains(candidate);
    let job_tags = tag_set(job.domain_tags.iter());

    if candidate_tags.is_empty() || job_tags.is_empty() {
        return DomainEvaluation {
            score: 0.0,
            status: MatchStatus::Unknown,
            kind: DomainMatchKind::Unknown,
            matched_pair: None,
            details: "domain tags missing".into(),
        };
    }

    if let Some(tag) = candidate_tags.intersection(&job_tags).next() {
        return DomainEvaluation {
            score: 1.0,
            status: MatchStatus::PerfectMatch,
            kind: DomainMatchKind::Exact,
            matched_pair: Some((tag.clone(), tag.clone())),
            details: format!("direct industry match: {tag}"),
        };
    }

    // BTreeSet iteration keeps the reported pair stable.
    for job_tag in &job_tags {
        for candidate_tag in &candidate_tags {
            if taxonomy.domains_related(candidate_tag, job_tag) {
                let score = related_score.clamp(0.0, 1.0);
                return DomainEvaluation {
                    score,
                    status: status_from_score(score, false),
                    kind: DomainMatchKind::Related,
                    matched_pair: Some((candidate_tag.clone(), job_tag.clone())),
                    details: format!("related industry: {candidate_tag} -> {job_tag}"),
                };
            }
        }
    }

    DomainEvaluation {
        score: 0.0,
        status: MatchStatus::Miss,
        kind: DomainMatchKind::Unrelated,
        matched_pair: None,
        details: format!(
            "no industry overlap: candidate [{}] vs job [{}]",
            candidate_tags.iter().cloned().collect::<Vec<_>>().join(", "),
            job_tags.iter().cloned().collect::<Vec<_>>().join(", ")
        ),
    }
}
