use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::{status_from_score, MatchStatus};
use crate::skill_normalizer::normalize_skill;
use crate::taxonomy::{Proficiency, SkillCategory, Taxonomy};
use crate::{SkillRecord, SkillRequirement};

/// Candidate proficiency assumed when a skill record carries none.
pub const DEFAULT_CANDIDATE_PROFICIENCY: Proficiency = Proficiency::Intermediate;

/// One required skill the candidate also has.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillMatchDetail {
    /// Job's spelling.
    pub name: String,
    pub category: SkillCategory,
    pub candidate_level: Option<Proficiency>,
    pub required_level: Option<Proficiency>,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillMatchResult {
    pub score: f64,
    pub status: MatchStatus,
    pub matched: Vec<SkillMatchDetail>,
    /// Required skills without a counterpart, in the job's spelling and order.
    pub missing_skills: Vec<String>,
    pub required_count: usize,
    pub candidate_skill_count: usize,
    /// Candidate skill records dropped for an unparseable proficiency.
    pub invalid_records: usize,
    pub details: String,
}

impl SkillMatchResult {
    pub fn matching_skills(&self) -> Vec<String> {
        self.matched.iter().map(|detail| detail.name.clone()).collect()
    }
}

/// Score for one matched skill: 1.0 at or above the minimum, then 0.66 /
/// 0.33 / 0.0 for one, two and three levels short.
pub fn proficiency_score(candidate: Proficiency, required: Option<Proficiency>) -> f64 {
    let Some(required) = required else {
        return 1.0;
    };
    match required.rank().saturating_sub(candidate.rank()) {
        0 => 1.0,
        1 => 0.66,
        2 => 0.33,
        _ => 0.0,
    }
}

struct CandidateSkill {
    proficiency: Option<Proficiency>,
}

impl CandidateSkill {
    fn effective(&self) -> Proficiency {
        self.proficiency.unwrap_or(DEFAULT_CANDIDATE_PROFICIENCY)
    }
}

fn index_candidate_skills(records: &[SkillRecord]) -> (HashMap<String, CandidateSkill>, usize) {
    let mut index: HashMap<String, CandidateSkill> = HashMap::new();
    let mut invalid = 0;

    for record in records {
        if record.name.trim().is_empty() {
            continue;
        }
        let proficiency = match record.proficiency.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match Proficiency::parse_label(raw) {
                Some(parsed) => Some(parsed),
                None => {
                    tracing::debug!(
                        skill = %record.name,
                        proficiency = raw,
                        "skipping candidate skill with unparseable proficiency"
                    );
                    invalid += 1;
                    continue;
                }
            },
        };

        // Duplicate records keep the strongest effective proficiency.
        let canonical = normalize_skill(&record.name);
        let incoming = CandidateSkill { proficiency };
        match index.entry(canonical) {
            Entry::Occupied(mut slot) => {
                if incoming.effective() > slot.get().effective() {
                    slot.insert(incoming);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(incoming);
            }
        }
    }

    (index, invalid)
}

fn requirement_category(requirement: &SkillRequirement, canonical: &str, taxonomy: &Taxonomy) -> SkillCategory {
    requirement
        .category
        .as_deref()
        .and_then(SkillCategory::parse_label)
        .unwrap_or_else(|| taxonomy.category_for(canonical))
}

/// Category-weighted skill coverage.
///
/// `Σ weight·score over matched / Σ weight over required`; 1.0 when the job
/// requires nothing. Requirements naming the same canonical skill count once.
pub fn evaluate_skills(
    required: &[SkillRequirement],
    candidate: &[SkillRecord],
    taxonomy: &Taxonomy,
) -> SkillMatchResult {
    let (candidate_index, invalid_records) = index_candidate_skills(candidate);

    let mut seen = HashSet::new();
    let mut matched = Vec::new();
    let mut missing_skills = Vec::new();
    let mut weight_total = 0.0;
    let mut weight_matched = 0.0;
    let mut plain_matched = 0.0;

    for requirement in required {
        let name = requirement.name.trim();
        if name.is_empty() {
            continue;
        }
        let canonical = normalize_skill(name);
        if !seen.insert(canonical.clone()) {
            continue;
        }

        let category = requirement_category(requirement, &canonical, taxonomy);
        let weight = taxonomy.category_weight(category);
        let required_level = requirement
            .min_proficiency
            .as_deref()
            .and_then(|raw| {
                let parsed = Proficiency::parse_label(raw);
                if parsed.is_none() {
                    tracing::debug!(skill = name, min_proficiency = raw, "ignoring unparseable minimum proficiency");
                }
                parsed
            });
        weight_total += weight;

        match candidate_index.get(&canonical) {
            Some(skill) => {
                let score = proficiency_score(skill.effective(), required_level);
                weight_matched += weight * score;
                plain_matched += score;
                matched.push(SkillMatchDetail {
                    name: name.to_string(),
                    category,
                    candidate_level: skill.proficiency,
                    required_level,
                    score,
                });
            }
            None => missing_skills.push(name.to_string()),
        }
    }

    let required_count = seen.len();
    let score = if required_count == 0 {
        1.0
    } else if weight_total > 0.0 {
        (weight_matched / weight_total).clamp(0.0, 1.0)
    } else {
        // All categories weighted zero: fall back to an unweighted average.
        (plain_matched / required_count as f64).clamp(0.0, 1.0)
    };

    let details = if required_count == 0 {
        "no required skills".to_string()
    } else {
        format!(
            "{} of {} required skills matched (missing: {})",
            matched.len(),
            required_count,
            if missing_skills.is_empty() {
                "none".to_string()
            } else {
                missing_skills.join(", ")
            }
        )
    };

    SkillMatchResult {
        score,
        status: status_from_score(score, false),
        matched,
        missing_skills,
        required_count,
        candidate_skill_count: candidate_index.len(),
        invalid_records,
        details,
    }
}
