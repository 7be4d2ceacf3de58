pub mod domain;
pub mod experience;
pub mod location;
pub mod pipeline;
pub mod scoring;
pub mod skills;
pub mod weights;

use serde::Serialize;
use strum::{AsRefStr, Display};

pub use pipeline::{
    CandidateFilters, JobFilters, MatchingEngine, RankError, RankOptions, RankedCandidate,
    RankedJob,
};
pub use scoring::{ComponentScores, MatchResult, MatchScorer, MatchingConfig};
pub use weights::{ComponentWeights, WeightsError, DEFAULT_WEIGHTS};

/// Per-component verdict shown alongside the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    PerfectMatch,
    Match,
    PartialMatch,
    Miss,
    Unknown,
}

pub fn status_from_score(score: f64, unknown: bool) -> MatchStatus {
    if unknown {
        MatchStatus::Unknown
    } else if score >= 0.9 {
        MatchStatus::PerfectMatch
    } else if score >= 0.7 {
        MatchStatus::Match
    } else if score >= 0.4 {
        MatchStatus::PartialMatch
    } else {
        MatchStatus::Miss
    }
}
