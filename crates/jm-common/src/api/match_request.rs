use serde::Deserialize;
use thiserror::Error;

use crate::matching::{CandidateFilters, JobFilters, RankOptions};

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;
pub const DEFAULT_MIN_SCORE: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("limit must be between 1 and 100, got {0}")]
    Limit(usize),
    #[error("min_score must be between 0 and 1, got {0}")]
    MinScore(f64),
}

/// Body of `POST /api/match-score`.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchScoreRequest {
    #[serde(default)]
    pub candidate_id: String,
    #[serde(default)]
    pub job_id: String,
}

impl MatchScoreRequest {
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.candidate_id.trim().is_empty() {
            return Err(QueryError::Missing("candidate_id"));
        }
        if self.job_id.trim().is_empty() {
            return Err(QueryError::Missing("job_id"));
        }
        Ok(())
    }
}

fn page(limit: Option<usize>, min_score: Option<f64>) -> Result<(usize, f64), QueryError> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 || limit > MAX_LIMIT {
        return Err(QueryError::Limit(limit));
    }
    let min_score = min_score.unwrap_or(DEFAULT_MIN_SCORE);
    if !(0.0..=1.0).contains(&min_score) {
        return Err(QueryError::MinScore(min_score));
    }
    Ok((limit, min_score))
}

/// Query of `GET /api/find-jobs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FindJobsQuery {
    #[serde(default)]
    pub candidate_id: String,
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
    pub min_score: Option<f64>,
    pub location: Option<String>,
    pub industry: Option<String>,
    #[serde(default)]
    pub remote_only: bool,
}

impl FindJobsQuery {
    /// Only active postings are ranked.
    pub fn to_options(&self) -> Result<RankOptions<JobFilters>, QueryError> {
        if self.candidate_id.trim().is_empty() {
            return Err(QueryError::Missing("candidate_id"));
        }
        let (limit, min_score) = page(self.limit, self.min_score)?;
        Ok(RankOptions::new(JobFilters {
            location: self.location.clone(),
            industry: self.industry.clone(),
            remote_only: self.remote_only,
            active_only: true,
        })
        .min_score(min_score)
        .limit(limit)
        .offset(self.offset))
    }
}

/// Query of `GET /api/find-candidates`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FindCandidatesQuery {
    #[serde(default)]
    pub job_id: String,
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
    pub min_score: Option<f64>,
    pub location: Option<String>,
    pub min_years: Option<f64>,
}

impl FindCandidatesQuery {
    pub fn to_options(&self) -> Result<RankOptions<CandidateFilters>, QueryError> {
        if self.job_id.trim().is_empty() {
            return Err(QueryError::Missing("job_id"));
        }
        let (limit, min_score) = page(self.limit, self.min_score)?;
        Ok(RankOptions::new(CandidateFilters {
            location: self.location.clone(),
            min_years: self.min_years,
        })
        .min_score(min_score)
        .limit(limit)
        .offset(self.offset))
    }
}
