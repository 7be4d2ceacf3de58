use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use thiserror::Error;

use super::experience::history_years;
use super::scoring::{MatchResult, MatchScorer, MatchingConfig};
use crate::cancellation::CancellationToken;
use crate::semantic::{
    candidate_document, job_document, FittedModel, SemanticError, SemanticModelHandle,
};
use crate::{CandidateProfile, JobPosting, JobStatus, Location};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankError {
    #[error("ranking cancelled")]
    Cancelled,
}

/// Pre-filters applied to job postings before scoring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobFilters {
    /// Case-insensitive substring of the job location.
    pub location: Option<String>,
    /// Case-insensitive substring of any job domain tag.
    pub industry: Option<String>,
    /// Only roles that can be done fully remote.
    pub remote_only: bool,
    /// Skip paused and closed postings.
    pub active_only: bool,
}

impl JobFilters {
    pub fn accepts(&self, job: &JobPosting) -> bool {
        if self.active_only && job.status != JobStatus::Active {
            return false;
        }
        if self.remote_only
            && !job
                .remote_option_parsed()
                .is_some_and(|option| option.allows_full_remote())
        {
            return false;
        }
        let location_ok = normalized_needle(self.location.as_deref())
            .is_none_or(|needle| location_contains(job.location.as_ref(), &needle));
        let industry_ok = normalized_needle(self.industry.as_deref()).is_none_or(|needle| {
            job.domain_tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&needle))
        });
        location_ok && industry_ok
    }
}

/// Pre-filters applied to candidates before scoring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateFilters {
    pub location: Option<String>,
    pub min_years: Option<f64>,
}

impl CandidateFilters {
    pub fn accepts(&self, candidate: &CandidateProfile, config: &MatchingConfig) -> bool {
        let location_ok = normalized_needle(self.location.as_deref())
            .is_none_or(|needle| location_contains(candidate.location.as_ref(), &needle));
        if !location_ok {
            return false;
        }
        if let Some(min_years) = self.min_years.filter(|v| v.is_finite() && *v > 0.0) {
            let (years, _, _) = history_years(&candidate.experience, config.reference_date);
            if years < min_years {
                return false;
            }
        }
        true
    }
}

fn normalized_needle(raw: Option<&str>) -> Option<String> {
    raw.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty())
}

fn location_contains(location: Option<&Location>, needle: &str) -> bool {
    location.is_some_and(|loc| loc.display().to_lowercase().contains(needle))
}

/// Query options shared by both ranking directions.
#[derive(Debug, Clone, Default)]
pub struct RankOptions<F> {
    pub filters: F,
    pub min_score: f64,
    pub limit: Option<usize>,
    pub offset: usize,
    pub cancel: Option<CancellationToken>,
}

impl<F> RankOptions<F> {
    pub fn new(filters: F) -> Self {
        Self {
            filters,
            min_score: 0.0,
            limit: None,
            offset: 0,
            cancel: None,
        }
    }

    pub fn min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn cancel_with(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedJob<'a> {
    pub job: &'a JobPosting,
    pub result: MatchResult,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate<'a> {
    pub candidate: &'a CandidateProfile,
    pub result: MatchResult,
}

fn cmp_desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Newer first, undated last.
fn cmp_posted(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn cmp_scores(a: &MatchResult, b: &MatchResult) -> Ordering {
    cmp_desc(a.overall_score, b.overall_score)
        .then_with(|| cmp_desc(a.components.experience, b.components.experience))
        .then_with(|| cmp_desc(a.components.skills, b.components.skills))
}

fn paginate<T>(ranked: Vec<T>, offset: usize, limit: Option<usize>) -> Vec<T> {
    ranked
        .into_iter()
        .skip(offset)
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

/// Scorer plus the shared semantic model.
#[derive(Debug, Clone)]
pub struct MatchingEngine {
    scorer: MatchScorer,
    model: Arc<SemanticModelHandle>,
}

impl MatchingEngine {
    pub fn new(config: MatchingConfig) -> Self {
        Self::with_model_handle(config, Arc::new(SemanticModelHandle::new()))
    }

    pub fn with_model_handle(config: MatchingConfig, model: Arc<SemanticModelHandle>) -> Self {
        Self {
            scorer: MatchScorer::new(config),
            model,
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        self.scorer.config()
    }

    pub fn model_handle(&self) -> &Arc<SemanticModelHandle> {
        &self.model
    }

    pub fn score_pair(&self, candidate: &CandidateProfile, job: &JobPosting) -> MatchResult {
        let snapshot = self.model.current();
        self.scorer.score(candidate, job, snapshot.as_deref())
    }

    /// Fits a model over every candidate and job document and publishes it.
    pub fn refit_model(
        &self,
        candidates: &[CandidateProfile],
        jobs: &[JobPosting],
    ) -> Result<Arc<FittedModel>, SemanticError> {
        let corpus: Vec<String> = candidates
            .iter()
            .map(candidate_document)
            .chain(jobs.iter().map(job_document))
            .filter(|document| !document.trim().is_empty())
            .collect();
        self.refit_corpus(&corpus)
    }

    pub fn refit_corpus(&self, corpus: &[String]) -> Result<Arc<FittedModel>, SemanticError> {
        self.model.refit(corpus, &self.config().semantic)
    }

    pub fn rank_jobs_for_candidate<'a>(
        &self,
        candidate: &CandidateProfile,
        jobs: &'a [JobPosting],
        filters: &JobFilters,
        min_score: f64,
        limit: usize,
    ) -> Vec<RankedJob<'a>> {
        let options = RankOptions::new(filters.clone())
            .min_score(min_score)
            .limit(limit);
        // Without a token the ranking cannot be cancelled.
        self.rank_jobs(candidate, jobs, &options).unwrap_or_default()
    }

    pub fn rank_candidates_for_job<'a>(
        &self,
        job: &JobPosting,
        candidates: &'a [CandidateProfile],
        filters: &CandidateFilters,
        min_score: f64,
        limit: usize,
    ) -> Vec<RankedCandidate<'a>> {
        let options = RankOptions::new(filters.clone())
            .min_score(min_score)
            .limit(limit);
        self.rank_candidates(job, candidates, &options).unwrap_or_default()
    }

    /// Scores `jobs` in parallel and returns the requested page, ordered by
    /// overall score, then experience, skills, recency and job id.
    pub fn rank_jobs<'a>(
        &self,
        candidate: &CandidateProfile,
        jobs: &'a [JobPosting],
        options: &RankOptions<JobFilters>,
    ) -> Result<Vec<RankedJob<'a>>, RankError> {
        let snapshot = self.model.current();
        let scored = score_pool(
            jobs,
            options,
            |job| job.id.as_str(),
            |job| options.filters.accepts(job),
            |job| self.scorer.score(candidate, job, snapshot.as_deref()),
        )?;

        let mut ranked: Vec<RankedJob<'a>> = scored
            .into_iter()
            .map(|(job, result)| RankedJob { job, result })
            .collect();
        ranked.sort_by(|a, b| {
            cmp_scores(&a.result, &b.result)
                .then_with(|| cmp_posted(a.job.posted_at, b.job.posted_at))
                .then_with(|| a.job.id.cmp(&b.job.id))
        });

        tracing::debug!(
            candidate_id = %candidate.id,
            pool = jobs.len(),
            matched = ranked.len(),
            "ranked jobs for candidate"
        );
        Ok(paginate(ranked, options.offset, options.limit))
    }

    /// Scores `candidates` in parallel; ties resolve by experience, skills,
    /// then candidate id.
    pub fn rank_candidates<'a>(
        &self,
        job: &JobPosting,
        candidates: &'a [CandidateProfile],
        options: &RankOptions<CandidateFilters>,
    ) -> Result<Vec<RankedCandidate<'a>>, RankError> {
        let snapshot = self.model.current();
        let config = self.config();
        let scored = score_pool(
            candidates,
            options,
            |candidate| candidate.id.as_str(),
            |candidate| options.filters.accepts(candidate, config),
            |candidate| self.scorer.score(candidate, job, snapshot.as_deref()),
        )?;

        let mut ranked: Vec<RankedCandidate<'a>> = scored
            .into_iter()
            .map(|(candidate, result)| RankedCandidate { candidate, result })
            .collect();
        ranked.sort_by(|a, b| {
            cmp_scores(&a.result, &b.result).then_with(|| a.candidate.id.cmp(&b.candidate.id))
        });

        tracing::debug!(
            job_id = %job.id,
            pool = candidates.len(),
            matched = ranked.len(),
            "ranked candidates for job"
        );
        Ok(paginate(ranked, options.offset, options.limit))
    }
}

/// Parallel filter → score → min-score pass shared by both directions.
fn score_pool<'a, T, F, Id, Accept, Score>(
    pool: &'a [T],
    options: &RankOptions<F>,
    id_of: Id,
    accept: Accept,
    score: Score,
) -> Result<Vec<(&'a T, MatchResult)>, RankError>
where
    T: Sync,
    F: Sync,
    Id: Fn(&T) -> &str + Sync,
    Accept: Fn(&T) -> bool + Sync,
    Score: Fn(&T) -> MatchResult + Sync,
{
    if options.is_cancelled() {
        return Err(RankError::Cancelled);
    }

    let scored: Vec<Option<(&'a T, MatchResult)>> = pool
        .par_iter()
        .map(|item| {
            if options.is_cancelled() {
                return Err(RankError::Cancelled);
            }
            let id = id_of(item);
            if id.trim().is_empty() {
                tracing::warn!("skipping pool entry without id");
                return Ok(None);
            }
            if !accept(item) {
                return Ok(None);
            }
            let result = score(item);
            if !result.is_finite() {
                tracing::warn!(id, "skipping pool entry with non-finite score");
                return Ok(None);
            }
            if result.overall_score < options.min_score {
                return Ok(None);
            }
            Ok(Some((item, result)))
        })
        .collect::<Result<_, RankError>>()?;

    if options.is_cancelled() {
        return Err(RankError::Cancelled);
    }

    Ok(scored.into_iter().flatten().collect())
}
