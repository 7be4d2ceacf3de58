use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::api::{
    CandidateMatchDto, FindCandidatesQuery, FindJobsQuery, JobMatchDto, MatchResponse,
    MatchScoreRequest, QueryError, RefitResponse,
};
use crate::cancellation::CancellationToken;
use crate::directory::{CorpusProvider, ProfileDirectory};
use crate::matching::{MatchingEngine, RankError};
use crate::semantic::SemanticError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error("candidate {0} not found")]
    CandidateNotFound(String),
    #[error("job {0} not found")]
    JobNotFound(String),
    #[error("recruiter does not own job {job_id}")]
    Forbidden { job_id: String },
    #[error(transparent)]
    InvalidQuery(#[from] QueryError),
    #[error(transparent)]
    Rank(#[from] RankError),
    #[error("model refit failed: {0}")]
    Model(#[from] SemanticError),
}

/// Resolves ids through the directory and runs the engine.
pub struct MatchService<D> {
    engine: MatchingEngine,
    directory: Arc<D>,
    lazy_fit_attempted: AtomicBool,
}

impl<D: ProfileDirectory> MatchService<D> {
    pub fn new(engine: MatchingEngine, directory: Arc<D>) -> Self {
        Self {
            engine,
            directory,
            lazy_fit_attempted: AtomicBool::new(false),
        }
    }

    pub fn engine(&self) -> &MatchingEngine {
        &self.engine
    }

    pub fn directory(&self) -> &Arc<D> {
        &self.directory
    }

    pub fn match_score(&self, request: &MatchScoreRequest) -> Result<MatchResponse, MatchError> {
        request.validate()?;
        let candidate = self
            .directory
            .candidate(&request.candidate_id)
            .ok_or_else(|| MatchError::CandidateNotFound(request.candidate_id.clone()))?;
        let job = self
            .directory
            .job(&request.job_id)
            .ok_or_else(|| MatchError::JobNotFound(request.job_id.clone()))?;

        self.ensure_model();
        let result = self.engine.score_pair(&candidate, &job);
        tracing::info!(
            candidate_id = %candidate.id,
            job_id = %job.id,
            overall_score = result.overall_score,
            semantic_method = %result.semantic_method,
            "scored pair"
        );
        Ok(MatchResponse::from_match_result(&result))
    }

    /// Active postings for one candidate, best first.
    pub fn find_jobs(
        &self,
        query: &FindJobsQuery,
        cancel: Option<CancellationToken>,
    ) -> Result<Vec<JobMatchDto>, MatchError> {
        let mut options = query.to_options()?;
        options.cancel = cancel;
        let candidate = self
            .directory
            .candidate(&query.candidate_id)
            .ok_or_else(|| MatchError::CandidateNotFound(query.candidate_id.clone()))?;

        self.ensure_model();
        let jobs = self.directory.jobs();
        let ranked = self.engine.rank_jobs(&candidate, &jobs, &options)?;
        Ok(ranked.iter().map(JobMatchDto::from).collect())
    }

    /// Candidates for a posting owned by `recruiter_id`.
    pub fn find_candidates(
        &self,
        recruiter_id: &str,
        query: &FindCandidatesQuery,
        cancel: Option<CancellationToken>,
    ) -> Result<Vec<CandidateMatchDto>, MatchError> {
        let mut options = query.to_options()?;
        options.cancel = cancel;
        let job = self
            .directory
            .job(&query.job_id)
            .ok_or_else(|| MatchError::JobNotFound(query.job_id.clone()))?;
        if job.recruiter_id.as_deref().map(str::trim) != Some(recruiter_id.trim()) {
            tracing::warn!(job_id = %job.id, recruiter_id, "candidate search on a foreign job");
            return Err(MatchError::Forbidden { job_id: job.id });
        }

        self.ensure_model();
        let candidates = self.directory.candidates();
        let ranked = self.engine.rank_candidates(&job, &candidates, &options)?;
        Ok(ranked.iter().map(CandidateMatchDto::from).collect())
    }

    /// Fits over the directory corpus and publishes the next model version.
    pub fn refit_model(&self) -> Result<RefitResponse, MatchError> {
        let fitted = self.engine.refit_corpus(&self.directory.corpus())?;
        Ok(RefitResponse::from(fitted.as_ref()))
    }

    /// First use without a published model tries one fit; a corpus that is
    /// too small leaves the Jaccard fallback in place.
    fn ensure_model(&self) {
        if self.engine.model_handle().current().is_some() {
            return;
        }
        if self.lazy_fit_attempted.swap(true, Ordering::SeqCst) {
            return;
        }
        match self.engine.refit_corpus(&self.directory.corpus()) {
            Ok(_) => {}
            Err(err @ SemanticError::CorpusTooSmall { .. }) => {
                tracing::info!(error = %err, "semantic model not fitted, using fallback");
            }
            Err(err) => tracing::warn!(error = %err, "lazy semantic fit failed"),
        }
    }
}
