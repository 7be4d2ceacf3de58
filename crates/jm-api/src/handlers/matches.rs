use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Query, State},
};
use jm_common::api::{
    CandidateMatchDto, FindCandidatesQuery, FindJobsQuery, JobMatchDto, MatchResponse,
    MatchScoreRequest, RefitResponse,
};
use jm_common::cancellation::CancellationToken;
use jm_common::service::MatchError;

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::pagination::validate_offset;

/// Cancels the ranking when the request future is dropped.
struct CancelOnDrop(CancellationToken);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Runs CPU-bound engine work off the async runtime.
async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, MatchError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ApiError::Internal(format!("matching task failed: {err}")))?
        .map_err(ApiError::from)
}

pub async fn match_score(
    State(state): State<SharedState>,
    _auth: AuthUser,
    request: Result<Json<MatchScoreRequest>, JsonRejection>,
) -> Result<Json<MatchResponse>, ApiError> {
    let Json(request) = request.map_err(|err| ApiError::BadRequest(err.body_text()))?;
    let service = state.service.clone();
    let response = run_blocking(move || service.match_score(&request)).await?;
    Ok(Json(response))
}

pub async fn find_jobs(
    State(state): State<SharedState>,
    _auth: AuthUser,
    query: Result<Query<FindJobsQuery>, QueryRejection>,
) -> Result<Json<Vec<JobMatchDto>>, ApiError> {
    let Query(query) = query.map_err(|err| ApiError::BadRequest(err.body_text()))?;
    validate_offset(query.offset)?;

    let token = CancellationToken::new();
    let _guard = CancelOnDrop(token.clone());
    let service = state.service.clone();
    let matches = run_blocking(move || service.find_jobs(&query, Some(token))).await?;
    Ok(Json(matches))
}

pub async fn find_candidates(
    State(state): State<SharedState>,
    auth: AuthUser,
    query: Result<Query<FindCandidatesQuery>, QueryRejection>,
) -> Result<Json<Vec<CandidateMatchDto>>, ApiError> {
    let recruiter_id = auth.recruiter_id()?.to_string();
    let Query(query) = query.map_err(|err| ApiError::BadRequest(err.body_text()))?;
    validate_offset(query.offset)?;

    let token = CancellationToken::new();
    let _guard = CancelOnDrop(token.clone());
    let service = state.service.clone();
    let matches =
        run_blocking(move || service.find_candidates(&recruiter_id, &query, Some(token))).await?;
    Ok(Json(matches))
}

pub async fn refit(
    State(state): State<SharedState>,
    _auth: AuthUser,
) -> Result<Json<RefitResponse>, ApiError> {
    let service = state.service.clone();
    let response = run_blocking(move || service.refit_model()).await?;
    Ok(Json(response))
}
