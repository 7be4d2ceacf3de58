use axum::{Json, extract::State};
use serde_json::json;

use crate::SharedState;
use crate::error::ApiError;

pub async fn livez() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn readyz(State(state): State<SharedState>) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.readiness.load(std::sync::atomic::Ordering::SeqCst) {
        return Err(ApiError::ServiceUnavailable("not_ready".into()));
    }

    let (candidates, jobs) = state.service.directory().counts();
    let model_version = state.service.engine().model_handle().version();

    Ok(Json(json!({
        "status": "ok",
        "candidates": candidates,
        "jobs": jobs,
        "model_version": model_version,
        "application": env!("CARGO_PKG_NAME"),
    })))
}
