use axum::{body::Bytes, extract::State, Json};
use serde_json::Value;
use tracing::instrument;

use crate::api::error::{ApiError, ApiResult};
use crate::api::types::{HealthResponse, ModelsResponse};
use crate::backend::available_runs;
use crate::generation::GenerationResult;
use crate::state::AppState;

/// Health check endpoint
///
/// GET /health
/// Response: { status, current_run_name }
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        current_run_name: state.residency().current_run_name(),
    })
}

/// Generate text from a prompt
///
/// POST /generate
/// Request: { prompt, length?, temperature?, top_p?, nsamples?, batch_size?, run_name? }
/// Response: { generated_text, parameters }
///
/// The body is taken raw so that a missing or malformed body is reported
/// through the same error envelope as every other validation failure.
#[instrument(skip(state, body), fields(body_bytes = body.len()))]
pub async fn generate_text(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<GenerationResult>> {
    let raw: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    // Model swaps and generation block; keep them off the async workers
    let generator = state.generator.clone();
    let result = tokio::task::spawn_blocking(move || generator.generate(&raw))
        .await
        .map_err(|e| ApiError::Internal(format!("Task join error: {}", e)))??;

    Ok(Json(result))
}

/// List runs available in the checkpoint directory
///
/// GET /api/models
/// Response: { models }
#[instrument(skip(state))]
pub async fn list_models(State(state): State<AppState>) -> ApiResult<Json<ModelsResponse>> {
    let dir = state.checkpoint_dir.clone();
    let models = tokio::task::spawn_blocking(move || available_runs(&dir))
        .await
        .map_err(|e| ApiError::Internal(format!("Task join error: {}", e)))?;

    Ok(Json(ModelsResponse { models }))
}
