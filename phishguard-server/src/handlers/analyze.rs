//! Analysis endpoint

use crate::error::{AppError, AppResult};
use crate::models::{AnalyzeRequest, AnalyzeResponse};
use crate::AppState;
use axum::{extract::State, Json};
use phishguard_core::{SignalAggregator, UnifiedVerdict};
use std::sync::Arc;

/// POST /api/v1/analyze
pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> AppResult<Json<AnalyzeResponse>> {
    if request.is_empty() {
        return Err(AppError::ValidationError(
            "request must carry text, urls or images".to_string(),
        ));
    }

    let verdict = run_analysis(state.engine.clone(), request).await?;
    Ok(Json(verdict.into()))
}

/// The engine is synchronous and CPU-bound; run it on the blocking pool
/// so a slow collaborator call cannot stall unrelated requests.
pub(crate) async fn run_analysis(
    engine: Arc<SignalAggregator>,
    request: AnalyzeRequest,
) -> AppResult<UnifiedVerdict> {
    tokio::task::spawn_blocking(move || {
        engine.analyze(&request.text, &request.urls, &request.images_b64)
    })
    .await
    .map_err(|e| AppError::InternalError(format!("analysis task failed: {}", e)))
}
