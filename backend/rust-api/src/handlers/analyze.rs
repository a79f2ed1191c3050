use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    extractors::{api_error, AppJson},
    models::analysis::AnalyzeRequest,
    services::AppState,
};

/// POST /analyze
///
/// A well-formed request always gets 200: provider and parse failures are
/// absorbed into the fallback response.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<AnalyzeRequest>,
) -> Response {
    if let Err(e) = req.validate() {
        tracing::warn!("Analyze request failed validation: {}", e);
        return api_error(StatusCode::BAD_REQUEST, format!("Validation error: {}", e));
    }

    tracing::info!(
        title = %req.task_context.title,
        language = %req.work_state.language,
        elapsed_sec = ?req.work_state.elapsed_sec,
        "Analyzing work state"
    );

    let response = state.analysis.analyze(&req).await;

    tracing::debug!(
        status = response.status.as_str(),
        confidence = response.confidence,
        "Analysis ready"
    );

    (StatusCode::OK, Json(response)).into_response()
}
