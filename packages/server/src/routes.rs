//! HTTP surface: analysis entry point and health check.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use analysis::{AnalysisError, AnalysisPipeline, AnalysisRequest, ProgressChannel};

use crate::sse::stream_handler;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
    pub progress: ProgressChannel,
}

/// Build the axum router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/analyses", post(analyze_handler))
        .route("/api/streams/:session_id", get(stream_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Run a full analysis and return the result.
///
/// The pipeline is designed to run to completion; impatient clients follow
/// progress over the SSE stream instead of holding this request open.
async fn analyze_handler(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Response {
    match state.pipeline.run(request).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            let status = match &e {
                AnalysisError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
                AnalysisError::PrimarySite { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::BAD_GATEWAY,
            };
            tracing::error!(error = %e, "analysis failed");
            (status, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
        }
    }
}
