use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use common::storage::types::knowledge_base::GLOBAL_KNOWLEDGE_BASE_ID;

use crate::api_state::ApiState;

/// Readiness probe: 200 once the startup corpus is indexed, else 503.
pub async fn ready(State(state): State<ApiState>) -> impl IntoResponse {
    match state.knowledge.get(GLOBAL_KNOWLEDGE_BASE_ID).await {
        Some(base) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "checks": { "global_corpus": base.chunk_count() }
            })),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "error",
                "checks": { "global_corpus": "missing" }
            })),
        ),
    }
}
