use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{api_state::ApiState, error::ApiError};

/// Lists every published knowledge base with its chunk count.
pub async fn list_knowledge_bases(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    let summaries = state.knowledge.list().await;
    Ok((StatusCode::OK, Json(summaries)))
}
