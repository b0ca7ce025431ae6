use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use common::storage::types::artifact::ArtifactKind;

use crate::{
    api_state::ApiState, error::ApiError, middleware_api_auth::extract_api_key_from_headers,
};

#[derive(Debug, Deserialize)]
pub struct StartInterviewParams {
    pub session_id: String,
    pub requirements: String,
    #[serde(default)]
    pub artifacts: Option<Vec<ArtifactKind>>,
}

/// Opens an interview session and returns the first question.
pub async fn start_interview(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(input): Json<StartInterviewParams>,
) -> Result<impl IntoResponse, ApiError> {
    info!(session_id = %input.session_id, "Starting interview session");

    // Format was already checked by the middleware.
    let credential = extract_api_key_from_headers(&headers).unwrap_or_default();

    let step = state
        .interviews
        .start(
            input.session_id,
            input.requirements,
            credential,
            input.artifacts,
        )
        .await
        .map_err(ApiError::from)?;

    Ok((StatusCode::OK, Json(step)))
}

#[derive(Debug, Deserialize)]
pub struct AnswerParams {
    pub answer: String,
}

/// Accepts one answer: returns the next question, or the artifact bundle once
/// the final round is reached.
pub async fn submit_answer(
    Path(session_id): Path<String>,
    State(state): State<ApiState>,
    Json(input): Json<AnswerParams>,
) -> Result<impl IntoResponse, ApiError> {
    let step = state
        .interviews
        .answer(&session_id, &input.answer)
        .await
        .map_err(ApiError::from)?;

    Ok((StatusCode::OK, Json(step)))
}
