use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use retrieval_pipeline::{answer::create_query_messages, relay::relay_fragments};

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct IngestParams {
    pub text: String,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Indexes one extracted document and returns the knowledge-base handle.
pub async fn ingest_document(
    State(state): State<ApiState>,
    Json(input): Json<IngestParams>,
) -> Result<impl IntoResponse, ApiError> {
    info!(
        text_chars = input.text.chars().count(),
        filename = input.filename.as_deref().unwrap_or("unnamed"),
        "Received ingestion request"
    );

    let source_name = input.filename.unwrap_or_else(|| "unnamed".to_string());
    let indexed = state
        .indexing
        .index_document(&state.knowledge, &source_name, &input.text)
        .await
        .map_err(ApiError::from)?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "id": indexed.id,
            "chunk_count": indexed.chunk_count,
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    pub question: String,
}

/// Answers a free-form question from one document's content, streaming the
/// reply as plain text. Faults before the first fragment map to error
/// statuses; later faults are downgraded inside the open stream.
pub async fn query_document(
    Path(id): Path<String>,
    State(state): State<ApiState>,
    Json(input): Json<QueryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let base = state
        .knowledge
        .get(&id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("knowledge base {id} not found")))?;

    let retrieved = retrieval_pipeline::retrieve(
        &base,
        &state.embedding,
        &input.question,
        state.config.retrieval_top_k,
    )
    .await
    .map_err(ApiError::from)?;

    if retrieved.is_empty() {
        return Err(ApiError::ValidationError(
            "no relevant content found for this question".to_string(),
        ));
    }

    let messages = create_query_messages(&retrieved, &input.question);
    let fragments = state
        .generator
        .stream_completion(messages)
        .await
        .map_err(ApiError::from)?;

    let body = Body::from_stream(
        relay_fragments(fragments).map(Ok::<String, std::convert::Infallible>),
    );

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    ))
}
