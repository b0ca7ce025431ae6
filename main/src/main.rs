use std::sync::Arc;

use api_router::{api_routes_v1, api_state::ApiState};
use axum::{extract::FromRef, Router};
use common::{
    storage::types::knowledge_base::GLOBAL_KNOWLEDGE_BASE_ID,
    utils::{
        config::{get_config, AppConfig},
        embedding::EmbeddingProvider,
        generation::{Generator, OpenAiGenerator, SmokeGenerator},
    },
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Corpus indexed under the global knowledge base at startup; interview
/// question customization retrieves supporting context from it.
const BUILTIN_CORPUS: &str = include_str!("../assets/architecture_corpus.md");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
    let config = get_config()?;

    let app = build_app(&config).await?;

    info!("Starting server listening on 0.0.0.0:{}", config.http_port);
    let serve_address = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(serve_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_app(config: &AppConfig) -> Result<Router, Box<dyn std::error::Error>> {
    let openai_client = Arc::new(async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    ));

    let embedding_provider = Arc::new(if config.smoke_test {
        EmbeddingProvider::new_hashed(384)?
    } else {
        EmbeddingProvider::from_config(config, Some(Arc::clone(&openai_client)))?
    });
    info!(
        embedding_backend = embedding_provider.backend_label(),
        embedding_dimension = embedding_provider.dimension(),
        "Embedding provider initialized"
    );

    let generator: Arc<dyn Generator> = if config.smoke_test {
        warn!("Smoke mode active; generation is deterministic and offline");
        Arc::new(SmokeGenerator)
    } else {
        Arc::new(OpenAiGenerator::new(
            openai_client,
            config.chat_model.clone(),
            config.generation_timeout_secs,
        ))
    };

    let api_state = ApiState::new(config.clone(), embedding_provider, generator);

    index_builtin_corpus(&api_state).await;

    Ok(Router::new()
        .nest("/api/v1", api_routes_v1())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(AppState { api_state }))
}

async fn index_builtin_corpus(state: &ApiState) {
    match state
        .indexing
        .index_document_with_id(
            &state.knowledge,
            GLOBAL_KNOWLEDGE_BASE_ID,
            "architecture_corpus.md",
            BUILTIN_CORPUS,
        )
        .await
    {
        Ok(indexed) => info!(
            chunk_count = indexed.chunk_count,
            "global corpus indexed"
        ),
        Err(e) => warn!("failed to index global corpus: {e}"),
    }
}

#[derive(Clone, FromRef)]
struct AppState {
    api_state: ApiState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use common::utils::config::AppConfig;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn smoke_test_config() -> AppConfig {
        AppConfig {
            openai_api_key: "sk-test".into(),
            http_port: 0,
            openai_base_url: "https://example.com".into(),
            smoke_test: true,
            ..AppConfig::default()
        }
    }

    async fn smoke_app() -> Router {
        build_app(&smoke_test_config())
            .await
            .expect("failed to build app")
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header("X-API-Key", "sk-test")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn response_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn smoke_startup_probes_respond() {
        let app = smoke_app().await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/live")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);

        let ready_response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/ready")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("ready response");
        assert_eq!(ready_response.status(), StatusCode::OK);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn protected_routes_reject_missing_or_malformed_credentials() {
        let app = smoke_app().await;

        let missing = Request::builder()
            .method("POST")
            .uri("/api/v1/documents")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"text": "hello"}).to_string()))
            .expect("request");
        let response = app.clone().oneshot(missing).await.expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let malformed = Request::builder()
            .method("POST")
            .uri("/api/v1/documents")
            .header(header::CONTENT_TYPE, "application/json")
            .header("X-API-Key", "not-a-key")
            .body(Body::from(json!({"text": "hello"}).to_string()))
            .expect("request");
        let response = app.oneshot(malformed).await.expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn ingest_then_query_streams_an_answer() {
        let app = smoke_app().await;

        let document_text = "Alpha Beta Gamma Delta Epsilon Zeta ".repeat(40);
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/documents",
                json!({"text": document_text, "filename": "greek.txt"}),
            ))
            .await
            .expect("ingest response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        let base_id = body
            .get("id")
            .and_then(Value::as_str)
            .expect("base id")
            .to_owned();
        assert!(body.get("chunk_count").and_then(Value::as_u64).expect("count") >= 2);

        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/api/v1/documents/{base_id}/query"),
                json!({"question": "What does Alpha relate to?"}),
            ))
            .await
            .expect("query response");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("streamed body");
        let answer = String::from_utf8(bytes.to_vec()).expect("utf8 body");
        assert!(answer.contains("Smoke response"));

        let response = app
            .oneshot(post_json(
                "/api/v1/documents/unknown-id/query",
                json!({"question": "anything"}),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn listing_reports_ingested_documents() {
        let app = smoke_app().await;

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/documents",
                json!({"text": "a short note ".repeat(100), "filename": "note.txt"}),
            ))
            .await
            .expect("ingest response");
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/knowledge-bases")
                    .header("X-API-Key", "sk-test")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("list response");
        assert_eq!(response.status(), StatusCode::OK);
        let listing = response_json(response).await;
        let entries = listing.as_array().expect("array");
        // The startup corpus plus the ingested document.
        assert!(entries.len() >= 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn interview_runs_to_completion_over_http() {
        let app = smoke_app().await;
        let session_id = uuid::Uuid::new_v4().to_string();

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/interviews",
                json!({
                    "session_id": session_id,
                    "requirements": "an appointment booking system",
                    "artifacts": ["design_document"]
                }),
            ))
            .await
            .expect("start response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body.get("progress").and_then(Value::as_u64), Some(20));
        assert!(body.get("question").and_then(Value::as_str).is_some());

        for round in 0..4 {
            let response = app
                .clone()
                .oneshot(post_json(
                    &format!("/api/v1/interviews/{session_id}/answers"),
                    json!({"answer": format!("answer {round}")}),
                ))
                .await
                .expect("answer response");
            assert_eq!(response.status(), StatusCode::OK);
            let body = response_json(response).await;
            assert!(body.get("question").and_then(Value::as_str).is_some());
        }

        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/api/v1/interviews/{session_id}/answers"),
                json!({"answer": "final answer"}),
            ))
            .await
            .expect("final response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body.get("progress").and_then(Value::as_u64), Some(100));
        assert!(body.get("question").is_none());
        let artifacts = body.get("artifacts").and_then(Value::as_object).expect("artifacts");
        assert_eq!(artifacts.len(), 1);
        assert!(artifacts.contains_key("design_document"));

        // The completed session refuses further answers.
        let response = app
            .oneshot(post_json(
                &format!("/api/v1/interviews/{session_id}/answers"),
                json!({"answer": "too late"}),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unknown_session_answer_is_not_found() {
        let app = smoke_app().await;

        let response = app
            .oneshot(post_json(
                "/api/v1/interviews/no-such-session/answers",
                json!({"answer": "hello"}),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
