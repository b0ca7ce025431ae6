use api_state::ApiState;
use axum::{
    extract::FromRef,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use middleware_api_auth::api_auth;
use routes::{
    documents::{ingest_document, query_document},
    interviews::{start_interview, submit_answer},
    knowledge::list_knowledge_bases,
    liveness::live,
    readiness::ready,
};

pub mod api_state;
pub mod error;
mod middleware_api_auth;
mod routes;

/// Router for API functionality, version 1
pub fn api_routes_v1<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    // Public, unauthenticated endpoints (probes and the read-only listing)
    let public = Router::new()
        .route("/ready", get(ready))
        .route("/live", get(live))
        .route("/knowledge-bases", get(list_knowledge_bases));

    // Protected API endpoints (require a well-formed credential)
    let protected = Router::new()
        .route("/documents", post(ingest_document))
        .route("/documents/{id}/query", post(query_document))
        .route("/interviews", post(start_interview))
        .route("/interviews/{id}/answers", post(submit_answer))
        .route_layer(from_fn(api_auth));

    public.merge(protected)
}
