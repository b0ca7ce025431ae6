use axum::{extract::Request, middleware::Next, response::Response};

use common::error::AppError;

use crate::error::ApiError;

/// Prefix every accepted credential must carry.
pub const CREDENTIAL_PREFIX: &str = "sk-";

/// Presence-and-format check on the caller credential; nothing is looked up
/// and the credential is never forwarded to collaborators.
pub async fn api_auth(request: Request, next: Next) -> Result<Response, ApiError> {
    let credential = extract_api_key(&request)
        .ok_or_else(|| ApiError::Unauthorized("Missing API credential".to_string()))?;

    validate_credential(&credential).map_err(ApiError::from)?;

    Ok(next.run(request).await)
}

pub fn validate_credential(credential: &str) -> Result<(), AppError> {
    let credential = credential.trim();
    if credential.is_empty() {
        return Err(AppError::Auth("API credential must not be empty".into()));
    }
    if !credential.starts_with(CREDENTIAL_PREFIX) {
        return Err(AppError::Auth(format!(
            "API credential must start with '{CREDENTIAL_PREFIX}'"
        )));
    }
    Ok(())
}

fn extract_api_key(request: &Request) -> Option<String> {
    extract_api_key_from_headers(request.headers())
}

pub fn extract_api_key_from_headers(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get("Authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|auth| auth.strip_prefix("Bearer ").map(str::trim))
        })
        .map(String::from)
}
