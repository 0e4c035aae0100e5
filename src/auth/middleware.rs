//! Authentication Middleware
//! Mission: Gate API endpoints behind a valid session token

use crate::auth::token_store::TokenStore;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// Auth middleware that validates session tokens.
///
/// Rejections are terminal for the request; the client is expected to log in
/// again rather than retry.
pub async fn auth_middleware(
    State(tokens): State<Arc<TokenStore>>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = extract_token(req.headers()).ok_or(AuthError::MissingToken)?;

    if !tokens.is_valid(&token).await {
        return Err(AuthError::InvalidToken);
    }

    Ok(next.run(req).await)
}

/// Pull the session token out of the request headers.
///
/// `x-auth-token` wins over `Authorization: Bearer` when both are present.
/// Blank values count as absent.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let from_custom_header = headers
        .get("x-auth-token")
        .and_then(|h| h.to_str().ok())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let from_authorization = || {
        headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    };

    from_custom_header.or_else(from_authorization)
}

/// Auth error types
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (error, code, message) = match self {
            AuthError::MissingToken => (
                "Authentication required",
                "NO_TOKEN",
                "Please log in to access this resource.",
            ),
            AuthError::InvalidToken => ("Invalid token", "INVALID_TOKEN", "Please log in again."),
        };

        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": error,
                "code": code,
                "message": message,
            })),
        )
            .into_response()
    }
}
