//! Authentication API Endpoints
//! Mission: Login, logout, password change, and session status over the token store

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::credentials::CredentialService;
use crate::auth::middleware::extract_token;
use crate::auth::models::{
    AuthAck, AuthStatusResponse, ChangePasswordRequest, LoginRequest, LoginResponse,
};
use crate::auth::token_store::TokenStore;

/// Shared authentication state
#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenStore>,
    pub credentials: Arc<CredentialService>,
}

impl AuthState {
    pub fn new(tokens: Arc<TokenStore>, credentials: Arc<CredentialService>) -> Self {
        Self {
            tokens,
            credentials,
        }
    }
}

/// Login endpoint - POST /api/login
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthApiError> {
    info!("🔐 Login attempt");

    let session = state.credentials.login(&payload.password).await?;

    let Some(session) = session else {
        warn!("❌ Failed login attempt: invalid password");
        return Err(AuthApiError::InvalidPassword);
    };

    info!(
        "✅ Login successful, {} active session(s)",
        state.tokens.live_count()
    );

    Ok(Json(LoginResponse {
        success: true,
        token: session.token,
        message: "Login successful - no timeout, logout only on sign out".to_string(),
    }))
}

/// Logout endpoint - POST /api/logout
///
/// Acknowledges unconditionally. A missing or already-revoked token still
/// gets a success response so clients can always clear their local state.
pub async fn logout(State(state): State<AuthState>, headers: HeaderMap) -> Json<AuthAck> {
    if let Some(token) = extract_token(&headers) {
        if state.credentials.logout(&token).await {
            info!(
                "👋 Logged out, {} active session(s)",
                state.tokens.live_count()
            );
        }
    }

    Json(AuthAck {
        success: true,
        message: "Logged out successfully".to_string(),
    })
}

/// Change password endpoint - POST /api/change-password (requires auth)
pub async fn change_password(
    State(state): State<AuthState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<AuthAck>, AuthApiError> {
    if payload.new_password.len() < 8 {
        return Err(AuthApiError::WeakPassword);
    }

    let changed = state
        .credentials
        .change_password(&payload.current_password, &payload.new_password)
        .await?;

    if !changed {
        warn!("❌ Password change rejected: current password incorrect");
        return Err(AuthApiError::CurrentPasswordIncorrect);
    }

    Ok(Json(AuthAck {
        success: true,
        message: "Password changed successfully.".to_string(),
    }))
}

/// Session status endpoint - GET /api/auth/status
///
/// Responds 200 whether or not the token checks out so dashboards can poll
/// it without tripping HTTP error handling.
pub async fn auth_status(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Json<AuthStatusResponse> {
    let authenticated = match extract_token(&headers) {
        Some(token) => state.tokens.is_valid(&token).await,
        None => false,
    };

    let message = if authenticated {
        "Token is valid"
    } else {
        "No valid token found"
    };

    Json(AuthStatusResponse {
        authenticated,
        message: message.to_string(),
    })
}

// ===== Error Handling =====

#[derive(Debug)]
pub enum AuthApiError {
    InvalidPassword,
    CurrentPasswordIncorrect,
    WeakPassword,
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for AuthApiError {
    fn from(err: anyhow::Error) -> Self {
        AuthApiError::Internal(err)
    }
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthApiError::InvalidPassword => (StatusCode::UNAUTHORIZED, "Invalid password"),
            AuthApiError::CurrentPasswordIncorrect => {
                (StatusCode::UNAUTHORIZED, "Current password is incorrect")
            }
            AuthApiError::WeakPassword => (
                StatusCode::BAD_REQUEST,
                "Password must be at least 8 characters",
            ),
            AuthApiError::Internal(err) => {
                tracing::error!("Auth error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::AuthDb;
    use axum::http::HeaderValue;
    use tempfile::NamedTempFile;

    async fn test_state() -> (AuthState, NamedTempFile) {
        let tmp = NamedTempFile::new().unwrap();
        let auth_db = Arc::new(AuthDb::new(tmp.path().to_str().unwrap()).unwrap());

        let hash = bcrypt::hash("correct-horse", 4).unwrap();
        auth_db
            .seed_credential(&hash, chrono::Utc::now().timestamp())
            .await
            .unwrap();

        let tokens = Arc::new(TokenStore::new(auth_db.clone()));
        let credentials = Arc::new(CredentialService::new(auth_db, tokens.clone()));

        (AuthState::new(tokens, credentials), tmp)
    }

    fn token_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-auth-token", HeaderValue::from_str(token).unwrap());
        headers
    }

    #[tokio::test]
    async fn test_login_issues_session_and_rejects_bad_password() {
        let (state, _tmp) = test_state().await;

        let ok = login(
            State(state.clone()),
            Json(LoginRequest {
                password: "correct-horse".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(ok.0.success);
        assert_eq!(ok.0.token.len(), 64);
        assert!(state.tokens.is_valid(&ok.0.token).await);

        let err = login(
            State(state.clone()),
            Json(LoginRequest {
                password: "battery-staple".to_string(),
            }),
        )
        .await;
        assert!(matches!(err, Err(AuthApiError::InvalidPassword)));
    }

    #[tokio::test]
    async fn test_logout_acks_with_and_without_token() {
        let (state, _tmp) = test_state().await;
        let session = state.tokens.issue().await;

        let ack = logout(State(state.clone()), token_headers(&session.token)).await;
        assert!(ack.0.success);
        assert!(!state.tokens.is_valid(&session.token).await);

        // No token at all still acknowledges.
        let ack = logout(State(state.clone()), HeaderMap::new()).await;
        assert!(ack.0.success);
        assert_eq!(ack.0.message, "Logged out successfully");
    }

    #[tokio::test]
    async fn test_auth_status_reflects_token_validity() {
        let (state, _tmp) = test_state().await;
        let session = state.tokens.issue().await;

        let live = auth_status(State(state.clone()), token_headers(&session.token)).await;
        assert!(live.0.authenticated);
        assert_eq!(live.0.message, "Token is valid");

        let missing = auth_status(State(state.clone()), HeaderMap::new()).await;
        assert!(!missing.0.authenticated);
        assert_eq!(missing.0.message, "No valid token found");

        let bogus = auth_status(State(state), token_headers("deadbeef")).await;
        assert!(!bogus.0.authenticated);
    }

    #[tokio::test]
    async fn test_change_password_validation_and_flow() {
        let (state, _tmp) = test_state().await;

        let weak = change_password(
            State(state.clone()),
            Json(ChangePasswordRequest {
                current_password: "correct-horse".to_string(),
                new_password: "short".to_string(),
            }),
        )
        .await;
        assert!(matches!(weak, Err(AuthApiError::WeakPassword)));

        let wrong = change_password(
            State(state.clone()),
            Json(ChangePasswordRequest {
                current_password: "battery-staple".to_string(),
                new_password: "a-much-longer-one".to_string(),
            }),
        )
        .await;
        assert!(matches!(wrong, Err(AuthApiError::CurrentPasswordIncorrect)));

        let ok = change_password(
            State(state.clone()),
            Json(ChangePasswordRequest {
                current_password: "correct-horse".to_string(),
                new_password: "battery-staple".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(ok.0.success);

        // The new credential works for the next login.
        let relogin = login(
            State(state),
            Json(LoginRequest {
                password: "battery-staple".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(relogin.0.success);
    }

    #[tokio::test]
    async fn test_error_responses_carry_json_error_body() {
        let cases = [
            (AuthApiError::InvalidPassword, StatusCode::UNAUTHORIZED),
            (
                AuthApiError::CurrentPasswordIncorrect,
                StatusCode::UNAUTHORIZED,
            ),
            (AuthApiError::WeakPassword, StatusCode::BAD_REQUEST),
            (
                AuthApiError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let response = err.into_response();
            assert_eq!(response.status(), expected);

            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert!(body.get("error").is_some());
        }
    }
}
