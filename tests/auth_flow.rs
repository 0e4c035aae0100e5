//! Integration tests for the authentication lifecycle
//!
//! These run the real router over temp SQLite files: login, gate admission,
//! logout, password change, and session recovery across simulated restarts.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tower::ServiceExt;

use spendbase_backend::api::{create_router, AppState};
use spendbase_backend::auth::{AuthDb, AuthState, CredentialService, TokenStore};
use spendbase_backend::ledger::LedgerDb;

const PASSWORD: &str = "correct-horse";

/// Build the full application over the given database files. Calling it a
/// second time with the same auth path simulates a process restart.
async fn build_app(ledger_path: &str, auth_path: &str) -> Router {
    let ledger = LedgerDb::new(ledger_path).unwrap();
    ledger.seed_defaults().await.unwrap();

    let auth_db = Arc::new(AuthDb::new(auth_path).unwrap());
    let hash = bcrypt::hash(PASSWORD, 4).unwrap();
    auth_db
        .seed_credential(&hash, chrono::Utc::now().timestamp())
        .await
        .unwrap();

    let tokens = Arc::new(TokenStore::new(auth_db.clone()));
    tokens.restore_from_mirror().await;
    let credentials = Arc::new(CredentialService::new(auth_db, tokens.clone()));

    create_router(
        AppState::new(ledger),
        AuthState::new(tokens, credentials),
    )
}

fn temp_files() -> (NamedTempFile, NamedTempFile) {
    (NamedTempFile::new().unwrap(), NamedTempFile::new().unwrap())
}

fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header("x-auth-token", token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn bare_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("x-auth-token", token);
    }
    builder.body(Body::empty()).unwrap()
}

async fn response_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn login(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            None,
            json!({ "password": PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_gate_rejects_missing_and_unknown_tokens() {
    let (ledger_file, auth_file) = temp_files();
    let app = build_app(
        ledger_file.path().to_str().unwrap(),
        auth_file.path().to_str().unwrap(),
    )
    .await;

    let response = app
        .clone()
        .oneshot(bare_request("GET", "/api/expenses", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["code"], "NO_TOKEN");

    let response = app
        .clone()
        .oneshot(bare_request("GET", "/api/expenses", Some("deadbeef")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["code"], "INVALID_TOKEN");

    // Bearer form is accepted too.
    let token = login(&app).await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/expenses")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let (ledger_file, auth_file) = temp_files();
    let app = build_app(
        ledger_file.path().to_str().unwrap(),
        auth_file.path().to_str().unwrap(),
    )
    .await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/login",
            None,
            json!({ "password": "battery-staple" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Invalid password");
}

#[tokio::test]
async fn test_logout_revokes_the_session() {
    let (ledger_file, auth_file) = temp_files();
    let app = build_app(
        ledger_file.path().to_str().unwrap(),
        auth_file.path().to_str().unwrap(),
    )
    .await;

    let token = login(&app).await;
    let response = app
        .clone()
        .oneshot(bare_request("GET", "/api/expenses", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(bare_request("POST", "/api/logout", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);

    let response = app
        .clone()
        .oneshot(bare_request("GET", "/api/expenses", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Logging out again, or with no token at all, still acknowledges.
    let response = app
        .clone()
        .oneshot(bare_request("POST", "/api/logout", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app
        .oneshot(bare_request("POST", "/api/logout", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_sessions_survive_a_restart() {
    let (ledger_file, auth_file) = temp_files();
    let ledger_path = ledger_file.path().to_str().unwrap();
    let auth_path = auth_file.path().to_str().unwrap();

    let app = build_app(ledger_path, auth_path).await;
    let token = login(&app).await;
    drop(app);

    let restarted = build_app(ledger_path, auth_path).await;
    let response = restarted
        .oneshot(bare_request("GET", "/api/expenses", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_revoked_session_stays_dead_after_restart() {
    let (ledger_file, auth_file) = temp_files();
    let ledger_path = ledger_file.path().to_str().unwrap();
    let auth_path = auth_file.path().to_str().unwrap();

    let app = build_app(ledger_path, auth_path).await;
    let revoked = login(&app).await;
    let kept = login(&app).await;

    let response = app
        .clone()
        .oneshot(bare_request("POST", "/api/logout", Some(&revoked)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    drop(app);

    let restarted = build_app(ledger_path, auth_path).await;

    let response = restarted
        .clone()
        .oneshot(bare_request("GET", "/api/expenses", Some(&revoked)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = restarted
        .oneshot(bare_request("GET", "/api/expenses", Some(&kept)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_change_password_flow() {
    let (ledger_file, auth_file) = temp_files();
    let app = build_app(
        ledger_file.path().to_str().unwrap(),
        auth_file.path().to_str().unwrap(),
    )
    .await;

    // The endpoint itself sits behind the gate.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/change-password",
            None,
            json!({ "currentPassword": PASSWORD, "newPassword": "battery-staple" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = login(&app).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/change-password",
            Some(&token),
            json!({ "currentPassword": "wrong-guess", "newPassword": "battery-staple" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Current password is incorrect");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/change-password",
            Some(&token),
            json!({ "currentPassword": PASSWORD, "newPassword": "short" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/change-password",
            Some(&token),
            json!({ "currentPassword": PASSWORD, "newPassword": "battery-staple" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The old credential is gone, the new one works, and the session that
    // made the change is still admitted.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            None,
            json!({ "password": PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            None,
            json!({ "password": "battery-staple" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(bare_request("GET", "/api/expenses", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_auth_status_answers_both_ways() {
    let (ledger_file, auth_file) = temp_files();
    let app = build_app(
        ledger_file.path().to_str().unwrap(),
        auth_file.path().to_str().unwrap(),
    )
    .await;

    let response = app
        .clone()
        .oneshot(bare_request("GET", "/api/auth/status", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["authenticated"], false);

    let token = login(&app).await;
    let response = app
        .oneshot(bare_request("GET", "/api/auth/status", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["message"], "Token is valid");
}
