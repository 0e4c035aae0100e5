//! REST API Module
//! Mission: HTTP surface for the expense ledger behind the auth gate

pub mod analytics;
pub mod budgets;
pub mod categories;
pub mod expenses;
pub mod health;
pub mod sources;

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use serde_json::json;
use std::time::Instant;
use tower_http::cors::CorsLayer;

use crate::auth::api as auth_api;
use crate::auth::{auth_middleware, AuthState};
use crate::ledger::LedgerDb;
use crate::middleware::logging::request_logging_simple;

/// Shared application state for the ledger handlers
#[derive(Clone)]
pub struct AppState {
    pub ledger: LedgerDb,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(ledger: LedgerDb) -> Self {
        Self {
            ledger,
            started_at: Instant::now(),
        }
    }
}

/// Assemble the application router: public health and login routes, then
/// the ledger surface behind the token gate.
pub fn create_router(state: AppState, auth: AuthState) -> Router {
    let tokens = auth.tokens.clone();

    let public = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/simple", get(health::simple_health))
        .route("/api/health/db", get(health::db_test))
        .with_state(state.clone());

    let auth_public = Router::new()
        .route("/api/login", post(auth_api::login))
        .route("/api/logout", post(auth_api::logout))
        .route("/api/auth/status", get(auth_api::auth_status))
        .with_state(auth.clone());

    let auth_protected = Router::new()
        .route("/api/change-password", post(auth_api::change_password))
        .route_layer(middleware::from_fn_with_state(
            tokens.clone(),
            auth_middleware,
        ))
        .with_state(auth);

    let protected = Router::new()
        .route(
            "/api/expenses",
            get(expenses::list_expenses).post(expenses::create_expense),
        )
        .route(
            "/api/expenses/:id",
            put(expenses::update_expense).delete(expenses::delete_expense),
        )
        .route(
            "/api/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/api/categories/:id",
            put(categories::update_category).delete(categories::delete_category),
        )
        .route(
            "/api/sources",
            get(sources::list_sources).post(sources::create_source),
        )
        .route(
            "/api/sources/:id",
            put(sources::update_source).delete(sources::delete_source),
        )
        .route("/api/budget/:year/:month", get(budgets::get_budget))
        .route("/api/budget", post(budgets::upsert_budget))
        .route("/api/analytics/monthly", get(analytics::monthly))
        .route_layer(middleware::from_fn_with_state(tokens, auth_middleware))
        .with_state(state);

    Router::new()
        .merge(public)
        .merge(auth_public)
        .merge(auth_protected)
        .merge(protected)
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(request_logging_simple))
}

// ===== Error Handling =====

#[derive(Debug)]
pub enum ApiError {
    Database(anyhow::Error),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Database(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
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

    #[test]
    fn test_error_conversion() {
        let err = anyhow::anyhow!("Test error");
        let api_err: ApiError = err.into();

        match api_err {
            ApiError::Database(_) => (),
            _ => panic!("Expected Database error"),
        }
    }

    #[tokio::test]
    async fn test_conflict_maps_to_409() {
        let response = ApiError::Conflict("in use".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
