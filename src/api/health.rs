//! Health Endpoints
//! Mission: Public probes for deployment dashboards and load balancers

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::time::Instant;

use crate::api::AppState;
use crate::ledger::TableStats;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: String,
    timestamp: String,
    response_time: String,
    database: DatabaseHealth,
    uptime: u64,
    version: String,
}

#[derive(Serialize)]
struct DatabaseHealth {
    connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<TableStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// GET /api/health - full report with row counts and uptime
pub async fn health_check(State(state): State<AppState>) -> Response {
    let probe_start = Instant::now();

    let (status_code, status, database) = match state.ledger.table_stats().await {
        Ok(stats) => (
            StatusCode::OK,
            "healthy",
            DatabaseHealth {
                connected: true,
                info: Some("SQLite (WAL)".to_string()),
                stats: Some(stats),
                error: None,
            },
        ),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "unhealthy",
            DatabaseHealth {
                connected: false,
                info: None,
                stats: None,
                error: Some(err.to_string()),
            },
        ),
    };

    let body = HealthResponse {
        status: status.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        response_time: format!("{}ms", probe_start.elapsed().as_millis()),
        database,
        uptime: state.started_at.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (status_code, Json(body)).into_response()
}

/// GET /api/health/simple - cheap load balancer probe
pub async fn simple_health(State(state): State<AppState>) -> Response {
    match state.ledger.ping().await {
        Ok(_) => Json(json!({
            "status": "ok",
            "database": "connected",
            "timestamp": Utc::now().to_rfc3339(),
        }))
        .into_response(),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "error",
                "database": "disconnected",
                "error": err.to_string(),
                "timestamp": Utc::now().to_rfc3339(),
            })),
        )
            .into_response(),
    }
}

/// GET /api/health/db - connectivity check with round-trip time
pub async fn db_test(State(state): State<AppState>) -> Response {
    let probe_start = Instant::now();

    match state.ledger.ping().await {
        Ok(result) => Json(json!({
            "connected": true,
            "responseTime": format!("{}ms", probe_start.elapsed().as_millis()),
            "test": result,
            "message": "Database connection successful",
        }))
        .into_response(),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "connected": false,
                "responseTime": format!("{}ms", probe_start.elapsed().as_millis()),
                "error": err.to_string(),
                "message": "Database connection failed",
            })),
        )
            .into_response(),
    }
}
