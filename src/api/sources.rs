//! Payment Source Endpoints

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::json;

use crate::api::{ApiError, AppState};
use crate::ledger::DeleteStatus;
use crate::models::{CatalogPayload, PaymentSource};

/// GET /api/sources - name ascending
pub async fn list_sources(
    State(state): State<AppState>,
) -> Result<Json<Vec<PaymentSource>>, ApiError> {
    Ok(Json(state.ledger.list_sources().await?))
}

/// POST /api/sources
pub async fn create_source(
    State(state): State<AppState>,
    Json(payload): Json<CatalogPayload>,
) -> Result<Json<PaymentSource>, ApiError> {
    Ok(Json(state.ledger.create_source(&payload).await?))
}

/// PUT /api/sources/:id
pub async fn update_source(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CatalogPayload>,
) -> Result<Json<PaymentSource>, ApiError> {
    state
        .ledger
        .update_source(id, &payload)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(format!("Source {} not found", id)))
}

/// DELETE /api/sources/:id - refused while expenses still reference it
pub async fn delete_source(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match state.ledger.delete_source(id).await? {
        DeleteStatus::Deleted => Ok(Json(json!({ "success": true }))),
        DeleteStatus::NotFound => Err(ApiError::NotFound(format!("Source {} not found", id))),
        DeleteStatus::InUse => Err(ApiError::Conflict(
            "Source is referenced by existing expenses".to_string(),
        )),
    }
}
