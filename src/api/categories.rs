//! Category Endpoints

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::json;

use crate::api::{ApiError, AppState};
use crate::ledger::DeleteStatus;
use crate::models::{CatalogPayload, Category};

/// GET /api/categories - name ascending
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.ledger.list_categories().await?))
}

/// POST /api/categories
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CatalogPayload>,
) -> Result<Json<Category>, ApiError> {
    Ok(Json(state.ledger.create_category(&payload).await?))
}

/// PUT /api/categories/:id
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CatalogPayload>,
) -> Result<Json<Category>, ApiError> {
    state
        .ledger
        .update_category(id, &payload)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(format!("Category {} not found", id)))
}

/// DELETE /api/categories/:id - refused while expenses still reference it
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match state.ledger.delete_category(id).await? {
        DeleteStatus::Deleted => Ok(Json(json!({ "success": true }))),
        DeleteStatus::NotFound => Err(ApiError::NotFound(format!("Category {} not found", id))),
        DeleteStatus::InUse => Err(ApiError::Conflict(
            "Category is referenced by existing expenses".to_string(),
        )),
    }
}
