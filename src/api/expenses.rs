//! Expense Endpoints

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::api::{ApiError, AppState};
use crate::ledger::ExpenseFilter;
use crate::models::{Expense, ExpensePayload};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub category_id: Option<i64>,
    pub source_id: Option<i64>,
}

/// GET /api/expenses - newest first, optional filters
pub async fn list_expenses(
    State(state): State<AppState>,
    Query(params): Query<ExpenseQuery>,
) -> Result<Json<Vec<Expense>>, ApiError> {
    let filter = ExpenseFilter {
        start_date: params.start_date,
        end_date: params.end_date,
        category_id: params.category_id,
        source_id: params.source_id,
    };

    Ok(Json(state.ledger.list_expenses(&filter).await?))
}

/// POST /api/expenses
pub async fn create_expense(
    State(state): State<AppState>,
    Json(payload): Json<ExpensePayload>,
) -> Result<Json<Expense>, ApiError> {
    validate_payload(&state, &payload).await?;
    Ok(Json(state.ledger.create_expense(&payload).await?))
}

/// PUT /api/expenses/:id - full replacement
pub async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ExpensePayload>,
) -> Result<Json<Expense>, ApiError> {
    validate_payload(&state, &payload).await?;
    state
        .ledger
        .update_expense(id, &payload)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(format!("Expense {} not found", id)))
}

/// DELETE /api/expenses/:id
pub async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.ledger.delete_expense(id).await? {
        return Err(ApiError::NotFound(format!("Expense {} not found", id)));
    }

    Ok(Json(json!({ "success": true })))
}

async fn validate_payload(state: &AppState, payload: &ExpensePayload) -> Result<(), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }
    if !payload.amount.is_finite() || payload.amount <= 0.0 {
        return Err(ApiError::BadRequest(
            "Amount must be a positive number".to_string(),
        ));
    }
    if !payload.date_valid() {
        return Err(ApiError::BadRequest(
            "Date must be formatted YYYY-MM-DD".to_string(),
        ));
    }
    if state
        .ledger
        .get_category(payload.category_id)
        .await?
        .is_none()
    {
        return Err(ApiError::BadRequest(format!(
            "Unknown category {}",
            payload.category_id
        )));
    }
    if state.ledger.get_source(payload.source_id).await?.is_none() {
        return Err(ApiError::BadRequest(format!(
            "Unknown source {}",
            payload.source_id
        )));
    }

    Ok(())
}
