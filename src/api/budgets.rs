//! Budget Endpoints

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::json;

use crate::api::{ApiError, AppState};
use crate::models::{Budget, BudgetPayload};

/// GET /api/budget/:year/:month
///
/// An unset budget answers `{"amount": 0}` rather than 404 so the frontend
/// can render the month without a special case.
pub async fn get_budget(
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match state.ledger.get_budget(year, month).await? {
        Some(budget) => {
            let value = serde_json::to_value(budget).map_err(anyhow::Error::from)?;
            Ok(Json(value))
        }
        None => Ok(Json(json!({ "amount": 0 }))),
    }
}

/// POST /api/budget - upsert on the (year, month) pair
pub async fn upsert_budget(
    State(state): State<AppState>,
    Json(payload): Json<BudgetPayload>,
) -> Result<Json<Budget>, ApiError> {
    if !(1..=12).contains(&payload.month) {
        return Err(ApiError::BadRequest(
            "Month must be between 1 and 12".to_string(),
        ));
    }

    Ok(Json(state.ledger.upsert_budget(&payload).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerDb;
    use tempfile::NamedTempFile;

    async fn test_state() -> (AppState, NamedTempFile) {
        let tmp = NamedTempFile::new().unwrap();
        let ledger = LedgerDb::new(tmp.path().to_str().unwrap()).unwrap();
        (AppState::new(ledger), tmp)
    }

    #[tokio::test]
    async fn test_unset_budget_answers_zero_amount() {
        let (state, _tmp) = test_state().await;

        let body = get_budget(State(state), Path((2024, 7))).await.unwrap();
        assert_eq!(body.0, json!({ "amount": 0 }));
    }

    #[tokio::test]
    async fn test_upsert_validates_month() {
        let (state, _tmp) = test_state().await;

        let err = upsert_budget(
            State(state.clone()),
            Json(BudgetPayload {
                year: 2024,
                month: 13,
                amount: 100.0,
            }),
        )
        .await;
        assert!(matches!(err, Err(ApiError::BadRequest(_))));

        let ok = upsert_budget(
            State(state.clone()),
            Json(BudgetPayload {
                year: 2024,
                month: 7,
                amount: 100.0,
            }),
        )
        .await
        .unwrap();
        assert_eq!(ok.0.amount, 100.0);

        let body = get_budget(State(state), Path((2024, 7))).await.unwrap();
        assert_eq!(body.0.get("amount"), Some(&json!(100.0)));
    }
}
