//! Analytics Endpoints

use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;

use crate::api::{ApiError, AppState};
use crate::models::MonthlyBreakdown;

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub year: Option<i32>,
}

/// GET /api/analytics/monthly?year - twelve entries, zero-filled
pub async fn monthly(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsQuery>,
) -> Result<Json<Vec<MonthlyBreakdown>>, ApiError> {
    let year = params.year.unwrap_or_else(|| Utc::now().year());
    Ok(Json(state.ledger.monthly_totals(year).await?))
}
