use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An expense category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub icon: String,
}

/// A payment source (wallet, bank account, card)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSource {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub icon: String,
}

/// An expense row with its category and source embedded
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub amount: f64,
    /// ISO date, YYYY-MM-DD
    pub date: String,
    pub category_id: i64,
    pub source_id: i64,
    pub category: Category,
    pub source: PaymentSource,
}

/// A monthly budget for a given year/month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub year: i32,
    pub month: u32,
    pub amount: f64,
}

/// Create/update payload for an expense
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpensePayload {
    pub title: String,
    pub description: Option<String>,
    pub amount: f64,
    pub date: String,
    pub category_id: i64,
    pub source_id: i64,
}

impl ExpensePayload {
    /// The date field must parse as a calendar date before it hits the database.
    pub fn date_valid(&self) -> bool {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").is_ok()
    }
}

/// Create/update payload for a category or payment source
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogPayload {
    pub name: String,
    pub color: String,
    pub icon: String,
}

/// Upsert payload for a monthly budget
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetPayload {
    pub year: i32,
    pub month: u32,
    pub amount: f64,
}

/// One month of the yearly analytics breakdown
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyBreakdown {
    pub month: u32,
    pub total: f64,
    pub categories: BTreeMap<String, f64>,
}
