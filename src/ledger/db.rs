//! Ledger Database
//! Mission: Expenses, categories, payment sources, and budgets in SQLite

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use rusqlite::{params, Connection, ToSql};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::models::{
    Budget, BudgetPayload, CatalogPayload, Category, Expense, ExpensePayload, MonthlyBreakdown,
    PaymentSource,
};

/// Starter categories for a fresh database
const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Food", "#EF4444", "🍔"),
    ("Transport", "#F59E0B", "🚗"),
    ("Shopping", "#8B5CF6", "🛒"),
    ("Entertainment", "#06B6D4", "🎬"),
    ("Health", "#10B981", "🏥"),
    ("Other", "#6B7280", "📦"),
];

/// Starter payment sources for a fresh database
const DEFAULT_SOURCES: &[(&str, &str, &str)] = &[
    ("Wallet", "#84CC16", "👛"),
    ("Bank", "#3B82F6", "🏦"),
    ("E-Wallet", "#F59E0B", "📱"),
    ("Credit Card", "#EF4444", "💳"),
];

const EXPENSE_SELECT: &str = "SELECT e.id, e.title, e.description, e.amount, e.date, \
     e.category_id, e.source_id, \
     c.name, c.color, c.icon, \
     s.name, s.color, s.icon \
     FROM expenses e \
     JOIN categories c ON c.id = e.category_id \
     JOIN sources s ON s.id = e.source_id";

/// Filters for expense listing. The date bounds only apply when both ends are set.
#[derive(Debug, Default, Clone)]
pub struct ExpenseFilter {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub category_id: Option<i64>,
    pub source_id: Option<i64>,
}

/// Outcome of a catalog row delete
#[derive(Debug, PartialEq, Eq)]
pub enum DeleteStatus {
    Deleted,
    NotFound,
    /// Still referenced by at least one expense
    InUse,
}

/// Row counts reported by the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct TableStats {
    pub categories: i64,
    pub sources: i64,
    pub expenses: i64,
    pub budgets: i64,
}

#[derive(Clone)]
pub struct LedgerDb {
    conn: Arc<Mutex<Connection>>,
}

impl LedgerDb {
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).context("open ledger db")?;
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();
        conn.pragma_update(None, "foreign_keys", "ON").ok();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                color TEXT NOT NULL,
                icon TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS sources (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                color TEXT NOT NULL,
                icon TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS expenses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT,
                amount REAL NOT NULL,
                date TEXT NOT NULL,
                category_id INTEGER NOT NULL REFERENCES categories(id),
                source_id INTEGER NOT NULL REFERENCES sources(id)
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date DESC)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_expenses_category ON expenses(category_id)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_expenses_source ON expenses(source_id)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS budgets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                year INTEGER NOT NULL,
                month INTEGER NOT NULL,
                amount REAL NOT NULL,
                UNIQUE(year, month)
            )",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Populate the starter catalog on first run. Existing rows are left alone.
    pub async fn seed_defaults(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        let category_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        if category_count == 0 {
            for (name, color, icon) in DEFAULT_CATEGORIES {
                conn.execute(
                    "INSERT INTO categories (name, color, icon) VALUES (?1, ?2, ?3)",
                    params![name, color, icon],
                )?;
            }
            info!("📊 Seeded {} default categories", DEFAULT_CATEGORIES.len());
        }

        let source_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM sources", [], |row| row.get(0))?;
        if source_count == 0 {
            for (name, color, icon) in DEFAULT_SOURCES {
                conn.execute(
                    "INSERT INTO sources (name, color, icon) VALUES (?1, ?2, ?3)",
                    params![name, color, icon],
                )?;
            }
            info!("📊 Seeded {} default payment sources", DEFAULT_SOURCES.len());
        }

        Ok(())
    }

    // ===== Categories =====

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn.lock().await;
        let mut stmt =
            conn.prepare_cached("SELECT id, name, color, icon FROM categories ORDER BY name ASC")?;

        let rows = stmt
            .query_map([], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    color: row.get(2)?,
                    icon: row.get(3)?,
                })
            })?
            .filter_map(|r| r.ok());

        Ok(rows.collect())
    }

    pub async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let conn = self.conn.lock().await;
        let mut stmt =
            conn.prepare_cached("SELECT id, name, color, icon FROM categories WHERE id = ?1")?;
        let mut rows = stmt.query(params![id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        Ok(Some(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            color: row.get(2)?,
            icon: row.get(3)?,
        }))
    }

    pub async fn create_category(&self, payload: &CatalogPayload) -> Result<Category> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO categories (name, color, icon) VALUES (?1, ?2, ?3)",
            params![&payload.name, &payload.color, &payload.icon],
        )?;
        Ok(Category {
            id: conn.last_insert_rowid(),
            name: payload.name.clone(),
            color: payload.color.clone(),
            icon: payload.icon.clone(),
        })
    }

    pub async fn update_category(
        &self,
        id: i64,
        payload: &CatalogPayload,
    ) -> Result<Option<Category>> {
        let conn = self.conn.lock().await;
        let updated = conn.execute(
            "UPDATE categories SET name = ?1, color = ?2, icon = ?3 WHERE id = ?4",
            params![&payload.name, &payload.color, &payload.icon, id],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        Ok(Some(Category {
            id,
            name: payload.name.clone(),
            color: payload.color.clone(),
            icon: payload.icon.clone(),
        }))
    }

    pub async fn delete_category(&self, id: i64) -> Result<DeleteStatus> {
        let conn = self.conn.lock().await;
        let in_use: i64 = conn.query_row(
            "SELECT COUNT(*) FROM expenses WHERE category_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        if in_use > 0 {
            return Ok(DeleteStatus::InUse);
        }

        let deleted = conn.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        if deleted == 0 {
            Ok(DeleteStatus::NotFound)
        } else {
            Ok(DeleteStatus::Deleted)
        }
    }

    // ===== Payment Sources =====

    pub async fn list_sources(&self) -> Result<Vec<PaymentSource>> {
        let conn = self.conn.lock().await;
        let mut stmt =
            conn.prepare_cached("SELECT id, name, color, icon FROM sources ORDER BY name ASC")?;

        let rows = stmt
            .query_map([], |row| {
                Ok(PaymentSource {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    color: row.get(2)?,
                    icon: row.get(3)?,
                })
            })?
            .filter_map(|r| r.ok());

        Ok(rows.collect())
    }

    pub async fn get_source(&self, id: i64) -> Result<Option<PaymentSource>> {
        let conn = self.conn.lock().await;
        let mut stmt =
            conn.prepare_cached("SELECT id, name, color, icon FROM sources WHERE id = ?1")?;
        let mut rows = stmt.query(params![id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        Ok(Some(PaymentSource {
            id: row.get(0)?,
            name: row.get(1)?,
            color: row.get(2)?,
            icon: row.get(3)?,
        }))
    }

    pub async fn create_source(&self, payload: &CatalogPayload) -> Result<PaymentSource> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO sources (name, color, icon) VALUES (?1, ?2, ?3)",
            params![&payload.name, &payload.color, &payload.icon],
        )?;
        Ok(PaymentSource {
            id: conn.last_insert_rowid(),
            name: payload.name.clone(),
            color: payload.color.clone(),
            icon: payload.icon.clone(),
        })
    }

    pub async fn update_source(
        &self,
        id: i64,
        payload: &CatalogPayload,
    ) -> Result<Option<PaymentSource>> {
        let conn = self.conn.lock().await;
        let updated = conn.execute(
            "UPDATE sources SET name = ?1, color = ?2, icon = ?3 WHERE id = ?4",
            params![&payload.name, &payload.color, &payload.icon, id],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        Ok(Some(PaymentSource {
            id,
            name: payload.name.clone(),
            color: payload.color.clone(),
            icon: payload.icon.clone(),
        }))
    }

    pub async fn delete_source(&self, id: i64) -> Result<DeleteStatus> {
        let conn = self.conn.lock().await;
        let in_use: i64 = conn.query_row(
            "SELECT COUNT(*) FROM expenses WHERE source_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        if in_use > 0 {
            return Ok(DeleteStatus::InUse);
        }

        let deleted = conn.execute("DELETE FROM sources WHERE id = ?1", params![id])?;
        if deleted == 0 {
            Ok(DeleteStatus::NotFound)
        } else {
            Ok(DeleteStatus::Deleted)
        }
    }

    // ===== Expenses =====

    pub async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        let mut sql = String::from(EXPENSE_SELECT);
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql + Send>> = Vec::new();

        if let (Some(start), Some(end)) = (&filter.start_date, &filter.end_date) {
            clauses.push("e.date >= ?");
            values.push(Box::new(start.clone()));
            clauses.push("e.date <= ?");
            values.push(Box::new(end.clone()));
        }
        if let Some(category_id) = filter.category_id {
            clauses.push("e.category_id = ?");
            values.push(Box::new(category_id));
        }
        if let Some(source_id) = filter.source_id {
            clauses.push("e.source_id = ?");
            values.push(Box::new(source_id));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY e.date DESC, e.id DESC");

        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(&sql)?;
        let param_refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref() as &dyn ToSql).collect();

        let rows = stmt
            .query_map(&param_refs[..], Self::expense_from_row)?
            .filter_map(|r| r.ok());

        Ok(rows.collect())
    }

    pub async fn get_expense(&self, id: i64) -> Result<Option<Expense>> {
        let sql = format!("{} WHERE e.id = ?1", EXPENSE_SELECT);
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(&sql)?;
        let mut rows = stmt.query(params![id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        Ok(Some(Self::expense_from_row(row)?))
    }

    pub async fn create_expense(&self, payload: &ExpensePayload) -> Result<Expense> {
        let id = {
            let conn = self.conn.lock().await;
            conn.execute(
                "INSERT INTO expenses (title, description, amount, date, category_id, source_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    &payload.title,
                    payload.description.as_deref(),
                    payload.amount,
                    &payload.date,
                    payload.category_id,
                    payload.source_id,
                ],
            )?;
            conn.last_insert_rowid()
        };

        self.get_expense(id)
            .await?
            .context("expense row missing after insert")
    }

    pub async fn update_expense(
        &self,
        id: i64,
        payload: &ExpensePayload,
    ) -> Result<Option<Expense>> {
        let updated = {
            let conn = self.conn.lock().await;
            conn.execute(
                "UPDATE expenses SET title = ?1, description = ?2, amount = ?3, date = ?4,
                 category_id = ?5, source_id = ?6 WHERE id = ?7",
                params![
                    &payload.title,
                    payload.description.as_deref(),
                    payload.amount,
                    &payload.date,
                    payload.category_id,
                    payload.source_id,
                    id,
                ],
            )?
        };

        if updated == 0 {
            return Ok(None);
        }
        self.get_expense(id).await
    }

    pub async fn delete_expense(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().await;
        let deleted = conn.execute("DELETE FROM expenses WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn expense_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Expense> {
        let category_id: i64 = row.get(5)?;
        let source_id: i64 = row.get(6)?;
        Ok(Expense {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            amount: row.get(3)?,
            date: row.get(4)?,
            category_id,
            source_id,
            category: Category {
                id: category_id,
                name: row.get(7)?,
                color: row.get(8)?,
                icon: row.get(9)?,
            },
            source: PaymentSource {
                id: source_id,
                name: row.get(10)?,
                color: row.get(11)?,
                icon: row.get(12)?,
            },
        })
    }

    // ===== Budgets =====

    pub async fn get_budget(&self, year: i32, month: u32) -> Result<Option<Budget>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, year, month, amount FROM budgets WHERE year = ?1 AND month = ?2",
        )?;
        let mut rows = stmt.query(params![year, month])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        Ok(Some(Budget {
            id: row.get(0)?,
            year: row.get(1)?,
            month: row.get(2)?,
            amount: row.get(3)?,
        }))
    }

    pub async fn upsert_budget(&self, payload: &BudgetPayload) -> Result<Budget> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO budgets (year, month, amount)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(year, month) DO UPDATE SET amount = excluded.amount",
            params![payload.year, payload.month, payload.amount],
        )?;

        let mut stmt = conn.prepare_cached(
            "SELECT id, year, month, amount FROM budgets WHERE year = ?1 AND month = ?2",
        )?;
        let mut rows = stmt.query(params![payload.year, payload.month])?;
        let row = rows.next()?.context("budget row missing after upsert")?;
        Ok(Budget {
            id: row.get(0)?,
            year: row.get(1)?,
            month: row.get(2)?,
            amount: row.get(3)?,
        })
    }

    // ===== Analytics =====

    /// Per-month totals for a year, with a per-category breakdown.
    /// Every month appears in the result, zero-filled when nothing was spent.
    pub async fn monthly_totals(&self, year: i32) -> Result<Vec<MonthlyBreakdown>> {
        let start = format!("{year}-01-01");
        let end = format!("{year}-12-31");

        let rows: Vec<(f64, String, String)> = {
            let conn = self.conn.lock().await;
            let mut stmt = conn.prepare_cached(
                "SELECT e.amount, e.date, c.name
                 FROM expenses e
                 JOIN categories c ON c.id = e.category_id
                 WHERE e.date >= ?1 AND e.date <= ?2",
            )?;
            let collected = stmt
                .query_map(params![start, end], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                })?
                .filter_map(|r| r.ok())
                .collect();
            collected
        };

        let mut months: Vec<MonthlyBreakdown> = (1..=12)
            .map(|month| MonthlyBreakdown {
                month,
                total: 0.0,
                categories: BTreeMap::new(),
            })
            .collect();

        for (amount, date, category) in rows {
            // Dates are validated on write, so a parse failure is just skipped.
            let Ok(parsed) = NaiveDate::parse_from_str(&date, "%Y-%m-%d") else {
                continue;
            };
            let idx = (parsed.month() - 1) as usize;
            months[idx].total += amount;
            *months[idx].categories.entry(category).or_insert(0.0) += amount;
        }

        Ok(months)
    }

    // ===== Health =====

    pub async fn table_stats(&self) -> Result<TableStats> {
        let conn = self.conn.lock().await;
        let categories: i64 =
            conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        let sources: i64 = conn.query_row("SELECT COUNT(*) FROM sources", [], |row| row.get(0))?;
        let expenses: i64 =
            conn.query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))?;
        let budgets: i64 = conn.query_row("SELECT COUNT(*) FROM budgets", [], |row| row.get(0))?;

        Ok(TableStats {
            categories,
            sources,
            expenses,
            budgets,
        })
    }

    /// Cheap round trip used by the connection test endpoint.
    pub async fn ping(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        let result: i64 = conn.query_row("SELECT 1 + 1", [], |row| row.get(0))?;
        Ok(result)
    }
}
