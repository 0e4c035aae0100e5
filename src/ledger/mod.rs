//! Ledger Module - Expense Tracking Storage
//!
//! This module handles:
//! 1. Expense rows with their category and payment source
//! 2. The editable category/source catalog
//! 3. Monthly budgets and the yearly analytics rollup

pub mod db;

pub use db::{DeleteStatus, ExpenseFilter, LedgerDb, TableStats};
