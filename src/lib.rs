//! Spendbase Backend Library
//!
//! Exposes core modules for use by binaries and tests.

pub mod api;
pub mod auth;
pub mod config;
pub mod ledger;
pub mod middleware;
pub mod models;
