//! Application configuration
//! Mission: Centralize environment-driven settings with safe defaults

use std::env;
use std::path::PathBuf;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub ledger_db_path: String,
    pub auth_db_path: String,
    pub token_max_age_days: i64,
    pub token_sweep_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);

        // IMPORTANT: DB paths default to the crate directory so running from the repo
        // root doesn't accidentally create a new empty DB in a different working directory.
        let ledger_db_path =
            resolve_data_path(env::var("LEDGER_DB_PATH").ok(), "spendbase_ledger.db");
        let auth_db_path = resolve_data_path(env::var("AUTH_DB_PATH").ok(), "spendbase_auth.db");

        let token_max_age_days = env::var("TOKEN_MAX_AGE_DAYS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(7);

        let token_sweep_interval_secs = env::var("TOKEN_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(3600);

        Ok(Self {
            port,
            ledger_db_path,
            auth_db_path,
            token_max_age_days,
            token_sweep_interval_secs,
        })
    }
}

fn default_data_path(filename: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    base.join(filename).to_string_lossy().to_string()
}

pub fn resolve_data_path(env_value: Option<String>, default_filename: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let Some(raw) = env_value.filter(|v| !v.trim().is_empty()) else {
        return default_data_path(default_filename);
    };

    let p = PathBuf::from(raw);
    if p.is_absolute() {
        return p.to_string_lossy().to_string();
    }

    // Treat relative paths as relative to the crate directory, not the caller's cwd.
    base.join(p).to_string_lossy().to_string()
}
