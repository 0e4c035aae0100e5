//! Spendbase - Personal Expense Tracker Backend
//! Mission: Self-hosted money tracking behind a single admin login

use anyhow::{Context, Result};
use dotenv::dotenv;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::interval;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spendbase_backend::api::{create_router, AppState};
use spendbase_backend::auth::{AuthDb, AuthState, CredentialService, TokenStore};
use spendbase_backend::config::Config;
use spendbase_backend::ledger::LedgerDb;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment and logging
    load_env();
    init_tracing();

    info!("🚀 Spendbase Backend Starting");

    let config = Config::from_env()?;

    // Ledger storage
    let ledger = LedgerDb::new(&config.ledger_db_path)
        .with_context(|| format!("Failed to open ledger db at {}", config.ledger_db_path))?;
    ledger.seed_defaults().await?;
    info!("📊 Ledger initialized at: {}", config.ledger_db_path);

    // Auth storage and the in-memory session registry over it
    let auth_db = Arc::new(
        AuthDb::new(&config.auth_db_path)
            .with_context(|| format!("Failed to open auth db at {}", config.auth_db_path))?,
    );
    let tokens = Arc::new(TokenStore::new(auth_db.clone()));
    let credentials = Arc::new(CredentialService::new(auth_db, tokens.clone()));

    credentials.ensure_seeded().await?;
    let restored = tokens.restore_from_mirror().await;
    info!(
        "🔐 Authentication initialized at: {} ({} session(s) restored)",
        config.auth_db_path, restored
    );

    // Periodic sweep of sessions older than the age cap
    let sweep_tokens = tokens.clone();
    let max_age = Duration::from_secs(config.token_max_age_days as u64 * 24 * 60 * 60);
    let sweep_every = Duration::from_secs(config.token_sweep_interval_secs);
    tokio::spawn(async move {
        let mut ticker = interval(sweep_every);
        loop {
            ticker.tick().await;
            sweep_tokens.sweep_expired(max_age).await;
        }
    });

    let app_state = AppState::new(ledger);
    let auth_state = AuthState::new(tokens, credentials);
    let app = create_router(app_state, auth_state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("👋 Shutdown signal received");
    }
}

/// Initialize tracing with env-filter overrides
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spendbase_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // 1) Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // 2) Also try repo-root .env (common when running with --manifest-path from elsewhere)
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let candidates = [manifest_dir.join(".env"), manifest_dir.join("../.env")];

    for p in candidates {
        if p.exists() {
            let _ = dotenv::from_path(&p);
        }
    }
}
