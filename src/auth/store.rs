//! Durable Auth Storage
//! Mission: Mirror session tokens and hold the admin credential in SQLite

use crate::auth::models::AuthToken;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Durable backing store for session tokens.
///
/// The in-memory index treats this store as best-effort: implementations
/// report failures through `Result` and the caller decides whether to
/// surface or swallow them.
#[async_trait]
pub trait TokenMirror: Send + Sync {
    async fn insert_token(&self, token: &AuthToken) -> Result<()>;
    async fn find_token(&self, token: &str) -> Result<Option<AuthToken>>;
    /// Returns whether a row was actually deleted. Deleting an absent token is not an error.
    async fn delete_token(&self, token: &str) -> Result<bool>;
    async fn delete_tokens_created_before(&self, cutoff: i64) -> Result<usize>;
    async fn list_unexpired_tokens(&self, now: i64) -> Result<Vec<AuthToken>>;
}

/// SQLite-backed auth database: the token mirror plus the single admin credential.
#[derive(Clone)]
pub struct AuthDb {
    conn: Arc<Mutex<Connection>>,
}

impl AuthDb {
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).context("open auth db")?;
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS auth_tokens (
                token TEXT PRIMARY KEY,
                created_at INTEGER NOT NULL,
                expires_at INTEGER
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_auth_tokens_created ON auth_tokens(created_at)",
            [],
        )?;

        // Single-row credential record. The row is the source of truth for the
        // admin password hash; environment variables only seed it once.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS admin_credential (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                password_hash TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub async fn load_credential_hash(&self) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare_cached("SELECT password_hash FROM admin_credential WHERE id = 1 LIMIT 1")?;
        let mut rows = stmt.query([])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    /// Replace the stored hash in a single statement so a concurrent login
    /// never observes a half-written credential.
    pub async fn replace_credential_hash(&self, password_hash: &str, updated_at: i64) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO admin_credential (id, password_hash, updated_at)
             VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET
                password_hash = excluded.password_hash,
                updated_at = excluded.updated_at",
            params![password_hash, updated_at],
        )?;
        Ok(())
    }

    /// Insert the initial credential if none exists yet. Returns whether this
    /// call seeded the row; an already-provisioned credential is left alone.
    pub async fn seed_credential(&self, password_hash: &str, updated_at: i64) -> Result<bool> {
        let conn = self.conn.lock().await;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO admin_credential (id, password_hash, updated_at)
             VALUES (1, ?1, ?2)",
            params![password_hash, updated_at],
        )?;
        Ok(inserted > 0)
    }
}

#[async_trait]
impl TokenMirror for AuthDb {
    async fn insert_token(&self, token: &AuthToken) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO auth_tokens (token, created_at, expires_at)
             VALUES (?1, ?2, ?3)",
            params![&token.token, token.created_at, token.expires_at],
        )?;
        Ok(())
    }

    async fn find_token(&self, token: &str) -> Result<Option<AuthToken>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT token, created_at, expires_at FROM auth_tokens WHERE token = ?1 LIMIT 1",
        )?;
        let mut rows = stmt.query(params![token])?;
        if let Some(row) = rows.next()? {
            Ok(Some(AuthToken {
                token: row.get(0)?,
                created_at: row.get(1)?,
                expires_at: row.get(2)?,
            }))
        } else {
            Ok(None)
        }
    }

    async fn delete_token(&self, token: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let deleted = conn.execute("DELETE FROM auth_tokens WHERE token = ?1", params![token])?;
        Ok(deleted > 0)
    }

    async fn delete_tokens_created_before(&self, cutoff: i64) -> Result<usize> {
        let conn = self.conn.lock().await;
        let deleted = conn.execute(
            "DELETE FROM auth_tokens WHERE created_at < ?1",
            params![cutoff],
        )?;
        Ok(deleted)
    }

    async fn list_unexpired_tokens(&self, now: i64) -> Result<Vec<AuthToken>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT token, created_at, expires_at FROM auth_tokens
             WHERE expires_at IS NULL OR expires_at > ?1",
        )?;

        let rows = stmt
            .query_map(params![now], |row| {
                Ok(AuthToken {
                    token: row.get(0)?,
                    created_at: row.get(1)?,
                    expires_at: row.get(2)?,
                })
            })?
            .filter_map(|r| r.ok());

        Ok(rows.collect())
    }
}
