//! Credential Service
//! Mission: Validate the admin password and manage its lifecycle

use crate::auth::models::AuthToken;
use crate::auth::store::AuthDb;
use crate::auth::token_store::TokenStore;
use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use std::env;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Single-credential login service over the durable auth store.
pub struct CredentialService {
    auth_db: Arc<AuthDb>,
    tokens: Arc<TokenStore>,
    /// Serializes password changes so verify-then-replace never interleaves.
    change_lock: Mutex<()>,
}

impl CredentialService {
    pub fn new(auth_db: Arc<AuthDb>, tokens: Arc<TokenStore>) -> Self {
        Self {
            auth_db,
            tokens,
            change_lock: Mutex::new(()),
        }
    }

    /// Provision the admin credential if the store has none.
    ///
    /// Precedence: `ADMIN_PASSWORD_HASH` (pre-hashed, from the deploy
    /// pipeline) over `ADMIN_PASSWORD` (hashed here at boot) over a built-in
    /// default. An already-provisioned credential is never overwritten, so
    /// passwords changed through the API survive restarts regardless of the
    /// environment.
    pub async fn ensure_seeded(&self) -> Result<()> {
        if self.auth_db.load_credential_hash().await?.is_some() {
            return Ok(());
        }

        let now = Utc::now().timestamp();

        if let Some(hash_value) = env::var("ADMIN_PASSWORD_HASH")
            .ok()
            .filter(|v| !v.trim().is_empty())
        {
            if self.auth_db.seed_credential(hash_value.trim(), now).await? {
                info!("🔐 Admin credential seeded from ADMIN_PASSWORD_HASH");
            }
            return Ok(());
        }

        if let Some(password) = env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty()) {
            let hashed = hash(&password, DEFAULT_COST).context("Failed to hash password")?;
            if self.auth_db.seed_credential(&hashed, now).await? {
                info!("🔐 Admin credential seeded from ADMIN_PASSWORD");
            }
            return Ok(());
        }

        let hashed = hash(DEFAULT_ADMIN_PASSWORD, DEFAULT_COST).context("Failed to hash password")?;
        if self.auth_db.seed_credential(&hashed, now).await? {
            info!(
                "🔐 Default admin credential created (password: {})",
                DEFAULT_ADMIN_PASSWORD
            );
            warn!("⚠️  CHANGE DEFAULT PASSWORD IN PRODUCTION!");
        }
        Ok(())
    }

    /// Check a submitted password against the stored credential and mint a
    /// session on success. `Ok(None)` means the password did not match.
    pub async fn login(&self, password: &str) -> Result<Option<AuthToken>> {
        let Some(stored_hash) = self.auth_db.load_credential_hash().await? else {
            anyhow::bail!("admin credential is not provisioned");
        };

        let valid = verify(password, &stored_hash).context("Failed to verify password")?;
        if !valid {
            return Ok(None);
        }

        Ok(Some(self.tokens.issue().await))
    }

    /// End the session for `token`. Revoking an unknown token is a no-op.
    pub async fn logout(&self, token: &str) -> bool {
        self.tokens.revoke(token).await
    }

    /// Swap the stored credential in one write; a concurrent login observes
    /// either the old or the new hash, never a mix. Returns `false` when
    /// `current` does not match. Existing sessions stay valid.
    pub async fn change_password(&self, current: &str, next: &str) -> Result<bool> {
        let _guard = self.change_lock.lock().await;

        let Some(stored_hash) = self.auth_db.load_credential_hash().await? else {
            anyhow::bail!("admin credential is not provisioned");
        };

        let valid = verify(current, &stored_hash).context("Failed to verify password")?;
        if !valid {
            return Ok(false);
        }

        let new_hash = hash(next, DEFAULT_COST).context("Failed to hash password")?;
        self.auth_db
            .replace_credential_hash(&new_hash, Utc::now().timestamp())
            .await?;

        info!("✅ Admin password updated");
        Ok(true)
    }
}
