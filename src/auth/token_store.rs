//! Session Token Store
//! Mission: Answer auth checks from memory, survive restarts via the durable mirror

use crate::auth::models::AuthToken;
use crate::auth::store::TokenMirror;
use chrono::Utc;
use parking_lot::RwLock;
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const TOKEN_BYTES: usize = 32;

#[derive(Default)]
struct TokenIndex {
    live: HashMap<String, AuthToken>,
    /// Tokens revoked in this process whose durable delete has not succeeded
    /// yet. Blocks the self-healing lookup from resurrecting them.
    dead: HashSet<String>,
    /// Bumped on every revocation; guards the lookup-then-cache window in `is_valid`.
    revocations: u64,
}

/// Dual-store session registry: a fast in-memory index answers every check,
/// with a durable mirror for restart recovery.
///
/// Mirror failures never fail the calling request. Issuance and revocation
/// take effect in memory first and the durable write is best-effort; only a
/// cache miss consults the mirror synchronously.
pub struct TokenStore {
    index: RwLock<TokenIndex>,
    mirror: Arc<dyn TokenMirror>,
}

impl TokenStore {
    pub fn new(mirror: Arc<dyn TokenMirror>) -> Self {
        Self {
            index: RwLock::new(TokenIndex::default()),
            mirror,
        }
    }

    fn generate_token() -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Create a new session. The token is usable as soon as this returns,
    /// even when the durable mirror is unavailable.
    pub async fn issue(&self) -> AuthToken {
        let token = AuthToken {
            token: Self::generate_token(),
            created_at: Utc::now().timestamp(),
            expires_at: None,
        };

        self.index
            .write()
            .live
            .insert(token.token.clone(), token.clone());

        if let Err(e) = self.mirror.insert_token(&token).await {
            warn!("Failed to persist session token to durable store: {}", e);
        }

        token
    }

    /// Check a presented token. Memory answers first; on a miss the durable
    /// mirror is consulted and a hit is cached back into the index.
    pub async fn is_valid(&self, token: &str) -> bool {
        let now = Utc::now().timestamp();

        let revocations_seen = {
            let idx = self.index.read();
            if let Some(t) = idx.live.get(token) {
                return !t.is_expired(now);
            }
            if idx.dead.contains(token) {
                None
            } else {
                Some(idx.revocations)
            }
        };

        // The read guard is released at the end of the block above; the
        // parked-delete retry must not run (or await) while it is held.
        let Some(revocations_seen) = revocations_seen else {
            self.retry_parked_delete(token).await;
            return false;
        };

        match self.mirror.find_token(token).await {
            Ok(Some(record)) => {
                if record.is_expired(now) {
                    return false;
                }
                let mut idx = self.index.write();
                // A revocation may have raced the mirror lookup; never cache past one.
                if idx.dead.contains(token) {
                    return false;
                }
                if idx.revocations == revocations_seen {
                    idx.live.insert(token.to_string(), record);
                }
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Durable store check failed for session token: {}", e);
                false
            }
        }
    }

    /// End a session. Returns whether the token was live in this process;
    /// revoking an unknown or already-revoked token is a no-op that reports
    /// `false`.
    pub async fn revoke(&self, token: &str) -> bool {
        let was_live = {
            let mut idx = self.index.write();
            let was_live = idx.live.remove(token).is_some();
            // Parked until the durable delete lands, so no later check can
            // observe this token as valid again.
            idx.dead.insert(token.to_string());
            idx.revocations += 1;
            was_live
        };

        match self.mirror.delete_token(token).await {
            Ok(_) => {
                self.index.write().dead.remove(token);
            }
            Err(e) => {
                warn!("Failed to remove session token from durable store: {}", e);
            }
        }

        was_live
    }

    /// Age-based cleanup. Drops sessions older than `max_age` from both
    /// stores and retries any durable deletes that previously failed.
    pub async fn sweep_expired(&self, max_age: Duration) -> usize {
        let now = Utc::now().timestamp();
        let cutoff = now - max_age.as_secs() as i64;

        let (swept, parked) = {
            let mut idx = self.index.write();
            let before = idx.live.len();
            idx.live
                .retain(|_, t| t.created_at >= cutoff && !t.is_expired(now));
            let swept = before - idx.live.len();
            let parked: Vec<String> = idx.dead.iter().cloned().collect();
            (swept, parked)
        };

        if swept > 0 {
            info!("🧹 Swept {} expired session(s) from memory", swept);
        }

        match self.mirror.delete_tokens_created_before(cutoff).await {
            Ok(deleted) if deleted > 0 => {
                info!("🧹 Swept {} expired session(s) from durable store", deleted);
            }
            Ok(_) => {}
            Err(e) => warn!("Durable token sweep failed: {}", e),
        }

        for token in parked {
            self.retry_parked_delete(&token).await;
        }

        swept
    }

    /// Rebuild the fast index from the durable mirror after a restart.
    /// A mirror failure restores nothing; the server still starts.
    pub async fn restore_from_mirror(&self) -> usize {
        let now = Utc::now().timestamp();
        match self.mirror.list_unexpired_tokens(now).await {
            Ok(tokens) => {
                let mut idx = self.index.write();
                for t in tokens {
                    idx.live.entry(t.token.clone()).or_insert(t);
                }
                idx.live.len()
            }
            Err(e) => {
                warn!(
                    "Failed to restore session tokens from durable store: {}",
                    e
                );
                0
            }
        }
    }

    pub fn live_count(&self) -> usize {
        self.index.read().live.len()
    }

    async fn retry_parked_delete(&self, token: &str) {
        if self.mirror.delete_token(token).await.is_ok() {
            self.index.write().dead.remove(token);
        }
    }
}
