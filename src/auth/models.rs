//! Authentication Models
//! Mission: Define session token and credential wire structures

use serde::{Deserialize, Serialize};

/// A session token record.
///
/// `expires_at` is an optional hard expiry; sessions without one live until
/// they are revoked or swept by the age-based cleanup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken {
    pub token: String,
    pub created_at: i64,
    pub expires_at: Option<i64>,
}

impl AuthToken {
    pub fn is_expired(&self, now: i64) -> bool {
        matches!(self.expires_at, Some(ts) if ts <= now)
    }
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub message: String,
}

/// Logout / password-change acknowledgement
#[derive(Debug, Serialize)]
pub struct AuthAck {
    pub success: bool,
    pub message: String,
}

/// Change password request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Session status response
#[derive(Debug, Serialize)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
    pub message: String,
}
