//! Authentication Module
//! Mission: Secure API access with opaque session tokens backed by SQLite

pub mod api;
pub mod credentials;
pub mod middleware;
pub mod models;
pub mod store;
pub mod token_store;

pub use api::AuthState;
pub use credentials::CredentialService;
pub use middleware::auth_middleware;
pub use store::{AuthDb, TokenMirror};
pub use token_store::TokenStore;
