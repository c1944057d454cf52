pub mod memory_store;
pub mod pg_store;

use crate::db::entity::auth::RefreshTokens;
use crate::db::entity::user::{Role, Users};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Duration;
use derive_more::Display;
use rand::rngs::OsRng;
use rand::RngCore;

/// Persistence failure outside the auth-specific outcomes. Surfaces to the
/// caller as a generic 500, never as a 401/409.
#[derive(Debug, Display, derive_more::Error)]
pub enum StoreError {
    #[display("duplicate record")]
    Conflict,
    #[display("store backend error: {message}")]
    Backend {
        #[error(not(source))]
        message: String,
    },
}

/// Outcome of presenting a refresh token for consumption.
#[derive(Debug, Display, derive_more::Error)]
pub enum RefreshTokenError {
    /// Unknown, revoked, or already-consumed token string.
    #[display("invalid refresh token")]
    Invalid,
    /// The token existed but was past its expiry; the row has been purged.
    #[display("refresh token expired")]
    Expired,
    #[display("refresh token store error")]
    Store(StoreError),
}

/// User records keyed by case-insensitive email. Password hashing happens in
/// the session protocol, never here.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Users>, StoreError>;

    async fn find_by_key(&self, key: &str) -> Result<Option<Users>, StoreError>;

    /// Fails with `StoreError::Conflict` when the email is already taken.
    async fn create(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        roles: &[Role],
    ) -> Result<Users, StoreError>;
}

/// Server-tracked, revocable refresh tokens. A user may hold several
/// concurrent tokens, one per device lineage.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Generates and persists a fresh high-entropy token string.
    async fn issue(&self, user_key: &str, ttl: Duration) -> Result<String, StoreError>;

    /// Single-use lookup: a valid token is removed as it is consumed, which is
    /// the rotation delete. An expired token is purged and reported as such.
    async fn consume(&self, token: &str) -> Result<RefreshTokens, RefreshTokenError>;

    /// Idempotent delete; a no-op when the token is absent.
    async fn revoke(&self, token: &str) -> Result<(), StoreError>;

    /// Drops every token a user holds ("log out everywhere").
    async fn revoke_all_for_user(&self, user_key: &str) -> Result<(), StoreError>;
}

/// 256 bits from the OS RNG, rendered as unpadded url-safe base64.
pub fn generate_token_string() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_strings_are_long_and_unique() {
        let a = generate_token_string();
        let b = generate_token_string();
        // 32 bytes -> 43 base64 chars
        assert_eq!(a.len(), 43);
        assert_ne!(a, b);
    }
}
