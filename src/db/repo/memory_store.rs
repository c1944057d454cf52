use crate::db::entity::auth::RefreshTokens;
use crate::db::entity::user::{Role, Users};
use crate::db::repo::{
    generate_token_string, CredentialStore, RefreshTokenError, RefreshTokenStore, StoreError,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use nanoid::nanoid;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// In-memory credential store keyed by user key. Backs the test suite and
/// local experiments; production wiring uses the Postgres stores.
#[derive(Default)]
pub struct MemoryCredentialStore {
    users: Mutex<HashMap<String, Users>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Users>, StoreError> {
        let email = email.to_lowercase();
        let users = self.users.lock().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<Users>, StoreError> {
        let users = self.users.lock().await;
        Ok(users.get(key).cloned())
    }

    async fn create(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        roles: &[Role],
    ) -> Result<Users, StoreError> {
        let email = email.to_lowercase();
        let mut users = self.users.lock().await;
        if users.values().any(|u| u.email == email) {
            return Err(StoreError::Conflict);
        }
        let user = Users {
            key: nanoid!(),
            name: name.to_string(),
            email,
            password_hash: password_hash.to_string(),
            roles: roles.to_vec(),
            created_at: Utc::now(),
        };
        users.insert(user.key.clone(), user.clone());
        Ok(user)
    }
}

/// In-memory refresh token store with the same single-use consume semantics
/// as the Postgres implementation.
#[derive(Default)]
pub struct MemoryRefreshTokenStore {
    tokens: Mutex<HashMap<String, RefreshTokens>>,
}

impl MemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryRefreshTokenStore {
    async fn issue(&self, user_key: &str, ttl: Duration) -> Result<String, StoreError> {
        let token = generate_token_string();
        let now = Utc::now();
        let mut tokens = self.tokens.lock().await;
        tokens.insert(
            token.clone(),
            RefreshTokens {
                token: token.clone(),
                user_key: user_key.to_string(),
                created_at: now,
                expires_at: now + ttl,
            },
        );
        Ok(token)
    }

    async fn consume(&self, token: &str) -> Result<RefreshTokens, RefreshTokenError> {
        let mut tokens = self.tokens.lock().await;
        let record = tokens.remove(token).ok_or(RefreshTokenError::Invalid)?;
        if record.expires_at < Utc::now() {
            // Already removed above, which bounds store growth.
            return Err(RefreshTokenError::Expired);
        }
        Ok(record)
    }

    async fn revoke(&self, token: &str) -> Result<(), StoreError> {
        let mut tokens = self.tokens.lock().await;
        tokens.remove(token);
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_key: &str) -> Result<(), StoreError> {
        let mut tokens = self.tokens.lock().await;
        tokens.retain(|_, record| record.user_key != user_key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn consumed_token_is_rejected_on_reuse() {
        let store = MemoryRefreshTokenStore::new();
        let token = store.issue("u1", Duration::days(30)).await.unwrap();

        assert!(store.consume(&token).await.is_ok());
        assert!(matches!(
            store.consume(&token).await,
            Err(RefreshTokenError::Invalid)
        ));
    }

    #[tokio::test]
    async fn expired_token_is_purged_on_consume() {
        let store = MemoryRefreshTokenStore::new();
        let token = store.issue("u1", Duration::seconds(-1)).await.unwrap();

        assert!(matches!(
            store.consume(&token).await,
            Err(RefreshTokenError::Expired)
        ));
        // Purged: the second attempt no longer sees the row at all.
        assert!(matches!(
            store.consume(&token).await,
            Err(RefreshTokenError::Invalid)
        ));
    }

    #[tokio::test]
    async fn revoke_is_idempotent() {
        let store = MemoryRefreshTokenStore::new();
        let token = store.issue("u1", Duration::days(30)).await.unwrap();

        store.revoke(&token).await.unwrap();
        store.revoke(&token).await.unwrap();
        store.revoke("never-issued").await.unwrap();
        assert!(store.consume(&token).await.is_err());
    }

    #[tokio::test]
    async fn revoke_all_drops_every_lineage_of_a_user() {
        let store = MemoryRefreshTokenStore::new();
        let t1 = store.issue("u1", Duration::days(30)).await.unwrap();
        let t2 = store.issue("u1", Duration::days(30)).await.unwrap();
        let other = store.issue("u2", Duration::days(30)).await.unwrap();

        store.revoke_all_for_user("u1").await.unwrap();
        assert!(store.consume(&t1).await.is_err());
        assert!(store.consume(&t2).await.is_err());
        assert!(store.consume(&other).await.is_ok());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_case_insensitively() {
        let store = MemoryCredentialStore::new();
        store
            .create("a@x.com", "A", "hash", &[Role::User])
            .await
            .unwrap();
        let err = store
            .create("A@X.COM", "A2", "hash", &[Role::User])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));

        let found = store.find_by_email("A@x.Com").await.unwrap();
        assert_eq!(found.unwrap().email, "a@x.com");
    }
}
