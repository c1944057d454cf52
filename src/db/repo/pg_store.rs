use crate::db::entity::auth::RefreshTokens;
use crate::db::entity::user::{Role, Users};
use crate::db::repo::{
    generate_token_string, CredentialStore, RefreshTokenError, RefreshTokenStore, StoreError,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, PgPool};
use tracing::error;

fn backend_error(context: &str, e: sqlx::Error) -> StoreError {
    error!("{context}: {e:?}");
    StoreError::Backend {
        message: e.to_string(),
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    key: String,
    name: String,
    email: String,
    password_hash: String,
    roles: Vec<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for Users {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let roles = row
            .roles
            .iter()
            .map(|r| r.parse::<Role>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Backend {
                message: e.to_string(),
            })?;
        Ok(Users {
            key: row.key,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            roles,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RefreshTokenRow {
    token: String,
    user_key: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<RefreshTokenRow> for RefreshTokens {
    fn from(row: RefreshTokenRow) -> Self {
        RefreshTokens {
            token: row.token,
            user_key: row.user_key,
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

/// Postgres-backed user records.
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Users>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT key, name, email, password_hash, roles, created_at FROM users WHERE email = $1",
        )
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend_error("Error fetching user by email", e))?;
        row.map(Users::try_from).transpose()
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<Users>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT key, name, email, password_hash, roles, created_at FROM users WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend_error("Error fetching user by key", e))?;
        row.map(Users::try_from).transpose()
    }

    async fn create(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        roles: &[Role],
    ) -> Result<Users, StoreError> {
        let role_names: Vec<String> = roles.iter().map(Role::to_string).collect();
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (key, name, email, password_hash, roles)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING key, name, email, password_hash, roles, created_at
            "#,
        )
        .bind(nanoid::nanoid!())
        .bind(name)
        .bind(email.to_lowercase())
        .bind(password_hash)
        .bind(&role_names)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                StoreError::Conflict
            } else {
                backend_error("Error creating user", e)
            }
        })?;
        row.try_into()
    }
}

/// Postgres-backed refresh tokens. `DELETE ... RETURNING` makes consumption
/// atomic: two racing refresh calls can never both win the same token.
pub struct PgRefreshTokenStore {
    pool: PgPool,
}

impl PgRefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    async fn issue(&self, user_key: &str, ttl: Duration) -> Result<String, StoreError> {
        let token = generate_token_string();
        sqlx::query(
            "INSERT INTO refresh_tokens (token, user_key, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(&token)
        .bind(user_key)
        .bind(Utc::now() + ttl)
        .execute(&self.pool)
        .await
        .map_err(|e| backend_error("Error persisting refresh token", e))?;
        Ok(token)
    }

    async fn consume(&self, token: &str) -> Result<RefreshTokens, RefreshTokenError> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            DELETE FROM refresh_tokens WHERE token = $1
            RETURNING token, user_key, created_at, expires_at
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RefreshTokenError::Store(backend_error("Error consuming refresh token", e)))?;

        let record: RefreshTokens = row.ok_or(RefreshTokenError::Invalid)?.into();
        if record.expires_at < Utc::now() {
            // The delete above already purged the expired row.
            return Err(RefreshTokenError::Expired);
        }
        Ok(record)
    }

    async fn revoke(&self, token: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| backend_error("Error revoking refresh token", e))?;
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM refresh_tokens WHERE user_key = $1")
            .bind(user_key)
            .execute(&self.pool)
            .await
            .map_err(|e| backend_error("Error revoking user refresh tokens", e))?;
        Ok(())
    }
}
