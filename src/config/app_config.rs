use crate::db::repo::pg_store::{PgCredentialStore, PgRefreshTokenStore};
use crate::db::repo::{CredentialStore, RefreshTokenStore};
use crate::service::token_issuer::TokenIssuer;
use crate::util::crypto_helper;
use chrono::Duration;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::sync::Arc;
use tracing::info;

/// Auth knobs shared by the session protocol.
pub struct AuthConfig {
    pub refresh_token_ttl: Duration,
    pub cookie_secure: bool,
    /// Verified against when the email is unknown, so login timing does not
    /// reveal whether an account exists.
    pub dummy_password_hash: String,
}

pub struct AppState {
    pub users: Arc<dyn CredentialStore>,
    pub refresh_tokens: Arc<dyn RefreshTokenStore>,
    pub token_issuer: TokenIssuer,
    pub auth: AuthConfig,
}

/// Initializes the application state: database pool, migrations, token
/// issuer, and auth configuration.
///
/// # Panics
/// Panics when `DATABASE_URL` or `JWT_ACCESS_SECRET` is missing, or when the
/// pool or migrations fail. A missing signing secret is a hard startup error;
/// there is deliberately no insecure fallback value.
pub async fn initialize_app_state() -> Arc<AppState> {
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let access_secret =
        env::var("JWT_ACCESS_SECRET").expect("JWT_ACCESS_SECRET must be set; refusing to start");

    let access_ttl_secs: i64 = env::var("JWT_ACCESS_EXPIRES_SECS")
        .unwrap_or_else(|_| "900".to_string())
        .parse()
        .expect("JWT_ACCESS_EXPIRES_SECS must be an integer");
    let refresh_ttl_days: i64 = env::var("REFRESH_TOKEN_EXPIRES_DAYS")
        .unwrap_or_else(|_| "30".to_string())
        .parse()
        .expect("REFRESH_TOKEN_EXPIRES_DAYS must be an integer");
    let cookie_secure = env::var("COOKIE_SECURE").as_deref() == Ok("true");

    // Setup connection pool.
    let pg_pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .connect(&database_url)
        .await
        .unwrap_or_else(|e| {
            panic!("Failed to create database connection pool: {}", e);
        });

    sqlx::migrate!()
        .run(&pg_pool)
        .await
        .expect("Failed to run database migrations");
    info!("Database pool ready, migrations applied");

    let dummy_password_hash = crypto_helper::hash_password(&crate::db::repo::generate_token_string())
        .expect("Failed to prepare dummy password hash");

    Arc::new(AppState {
        users: Arc::new(PgCredentialStore::new(pg_pool.clone())),
        refresh_tokens: Arc::new(PgRefreshTokenStore::new(pg_pool)),
        token_issuer: TokenIssuer::new(&access_secret, Duration::seconds(access_ttl_secs)),
        auth: AuthConfig {
            refresh_token_ttl: Duration::days(refresh_ttl_days),
            cookie_secure,
            dummy_password_hash,
        },
    })
}

/// Retrieves the server address from the environment variables, defaulting to
/// a local development bind.
pub fn get_server_address() -> String {
    let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = env::var("SERVER_PORT").unwrap_or_else(|_| "5000".to_string());
    server_host + ":" + &server_port
}

/// Cross-origin caller origins allowed to send credentialed requests.
pub fn allowed_origins() -> Vec<String> {
    env::var("ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:5173".to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
