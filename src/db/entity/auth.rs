use chrono::{DateTime, Utc};

/// A persisted refresh token. The token string is the capability itself:
/// consuming it deletes the row, so a lineage only ever has one live token.
#[derive(Debug, Clone)]
pub struct RefreshTokens {
    pub token: String,
    pub user_key: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
