use crate::db::entity::user::Role;
use chrono::{Duration, Utc};
use derive_more::Display;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// The authenticated identity attached to a request after a successful
/// access-token verification. This is the whole contract the CRUD layer sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_key: String,
    pub email: String,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }
}

#[derive(Debug, Display, derive_more::Error, PartialEq, Eq)]
pub enum TokenError {
    #[display("token signature does not match")]
    InvalidSignature,
    #[display("token has expired")]
    Expired,
    #[display("token could not be parsed")]
    Malformed,
    #[display("token could not be signed")]
    Signing,
}

/// Claims carried by an access token.
///
/// `iat` and `exp` are seconds since the epoch. Validity is decided purely by
/// signature and expiry; there is no store lookup behind `verify`.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    roles: Vec<Role>,
    iat: i64,
    exp: i64,
}

/// Mints and verifies short-lived HS256 access tokens. The signing secret is
/// process-wide configuration, read-only after startup.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, access_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Encodes the principal into a signed token expiring after the
    /// configured window. `iat` makes every token unique per clock second.
    pub fn sign(&self, principal: &Principal) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: principal.user_key.clone(),
            email: principal.email.clone(),
            roles: principal.roles.clone(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| TokenError::Signing)
    }

    /// Decodes and checks signature and expiry. Zero leeway so the expiry
    /// boundary is exact.
    pub fn verify(&self, token: &str) -> Result<Principal, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            }
        })?;
        Ok(Principal {
            user_key: data.claims.sub,
            email: data.claims.email,
            roles: data.claims.roles,
        })
    }
}
