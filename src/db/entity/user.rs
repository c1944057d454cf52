use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// A persisted user account. The password hash never leaves the crate; the
/// public shape is `api::model::user::PublicUser`.
#[derive(Debug, Clone)]
pub struct Users {
    pub key: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
}

/// Closed role set. Every user carries at least `Role::User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[display("user")]
    User,
    #[display("admin")]
    Admin,
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole {
                role: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Display, derive_more::Error)]
#[display("unknown role: {role}")]
pub struct UnknownRole {
    #[error(not(source))]
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_strings() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::Admin.to_string(), "admin");
        assert!("superuser".parse::<Role>().is_err());
    }
}
