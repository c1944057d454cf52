use crate::db::entity::user::{Role, Users};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Public user fields. The password hash never appears here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    #[schema(example = "kfERHUaNceaE9i9FrbnNH")]
    pub id: String,
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "me@example.com")]
    pub email: String,
    pub roles: Vec<Role>,
}

impl From<Users> for PublicUser {
    fn from(user: Users) -> Self {
        PublicUser {
            id: user.key,
            name: user.name,
            email: user.email,
            roles: user.roles,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct Message {
    #[schema(example = "API is running")]
    /// Message to display
    pub message: String,
    #[schema(example = "Success")]
    /// Status of the message
    pub status: String,
}
