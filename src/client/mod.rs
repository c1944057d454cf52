//! Client-side session manager: attaches access tokens to outgoing calls,
//! detects expiry, and performs one coordinated silent refresh at a time.

pub mod api_client;
pub mod refresh_coordinator;

pub use api_client::{ApiClient, ClientError};
pub use refresh_coordinator::{RefreshCoordinator, RefreshTicket};
