// Re-export the module structure to match the original app
pub mod api {
    pub mod handler;
    pub mod model;
}
pub mod client;
pub mod config;
pub mod db {
    pub mod entity;
    pub mod repo;
}
pub mod error;
pub mod middleware;
pub mod service;
pub mod util;

// Re-export AppState for convenience
pub use crate::config::app_config::AppState;
// Re-export Principal for downstream authorization checks
pub use crate::middleware::auth::Principal;
