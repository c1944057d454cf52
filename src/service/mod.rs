pub mod auth_service;
pub mod token_issuer;
