use crate::error::error_model::{AppError, ErrorType};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use tracing::error;

/// Hashes a password with Argon2id and a freshly generated salt.
///
/// Hashing always happens at the session-protocol layer; the stores only ever
/// see the finished hash.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Error hashing password: {:?}", e);
            AppError::new(
                ErrorType::InternalServerError,
                "Failed to process the password.",
            )
        })?;
    Ok(hash.to_string())
}

/// Constant-style verification: any parse or mismatch is just `false`.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else {
        error!("Stored password hash could not be parsed");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
