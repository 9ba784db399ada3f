//! Argon2id password hashing and credential format checks.
//!
//! Hashes use the PHC string format so algorithm parameters and salt are
//! embedded in the stored value.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Allowed length of usernames and passwords, inclusive.
pub const CREDENTIAL_MIN_LEN: usize = 3;
pub const CREDENTIAL_MAX_LEN: usize = 20;

/// Hash a plaintext password using Argon2id with a random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC-formatted Argon2id hash.
///
/// Returns `Ok(true)` if the password matches, `Ok(false)` if it does not.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Check that a username or password is ASCII alphanumeric and 3 to 20
/// characters long.
///
/// Usernames become a path segment under the uploads directory, so this is
/// also what keeps them filesystem-safe.
pub fn validate_credential(field: &str, value: &str) -> Result<(), String> {
    let len = value.chars().count();
    if !(CREDENTIAL_MIN_LEN..=CREDENTIAL_MAX_LEN).contains(&len) {
        return Err(format!(
            "{field} must be between {CREDENTIAL_MIN_LEN} and {CREDENTIAL_MAX_LEN} characters"
        ));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(format!("{field} must contain only letters and numbers"));
    }
    Ok(())
}
