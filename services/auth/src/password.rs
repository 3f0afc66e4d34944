//! Password hashing and verification
//!
//! Credentials are hashed with Argon2id using a fresh random salt per call,
//! serialized as a PHC string (algorithm, parameters, salt, and derived key
//! in one opaque value). Hashing is CPU-bound on purpose; callers dispatch
//! it through `tokio::task::spawn_blocking` so fast paths such as token
//! verification and rate-limit checks never queue behind a hash.

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};

/// Hash a password into a PHC string
///
/// The same plaintext hashed twice yields two different strings because the
/// salt is drawn fresh each call; both still verify against the plaintext.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against a stored PHC string
///
/// Never panics or errors: a malformed stored hash, an empty password, or a
/// mismatch all return `false`. The derived-key comparison inside the argon2
/// crate is constant time.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    if password.is_empty() {
        return false;
    }

    let Ok(parsed_hash) = PasswordHash::new(stored_hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
