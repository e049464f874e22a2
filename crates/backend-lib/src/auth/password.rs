// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use scrypt::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Params, Scrypt,
};
use thiserror::Error;
use zeroize::Zeroizing;

/// scrypt block size
const BLOCK_SIZE: u32 = 8;
/// scrypt parallelism
const PARALLELISM: u32 = 1;

#[derive(Error, Debug)]
#[error("password hashing failed: {0}")]
pub struct PasswordHashError(String);

/// Hash a password with scrypt at cost `2^log_n`, returning a PHC string
pub fn hash_password(plain: &str, log_n: u8) -> Result<String, PasswordHashError> {
    let params = Params::new(log_n, BLOCK_SIZE, PARALLELISM, Params::RECOMMENDED_LEN)
        .map_err(|e| PasswordHashError(e.to_string()))?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Scrypt
        .hash_password_customized(plain.as_bytes(), None, None, params, &salt)
        .map_err(|e| PasswordHashError(e.to_string()))?
        .to_string();
    Ok(hash)
}

/// Verify a password against a hash. Parameters come from the hash itself.
pub fn verify_password(hash: &str, plain: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
}

/// Hash on the blocking pool; scrypt is deliberately CPU bound
pub async fn hash_password_blocking(plain: &str, log_n: u8) -> Result<String, PasswordHashError> {
    let plain = Zeroizing::new(plain.to_string());
    tokio::task::spawn_blocking(move || hash_password(&plain, log_n))
        .await
        .map_err(|e| PasswordHashError(format!("hashing task failed: {e}")))?
}

/// Verify on the blocking pool. A failed task counts as a mismatch.
pub async fn verify_password_blocking(hash: String, plain: &str) -> bool {
    let plain = Zeroizing::new(plain.to_string());
    tokio::task::spawn_blocking(move || verify_password(&hash, &plain))
        .await
        .unwrap_or(false)
}
