use anyhow::{Context, Result};

/// Hashes a plaintext password with bcrypt at the default cost.
pub fn hash_password(plain: &str) -> Result<String> {
    bcrypt::hash(plain, bcrypt::DEFAULT_COST).context("Failed to hash password")
}

/// Verifies a plaintext password against a stored bcrypt hash.
/// An undecodable hash counts as a failed verification, not an error.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    bcrypt::verify(plain, hash).unwrap_or(false)
}
