//! Opaque bearer secrets.
//!
//! Refresh tokens are handed to the client in plaintext and persisted only
//! as a SHA-256 digest; verification tokens are single-purpose and stored
//! as issued.

pub mod errors;

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Digest;
use sha2::Sha256;

pub use errors::TokenError;

/// Bytes of entropy behind every generated token.
pub const TOKEN_BYTES: usize = 32;

/// Freshly minted refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    /// Hex-encoded secret returned to the client, never stored
    pub plaintext: String,
    /// Hex-encoded SHA-256 of `plaintext`, the only value persisted
    pub hash: String,
}

/// Generate a refresh token and its storage hash.
///
/// # Errors
/// * `EntropyUnavailable` - The OS random source failed
pub fn generate_refresh_token() -> Result<RefreshToken, TokenError> {
    let plaintext = random_hex()?;
    let hash = hash_refresh_token(&plaintext);
    Ok(RefreshToken { plaintext, hash })
}

/// Digest a refresh token plaintext the way it is stored.
pub fn hash_refresh_token(plaintext: &str) -> String {
    hex::encode(Sha256::digest(plaintext.as_bytes()))
}

/// Whether `plaintext` is the secret behind `stored_hash`.
pub fn refresh_token_matches(plaintext: &str, stored_hash: &str) -> bool {
    hash_refresh_token(plaintext) == stored_hash
}

/// Generate a one-time email verification token.
///
/// # Errors
/// * `EntropyUnavailable` - The OS random source failed
pub fn generate_verification_token() -> Result<String, TokenError> {
    random_hex()
}

fn random_hex() -> Result<String, TokenError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| TokenError::EntropyUnavailable(e.to_string()))?;
    Ok(hex::encode(bytes))
}
