//! Local credential encoding

use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use super::error::{AuthError, Result};

/// Opaque password hashing capability
pub trait CredentialEncoder: Send + Sync {
    /// Encode a plain-text secret for storage
    fn encode(&self, raw: &str) -> Result<String>;

    /// Check `raw` against a stored encoding; false for unparseable encodings
    fn verify(&self, raw: &str, encoded: &str) -> bool;
}

/// Argon2id PHC-string encoder with default parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Encoder;

impl CredentialEncoder for Argon2Encoder {
    fn encode(&self, raw: &str) -> Result<String> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes).map_err(|e| AuthError::Credential(e.to_string()))?;
        let salt =
            SaltString::encode_b64(&salt_bytes).map_err(|e| AuthError::Credential(e.to_string()))?;

        Argon2::default()
            .hash_password(raw.as_bytes(), &salt)
            .map(|phc| phc.to_string())
            .map_err(|e| AuthError::Credential(e.to_string()))
    }

    fn verify(&self, raw: &str, encoded: &str) -> bool {
        PasswordHash::new(encoded)
            .is_ok_and(|parsed| Argon2::default().verify_password(raw.as_bytes(), &parsed).is_ok())
    }
}
