//! Signing key derivation
//!
//! Operators may configure the secret either base64-encoded or as plain text.
//! Derivation is a two-step decision: try base64, otherwise fall back to the
//! raw UTF-8 bytes. The weak-key check runs once on whichever branch won and
//! never aborts startup.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use jsonwebtoken::{DecodingKey, EncodingKey};

use crate::constants::MIN_SIGNING_KEY_BYTES;

/// Key bytes together with the branch that produced them
#[derive(Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    /// Secret was valid base64
    Decoded(Vec<u8>),
    /// Secret used verbatim as UTF-8 bytes
    Raw(Vec<u8>),
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (name, bytes) = match self {
            Self::Decoded(b) => ("Decoded", b),
            Self::Raw(b) => ("Raw", b),
        };
        f.debug_struct(name).field("len", &bytes.len()).finish()
    }
}

impl KeyMaterial {
    #[must_use]
    pub fn from_secret(secret: &str) -> Self {
        match STANDARD.decode(secret.trim()) {
            Ok(bytes) if !bytes.is_empty() => Self::Decoded(bytes),
            _ => Self::Raw(secret.as_bytes().to_vec()),
        }
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::Decoded(b) | Self::Raw(b) => b,
        }
    }

    #[must_use]
    pub fn bits(&self) -> usize {
        self.bytes().len() * 8
    }

    /// Shorter than 256 bits
    #[must_use]
    pub fn is_weak(&self) -> bool {
        self.bytes().len() < MIN_SIGNING_KEY_BYTES
    }

    #[must_use]
    pub const fn source(&self) -> &'static str {
        match self {
            Self::Decoded(_) => "base64",
            Self::Raw(_) => "raw",
        }
    }
}

/// HMAC key used for every session token, immutable after construction
#[derive(Clone)]
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    bits: usize,
    weak: bool,
    source: &'static str,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("bits", &self.bits)
            .field("weak", &self.weak)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    #[must_use]
    pub fn from_material(material: &KeyMaterial) -> Self {
        let bytes = material.bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            bits: material.bits(),
            weak: material.is_weak(),
            source: material.source(),
        }
    }

    #[must_use]
    pub const fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    #[must_use]
    pub const fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }

    #[must_use]
    pub const fn is_weak(&self) -> bool {
        self.weak
    }

    #[must_use]
    pub const fn bits(&self) -> usize {
        self.bits
    }
}

/// Derive the signing key from the configured secret
///
/// Never fails: an undecodable secret is used as raw text, and a short key is
/// reported with a warning rather than rejected.
pub fn derive_signing_key(secret: &str) -> SigningKey {
    let material = KeyMaterial::from_secret(secret);

    if matches!(material, KeyMaterial::Raw(_)) {
        tracing::warn!("Using raw UTF-8 bytes as signing secret. Prefer a base64-encoded secret");
    }

    if material.is_weak() {
        tracing::warn!(
            bits = material.bits(),
            source = material.source(),
            "Signing key is shorter than 256 bits; weak secret"
        );
    }

    SigningKey::from_material(&material)
}
