//! Authentication error types

use std::fmt;

use thiserror::Error;

use crate::store::StoreError;

/// Why a session token was rejected
///
/// Kept for logging only; callers outside the auth module see every variant as
/// the same "unauthenticated" outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    Malformed,
    BadSignature,
    Expired,
    NotYetValid,
    WrongKind,
    WrongIssuer,
    WrongAudience,
}

impl TokenRejection {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::BadSignature => "bad signature",
            Self::Expired => "expired",
            Self::NotYetValid => "not yet valid",
            Self::WrongKind => "wrong token type",
            Self::WrongIssuer => "wrong issuer",
            Self::WrongAudience => "wrong audience",
        }
    }
}

impl fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authentication required")]
    NotAuthenticated,

    #[error("invalid token: {0}")]
    InvalidToken(TokenRejection),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("unsupported identity provider: {0}")]
    UnsupportedProvider(String),

    #[error("identity provider did not return an email")]
    MissingEmail,

    #[error("You do not have permission to access this {0}")]
    Forbidden(String),

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("credential encoding failed: {0}")]
    Credential(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// True for every failure that must be reported as 401
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated | Self::InvalidToken(_) | Self::InvalidCredentials
        )
    }

    #[must_use]
    pub const fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden(_))
    }

    /// Sub-cause of a rejected token, if this is one
    #[must_use]
    pub const fn rejection(&self) -> Option<TokenRejection> {
        match self {
            Self::InvalidToken(rejection) => Some(*rejection),
            _ => None,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        let rejection = match err.kind() {
            ErrorKind::ExpiredSignature => TokenRejection::Expired,
            ErrorKind::ImmatureSignature => TokenRejection::NotYetValid,
            ErrorKind::InvalidSignature => TokenRejection::BadSignature,
            ErrorKind::InvalidIssuer => TokenRejection::WrongIssuer,
            ErrorKind::InvalidAudience => TokenRejection::WrongAudience,
            _ => TokenRejection::Malformed,
        };
        Self::InvalidToken(rejection)
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
