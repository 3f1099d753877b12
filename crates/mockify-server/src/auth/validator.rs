//! Token policy checks on top of the codec

use std::sync::Arc;

use super::claims::{SessionClaims, TokenKind};
use super::codec::TokenCodec;
use super::error::{AuthError, Result, TokenRejection};
use crate::types::UserId;

/// Decides whether a presented token is usable as a given kind right now
#[derive(Debug, Clone)]
pub struct TokenValidator {
    codec: Arc<TokenCodec>,
}

impl TokenValidator {
    #[must_use]
    pub const fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Parse `token` and check kind, issuer, then audience
    ///
    /// Short-circuits on the first failing check. The returned error names the
    /// sub-cause for logging only.
    pub fn authenticate(&self, token: &str, expected: TokenKind) -> Result<SessionClaims> {
        let claims = self.codec.parse(token)?;

        if claims.kind() != Some(expected) {
            return Err(AuthError::InvalidToken(TokenRejection::WrongKind));
        }
        if claims.iss != self.codec.issuer() {
            return Err(AuthError::InvalidToken(TokenRejection::WrongIssuer));
        }
        if !claims.has_audience(self.codec.audience()) {
            return Err(AuthError::InvalidToken(TokenRejection::WrongAudience));
        }

        Ok(claims)
    }

    /// True when `token` is currently usable as `expected`; never errors
    #[must_use]
    pub fn validate(&self, token: &str, expected: TokenKind) -> bool {
        match self.authenticate(token, expected) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(
                    expected = %expected,
                    reason = e.rejection().map_or("other", |r| r.as_str()),
                    "Token rejected"
                );
                false
            }
        }
    }

    /// Subject of a verified token, `None` on any parse failure
    ///
    /// Only signature and timing are checked, matching optional-auth callers.
    #[must_use]
    pub fn extract_subject(&self, token: &str) -> Option<UserId> {
        self.codec.parse(token).ok()?.user_id()
    }
}
