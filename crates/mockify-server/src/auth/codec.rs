//! Session token encoding and parsing

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, Header, Validation};
use uuid::Uuid;

use super::claims::{OneOrMany, SessionClaims, TokenKind};
use super::config::JwtConfig;
use super::error::{AuthError, Result, TokenRejection};
use super::key::{SigningKey, derive_signing_key};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Issues and parses HS256-signed session tokens
pub struct TokenCodec {
    key: SigningKey,
    issuer: String,
    audience: String,
    header: Header,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("key", &self.key)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway", &self.validation.leeway)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    #[must_use]
    pub fn new(key: SigningKey, issuer: String, audience: String, leeway: Duration) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        // issuer and audience are policy checks owned by the validator
        validation.validate_aud = false;
        validation.leeway = leeway.as_secs();
        validation.set_required_spec_claims(&["exp", "nbf", "sub"]);

        Self {
            key,
            issuer,
            audience,
            header: Header::new(ALGORITHM),
            validation,
        }
    }

    /// Derive the signing key from `config.secret` and build a codec
    #[must_use]
    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(
            derive_signing_key(&config.secret),
            config.issuer.clone(),
            config.audience.clone(),
            config.leeway,
        )
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub fn audience(&self) -> &str {
        &self.audience
    }

    #[must_use]
    pub const fn signing_key(&self) -> &SigningKey {
        &self.key
    }

    /// Issue a token of `kind` for `subject`, valid from now for `ttl`
    pub fn issue(&self, subject: &str, kind: TokenKind, ttl: Duration) -> Result<String> {
        self.issue_at(subject, kind, ttl, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        subject: &str,
        kind: TokenKind,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let issued_at = now.timestamp();
        // Round up so a sub-second remainder never shortens the lifetime
        let secs = ttl.as_secs().saturating_add(u64::from(ttl.subsec_nanos() > 0));
        let lifetime = i64::try_from(secs).unwrap_or(i64::MAX);

        let claims = SessionClaims {
            sub: subject.to_string(),
            iss: self.issuer.clone(),
            aud: Some(OneOrMany::Many(vec![self.audience.clone()])),
            iat: issued_at,
            nbf: issued_at,
            exp: issued_at.saturating_add(lifetime),
            jti: Uuid::new_v4().to_string(),
            token_type: Some(kind.as_str().to_string()),
        };

        jsonwebtoken::encode(&self.header, &claims, self.key.encoding_key())
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify signature, expiry and not-before, returning the claims
    ///
    /// A token is live while `nbf <= now < exp` (widened by the leeway).
    pub fn parse(&self, token: &str) -> Result<SessionClaims> {
        let data =
            jsonwebtoken::decode::<SessionClaims>(token, self.key.decoding_key(), &self.validation)?;
        let claims = data.claims;

        let leeway = i64::try_from(self.validation.leeway).unwrap_or(i64::MAX);
        if Utc::now().timestamp() >= claims.exp.saturating_add(leeway) {
            return Err(AuthError::InvalidToken(TokenRejection::Expired));
        }

        Ok(claims)
    }
}
