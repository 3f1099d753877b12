//! Bearer token middleware for protected routes

use axum::extract::{OriginalUri, Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;

use super::claims::{AuthenticatedUser, TokenKind};
use super::entry_point::unauthorized;
use super::error::{AuthError, TokenRejection};
use super::validator::TokenValidator;
use crate::constants::BEARER_PREFIX;

/// Authentication state for middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    pub validator: TokenValidator,
}

impl AuthState {
    #[must_use]
    pub const fn new(validator: TokenValidator) -> Self {
        Self { validator }
    }

    /// Resolve the caller behind a presented access token
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthenticatedUser, AuthError> {
        let token = bearer_token(headers).ok_or(AuthError::NotAuthenticated)?;
        let claims = self.validator.authenticate(token, TokenKind::Access)?;
        AuthenticatedUser::from_claims(&claims)
            .ok_or(AuthError::InvalidToken(TokenRejection::Malformed))
    }
}

/// Token from an `Authorization: Bearer <token>` header
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Require a valid access token; inserts [`AuthenticatedUser`] on success
#[allow(clippy::future_not_send)]
pub async fn require_bearer(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.authenticate(request.headers()) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            // Nested routers see a stripped URI; report the one the client sent
            let path = request
                .extensions()
                .get::<OriginalUri>()
                .map_or_else(|| request.uri().path(), |uri| uri.path())
                .to_string();
            // Token contents are never logged
            tracing::warn!(
                path = %path,
                reason = %e.rejection().map_or_else(|| e.to_string(), |r| r.to_string()),
                "Authentication failed"
            );
            unauthorized(&path)
        }
    }
}
