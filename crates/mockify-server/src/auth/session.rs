//! Session issuance after successful authentication

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::claims::TokenKind;
use super::config::{FederatedDelivery, FederatedLoginConfig, JwtConfig};
use super::credential::CredentialEncoder;
use super::error::{AuthError, Result, TokenRejection};
use super::identity::ProviderAttributes;
use super::provisioner::IdentityProvisioner;
use super::validator::TokenValidator;
use crate::constants::{
    BEARER_TOKEN_TYPE, OAUTH2_REDIRECT_PATH, REFRESH_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE_PATH,
};
use crate::store::UserStore;
use crate::types::UserId;

/// Token pair handed to the client
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in milliseconds
    pub expires_in: u64,
}

impl std::fmt::Debug for SessionPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPayload")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

/// Result of a federated login, shaped by [`FederatedDelivery`]
#[derive(Debug, Clone)]
pub enum FederatedLoginOutcome {
    /// Redirect carrying the access token; the refresh token rides in a cookie
    Redirect {
        location: Url,
        refresh_cookie: String,
    },
    Json(SessionPayload),
}

impl IntoResponse for FederatedLoginOutcome {
    fn into_response(self) -> Response {
        match self {
            Self::Redirect {
                location,
                refresh_cookie,
            } => (
                StatusCode::FOUND,
                [
                    (header::LOCATION, location.to_string()),
                    (header::SET_COOKIE, refresh_cookie),
                    (header::CACHE_CONTROL, "no-store".to_string()),
                ],
            )
                .into_response(),
            Self::Json(payload) => {
                ([(header::CACHE_CONTROL, "no-store")], Json(payload)).into_response()
            }
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Produces access/refresh token pairs for authenticated users
pub struct SessionIssuer {
    validator: TokenValidator,
    provisioner: IdentityProvisioner,
    users: Arc<dyn UserStore>,
    encoder: Arc<dyn CredentialEncoder>,
    /// Verified against when the email is unknown, so both paths pay the
    /// encoder's cost
    decoy_credential: Option<String>,
    access_ttl: Duration,
    refresh_ttl: Duration,
    federated: FederatedLoginConfig,
}

impl std::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("federated", &self.federated)
            .finish_non_exhaustive()
    }
}

impl SessionIssuer {
    #[must_use]
    pub fn new(
        validator: TokenValidator,
        users: Arc<dyn UserStore>,
        encoder: Arc<dyn CredentialEncoder>,
        jwt: &JwtConfig,
        federated: FederatedLoginConfig,
    ) -> Self {
        let decoy_credential = encoder
            .encode(&Uuid::new_v4().to_string())
            .inspect_err(|e| tracing::warn!(error = %e, "Failed to prepare decoy credential"))
            .ok();
        Self {
            validator,
            provisioner: IdentityProvisioner::new(Arc::clone(&users), Arc::clone(&encoder)),
            users,
            encoder,
            decoy_credential,
            access_ttl: jwt.access_token_ttl,
            refresh_ttl: jwt.refresh_token_ttl,
            federated,
        }
    }

    #[must_use]
    pub const fn validator(&self) -> &TokenValidator {
        &self.validator
    }

    #[must_use]
    pub const fn provisioner(&self) -> &IdentityProvisioner {
        &self.provisioner
    }

    /// Issue an access and a refresh token for `user_id`
    pub fn issue_session(&self, user_id: UserId) -> Result<SessionPayload> {
        let subject = user_id.to_string();
        let codec = self.validator.codec();

        let access_token = codec.issue(&subject, TokenKind::Access, self.access_ttl)?;
        let refresh_token = codec.issue(&subject, TokenKind::Refresh, self.refresh_ttl)?;

        tracing::debug!(user_id, "Issued session");
        Ok(SessionPayload {
            access_token,
            refresh_token,
            token_type: BEARER_TOKEN_TYPE.to_string(),
            expires_in: millis(self.access_ttl),
        })
    }

    /// Authenticate with email and password
    ///
    /// Unknown email and wrong password are indistinguishable to the caller,
    /// in both the error and the time taken.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionPayload> {
        let user = self.users.find_user_by_email(email).await?;

        match user {
            Some(user) if self.encoder.verify(password, &user.credential) => {
                tracing::info!(user_id = user.id, "Local login");
                self.issue_session(user.id)
            }
            Some(_) => {
                tracing::warn!("Local login failed");
                Err(AuthError::InvalidCredentials)
            }
            None => {
                if let Some(decoy) = &self.decoy_credential {
                    self.encoder.verify(password, decoy);
                }
                tracing::warn!("Local login failed");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Exchange a refresh token for a fresh session
    pub async fn refresh(&self, refresh_token: &str) -> Result<SessionPayload> {
        let claims = self
            .validator
            .authenticate(refresh_token, TokenKind::Refresh)
            .inspect_err(|e| tracing::warn!(error = %e, "Refresh token rejected"))?;

        let user_id = claims
            .user_id()
            .ok_or(AuthError::InvalidToken(TokenRejection::Malformed))?;

        if self.users.find_user_by_id(user_id).await?.is_none() {
            tracing::warn!(user_id, "Refresh token for unknown user");
            return Err(AuthError::NotAuthenticated);
        }

        self.issue_session(user_id)
    }

    /// Finish a federated login: resolve the account, issue a session and
    /// shape it for the configured delivery
    pub async fn complete_federated_login(
        &self,
        provider: &str,
        attributes: &ProviderAttributes,
    ) -> Result<FederatedLoginOutcome> {
        let profile = self.provisioner.load(provider, attributes).await?;
        let user = self.provisioner.resolve_or_create(&profile).await?;
        let session = self.issue_session(user.id)?;

        Ok(match self.federated.delivery {
            FederatedDelivery::Json => FederatedLoginOutcome::Json(session),
            FederatedDelivery::Redirect => FederatedLoginOutcome::Redirect {
                location: self.redirect_location(&session),
                refresh_cookie: self.refresh_cookie(&session.refresh_token),
            },
        })
    }

    /// Front-end callback URL carrying the access token and its lifetime
    ///
    /// The refresh token is never part of the URL.
    fn redirect_location(&self, session: &SessionPayload) -> Url {
        let mut location = self.federated.frontend_url.clone();
        if let Ok(mut segments) = location.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(OAUTH2_REDIRECT_PATH.split('/').filter(|s| !s.is_empty()));
        }
        // Operator-supplied query pairs survive; ours replace any stale copies
        let kept: Vec<(String, String)> = location
            .query_pairs()
            .filter(|(key, _)| key != "access_token" && key != "expires_in")
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        location
            .query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair("access_token", &session.access_token)
            .append_pair("expires_in", &session.expires_in.to_string());
        location
    }

    fn refresh_cookie(&self, refresh_token: &str) -> String {
        let secure = if self.federated.secure_cookie {
            "; Secure"
        } else {
            ""
        };
        format!(
            "{REFRESH_TOKEN_COOKIE}={refresh_token}; Path={REFRESH_TOKEN_COOKIE_PATH}; Max-Age={}; HttpOnly; SameSite=Strict{secure}",
            self.refresh_ttl.as_secs()
        )
    }
}
