//! Authentication configuration types

use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::constants::{DEFAULT_AUDIENCE, DEFAULT_ISSUER};

/// Session token configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Signing secret, base64-encoded or raw text
    pub secret: String,
    /// Access token lifetime
    pub access_token_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_token_ttl: Duration,
    /// `iss` claim issued and required
    pub issuer: String,
    /// Client identifier issued in and required of `aud`
    pub audience: String,
    /// Clock skew tolerance for exp/nbf validation
    pub leeway: Duration,
}

// Custom Debug impl that redacts the signing secret
impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway", &self.leeway)
            .finish_non_exhaustive()
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            access_token_ttl: Duration::from_secs(15 * 60),
            refresh_token_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            leeway: Duration::ZERO,
        }
    }
}

impl JwtConfig {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub const fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    #[must_use]
    pub const fn with_refresh_token_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_token_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    #[must_use]
    pub const fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }
}

/// How the session reaches the front end after a federated login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FederatedDelivery {
    /// Redirect to the front-end callback with the access token in the query
    /// string; the refresh token travels in an `HttpOnly` cookie
    #[default]
    Redirect,
    /// Return the full session payload as a JSON body
    Json,
}

impl FromStr for FederatedDelivery {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "json" | "body" => Self::Json,
            _ => Self::Redirect,
        })
    }
}

/// Federated (OAuth2) login completion settings
#[derive(Debug, Clone)]
pub struct FederatedLoginConfig {
    /// Front-end base URL receiving the login redirect
    pub frontend_url: Url,
    pub delivery: FederatedDelivery,
    /// Mark the refresh cookie `Secure` (disable only for plain-HTTP local dev)
    pub secure_cookie: bool,
}

impl Default for FederatedLoginConfig {
    fn default() -> Self {
        Self {
            frontend_url: Url::parse("http://localhost:3000").expect("valid default URL"),
            delivery: FederatedDelivery::Redirect,
            secure_cookie: true,
        }
    }
}

impl FederatedLoginConfig {
    #[must_use]
    pub fn new(frontend_url: Url) -> Self {
        Self {
            frontend_url,
            ..Default::default()
        }
    }

    #[must_use]
    pub const fn with_delivery(mut self, delivery: FederatedDelivery) -> Self {
        self.delivery = delivery;
        self
    }
}
