//! Configuration builder

use std::collections::BTreeSet;
use std::net::IpAddr;
use std::time::Duration;

use url::Url;

use crate::Error;
use crate::auth::{FederatedDelivery, FederatedLoginConfig, JwtConfig};
use crate::constants::{DEFAULT_AUDIENCE, DEFAULT_ISSUER, MIN_TOKEN_TTL};
use crate::types::SchemaId;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt: JwtConfig,
    pub federated: FederatedLoginConfig,
    pub http: HttpConfig,
    pub telemetry: TelemetryConfig,
    pub public: PublicAccessConfig,
}

impl Config {
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Allowed CORS origin; `None` disables cross-origin access
    pub cors_origin: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
            port: 8080,
            cors_origin: None,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub json_logs: bool,
}

/// Schemas readable without authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicAccessConfig {
    pub schema_ids: BTreeSet<SchemaId>,
}

impl Default for PublicAccessConfig {
    fn default() -> Self {
        Self {
            schema_ids: BTreeSet::from([1, 2, 5]),
        }
    }
}

/// Configuration builder with fluent API
pub struct ConfigBuilder {
    jwt_secret: Option<String>,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
    issuer: String,
    audience: String,
    leeway: Duration,
    frontend_url: Option<Url>,
    delivery: FederatedDelivery,
    secure_cookie: bool,
    http: HttpConfig,
    telemetry: TelemetryConfig,
    public: PublicAccessConfig,
}

// Custom Debug impl that never prints the signing secret
impl std::fmt::Debug for ConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigBuilder")
            .field("has_jwt_secret", &self.jwt_secret.is_some())
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("frontend_url", &self.frontend_url)
            .field("delivery", &self.delivery)
            .field("http", &self.http)
            .field("telemetry", &self.telemetry)
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        let jwt = JwtConfig::default();
        Self {
            jwt_secret: None,
            access_token_ttl: jwt.access_token_ttl,
            refresh_token_ttl: jwt.refresh_token_ttl,
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            leeway: Duration::ZERO,
            frontend_url: None,
            delivery: FederatedDelivery::Redirect,
            secure_cookie: true,
            http: HttpConfig::default(),
            telemetry: TelemetryConfig::default(),
            public: PublicAccessConfig::default(),
        }
    }

    #[must_use]
    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = Some(secret.into());
        self
    }

    #[must_use]
    pub const fn access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    #[must_use]
    pub const fn refresh_token_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_token_ttl = ttl;
        self
    }

    #[must_use]
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    #[must_use]
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    #[must_use]
    pub const fn leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    #[must_use]
    pub fn frontend_url(mut self, url: Url) -> Self {
        self.frontend_url = Some(url);
        self
    }

    #[must_use]
    pub const fn delivery(mut self, delivery: FederatedDelivery) -> Self {
        self.delivery = delivery;
        self
    }

    /// Mark the refresh cookie `Secure` (on by default)
    #[must_use]
    pub const fn secure_cookie(mut self, secure: bool) -> Self {
        self.secure_cookie = secure;
        self
    }

    #[must_use]
    pub const fn http_host(mut self, host: IpAddr) -> Self {
        self.http.host = host;
        self
    }

    #[must_use]
    pub const fn http_port(mut self, port: u16) -> Self {
        self.http.port = port;
        self
    }

    #[must_use]
    pub fn cors_origin(mut self, origin: Option<String>) -> Self {
        self.http.cors_origin = origin;
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: String) -> Self {
        self.telemetry.log_level = level;
        self
    }

    #[must_use]
    pub const fn json_logs(mut self, enabled: bool) -> Self {
        self.telemetry.json_logs = enabled;
        self
    }

    #[must_use]
    pub fn public_schema_ids(mut self, ids: impl IntoIterator<Item = SchemaId>) -> Self {
        self.public.schema_ids = ids.into_iter().collect();
        self
    }

    /// Build the configuration
    pub fn build(self) -> crate::Result<Config> {
        let secret = self
            .jwt_secret
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::Config("jwt secret is required".into()))?;

        if self.access_token_ttl < MIN_TOKEN_TTL {
            return Err(Error::Config(
                "access token lifetime must be at least 1000 ms".into(),
            ));
        }
        if self.refresh_token_ttl < MIN_TOKEN_TTL {
            return Err(Error::Config(
                "refresh token lifetime must be at least 1000 ms".into(),
            ));
        }

        let mut federated = match self.frontend_url {
            Some(url) => {
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(Error::Config(format!(
                        "frontend URL must be http or https: {url}"
                    )));
                }
                FederatedLoginConfig::new(url)
            }
            None => FederatedLoginConfig::default(),
        };
        federated.delivery = self.delivery;
        federated.secure_cookie = self.secure_cookie;

        let log_level = if self.telemetry.log_level.is_empty() {
            "info".to_string()
        } else {
            self.telemetry.log_level
        };

        Ok(Config {
            jwt: JwtConfig::new(secret)
                .with_access_token_ttl(self.access_token_ttl)
                .with_refresh_token_ttl(self.refresh_token_ttl)
                .with_issuer(self.issuer)
                .with_audience(self.audience)
                .with_leeway(self.leeway),
            federated,
            http: self.http,
            telemetry: TelemetryConfig {
                log_level,
                json_logs: self.telemetry.json_logs,
            },
            public: self.public,
        })
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
