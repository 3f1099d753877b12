//! Environment variable loading for configuration

use std::env;
use std::net::IpAddr;
use std::time::Duration;

use url::Url;

use super::builder::ConfigBuilder;
use crate::Result;
use crate::auth::FederatedDelivery;
use crate::types::SchemaId;

/// Environment variable names
mod vars {
    pub const JWT_SECRET: &str = "MOCKIFY_JWT_SECRET";
    pub const JWT_ACCESS_EXPIRATION_MS: &str = "MOCKIFY_JWT_ACCESS_EXPIRATION_MS";
    pub const JWT_REFRESH_EXPIRATION_MS: &str = "MOCKIFY_JWT_REFRESH_EXPIRATION_MS";
    pub const JWT_ISSUER: &str = "MOCKIFY_JWT_ISSUER";
    pub const JWT_AUDIENCE: &str = "MOCKIFY_JWT_AUDIENCE";
    pub const JWT_LEEWAY_SECS: &str = "MOCKIFY_JWT_LEEWAY_SECS";
    pub const FRONTEND_URL: &str = "MOCKIFY_FRONTEND_URL";
    pub const OAUTH2_DELIVERY: &str = "MOCKIFY_OAUTH2_DELIVERY";
    pub const OAUTH2_SECURE_COOKIE: &str = "MOCKIFY_OAUTH2_SECURE_COOKIE";
    pub const HTTP_HOST: &str = "MOCKIFY_HTTP_HOST";
    pub const HTTP_PORT: &str = "MOCKIFY_HTTP_PORT";
    pub const CORS_ORIGIN: &str = "MOCKIFY_CORS_ORIGIN";
    pub const PUBLIC_SCHEMA_IDS: &str = "MOCKIFY_PUBLIC_SCHEMA_IDS";
    pub const RUST_LOG: &str = "RUST_LOG";
    pub const JSON_LOGS: &str = "MOCKIFY_JSON_LOGS";
}

/// Load configuration from environment variables
pub fn load_from_env(mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
    if let Ok(secret) = env::var(vars::JWT_SECRET) {
        builder = builder.jwt_secret(secret);
    }

    // Lifetimes are configured in milliseconds
    if let Ok(ms) = env::var(vars::JWT_ACCESS_EXPIRATION_MS) {
        builder = builder.access_token_ttl(parse_millis(vars::JWT_ACCESS_EXPIRATION_MS, &ms)?);
    }
    if let Ok(ms) = env::var(vars::JWT_REFRESH_EXPIRATION_MS) {
        builder = builder.refresh_token_ttl(parse_millis(vars::JWT_REFRESH_EXPIRATION_MS, &ms)?);
    }

    if let Ok(issuer) = env::var(vars::JWT_ISSUER) {
        builder = builder.issuer(issuer);
    }
    if let Ok(audience) = env::var(vars::JWT_AUDIENCE) {
        builder = builder.audience(audience);
    }

    if let Ok(secs_str) = env::var(vars::JWT_LEEWAY_SECS)
        && let Ok(secs) = secs_str.parse::<u64>()
    {
        builder = builder.leeway(Duration::from_secs(secs));
    }

    // Federated login
    if let Ok(url_str) = env::var(vars::FRONTEND_URL) {
        let url = Url::parse(&url_str).map_err(|e| {
            crate::Error::Config(format!("Invalid {}: {}", vars::FRONTEND_URL, e))
        })?;
        builder = builder.frontend_url(url);
    }

    if let Ok(mode) = env::var(vars::OAUTH2_DELIVERY) {
        let delivery: FederatedDelivery = mode.parse().unwrap_or_default();
        builder = builder.delivery(delivery);
    }

    if let Ok(val) = env::var(vars::OAUTH2_SECURE_COOKIE) {
        builder = builder.secure_cookie(parse_bool(&val));
    }

    // HTTP listener
    if let Ok(host_str) = env::var(vars::HTTP_HOST)
        && let Ok(host) = host_str.parse::<IpAddr>()
    {
        builder = builder.http_host(host);
    }

    if let Ok(port_str) = env::var(vars::HTTP_PORT)
        && let Ok(port) = port_str.parse::<u16>()
    {
        builder = builder.http_port(port);
    }

    if let Ok(origin) = env::var(vars::CORS_ORIGIN) {
        let origin = origin.trim();
        builder = builder.cors_origin((!origin.is_empty()).then(|| origin.to_string()));
    }

    if let Ok(ids) = env::var(vars::PUBLIC_SCHEMA_IDS) {
        builder = builder.public_schema_ids(parse_id_list(&ids)?);
    }

    // Telemetry
    if let Ok(level) = env::var(vars::RUST_LOG) {
        builder = builder.log_level(level);
    }

    if let Ok(val) = env::var(vars::JSON_LOGS) {
        builder = builder.json_logs(parse_bool(&val));
    }

    Ok(builder)
}

fn parse_bool(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

fn parse_millis(name: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| crate::Error::Config(format!("Invalid {name}: {e}")))
}

/// Parse a comma-separated list of schema ids, skipping empty entries
fn parse_id_list(s: &str) -> Result<Vec<SchemaId>> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<SchemaId>().map_err(|e| {
                crate::Error::Config(format!(
                    "Invalid {} entry '{part}': {e}",
                    vars::PUBLIC_SCHEMA_IDS
                ))
            })
        })
        .collect()
}
