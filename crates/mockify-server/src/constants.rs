//! Constants for the Mockify server

use std::time::Duration;

/// Default `iss` claim placed in and required of every session token
pub const DEFAULT_ISSUER: &str = "mockify-api";

/// Default client identifier placed in and required of the `aud` claim
pub const DEFAULT_AUDIENCE: &str = "mockify-web";

/// Minimum signing key length (256 bits) before the key is flagged as weak
pub const MIN_SIGNING_KEY_BYTES: usize = 32;

/// Shortest accepted token lifetime; `exp` has whole-second resolution
pub const MIN_TOKEN_TTL: Duration = Duration::from_secs(1);

/// Token type reported in session payloads
pub const BEARER_TOKEN_TYPE: &str = "Bearer";

/// `Authorization` header scheme prefix
pub const BEARER_PREFIX: &str = "Bearer ";

/// Cookie carrying the refresh token after a federated login redirect
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Path the refresh cookie is scoped to
pub const REFRESH_TOKEN_COOKIE_PATH: &str = "/api/v1/auth";

/// Front-end route receiving the federated login redirect
pub const OAUTH2_REDIRECT_PATH: &str = "/oauth2/redirect";

/// Lifetime of a freshly created mock record, in days
pub const RECORD_TTL_DAYS: i64 = 7;

/// Error label of the authentication failure body
pub const UNAUTHORIZED_ERROR: &str = "Unauthorized";

/// Message of the authentication failure body
pub const UNAUTHORIZED_MESSAGE: &str =
    "Authentication required. Please login to access this resource.";

/// Service status: healthy
pub const STATUS_OK: &str = "ok";
