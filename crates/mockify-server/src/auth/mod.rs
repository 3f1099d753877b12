//! Authentication and authorization
//!
//! Session tokens are compact HS256 JWS strings carrying `sub`, `iss`, `aud`,
//! `iat`, `nbf`, `exp`, `jti` and a `type` claim (`access` or `refresh`).
//!
//! - [`TokenCodec`] signs and parses tokens with a [`SigningKey`] derived once
//!   at startup
//! - [`TokenValidator`] applies kind, issuer and audience policy
//! - [`IdentityProvisioner`] maps federated profiles to local accounts
//! - [`SessionIssuer`] produces token pairs after login, refresh or a federated
//!   callback
//! - [`check_access`] is the ownership gate used by every directory service
//! - [`require_bearer`] protects routes and answers failures with the
//!   structured 401 body from [`unauthorized`]

mod access;
mod claims;
mod codec;
mod config;
mod credential;
mod entry_point;
mod error;
mod identity;
mod key;
mod middleware;
mod provisioner;
mod session;
mod validator;

pub use access::check_access;
pub use claims::{AuthenticatedUser, OneOrMany, SessionClaims, TokenKind};
pub use codec::TokenCodec;
pub use config::{FederatedDelivery, FederatedLoginConfig, JwtConfig};
pub use credential::{Argon2Encoder, CredentialEncoder};
pub use entry_point::{AuthFailureBody, unauthorized};
pub use error::{AuthError, Result, TokenRejection};
pub use identity::{IdentityProfile, IdentityProvider, ProviderAttributes, normalize};
pub use key::{KeyMaterial, SigningKey, derive_signing_key};
pub use middleware::{AuthState, bearer_token, require_bearer};
pub use provisioner::IdentityProvisioner;
pub use session::{FederatedLoginOutcome, SessionIssuer, SessionPayload};
pub use validator::TokenValidator;
