//! Federated identity provider profiles
//!
//! Each supported provider is a variant of [`IdentityProvider`] with its own
//! attribute extraction rule. Adding a provider means adding a variant and a
//! match arm in [`IdentityProvider::normalize`].

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use super::error::{AuthError, Result};

/// Raw attribute map handed over by a provider callback
pub type ProviderAttributes = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityProvider {
    Google,
}

impl IdentityProvider {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
        }
    }

    /// Extract a profile from the provider's attributes
    ///
    /// Fails with [`AuthError::MissingEmail`] when no non-blank email is present.
    pub fn normalize(self, attributes: &ProviderAttributes) -> Result<IdentityProfile> {
        let profile = match self {
            Self::Google => google_profile(attributes),
        };

        if profile.email.trim().is_empty() {
            return Err(AuthError::MissingEmail);
        }
        Ok(profile)
    }
}

impl fmt::Display for IdentityProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentityProvider {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            _ => Err(AuthError::UnsupportedProvider(s.to_string())),
        }
    }
}

/// Provider-supplied identity, transient for one login exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProfile {
    pub provider: IdentityProvider,
    /// Provider-assigned subject identifier
    pub subject: Option<String>,
    pub email: String,
    /// Display name; may be empty
    pub name: String,
    pub avatar_url: Option<String>,
}

/// Resolve `provider` by name and normalize `attributes` with it
pub fn normalize(provider: &str, attributes: &ProviderAttributes) -> Result<IdentityProfile> {
    provider.parse::<IdentityProvider>()?.normalize(attributes)
}

fn attribute(attributes: &ProviderAttributes, key: &str) -> Option<String> {
    match attributes.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn google_profile(attributes: &ProviderAttributes) -> IdentityProfile {
    let name = attribute(attributes, "name").unwrap_or_else(|| {
        let given = attribute(attributes, "given_name").unwrap_or_default();
        let family = attribute(attributes, "family_name").unwrap_or_default();
        format!("{given} {family}").trim().to_string()
    });

    IdentityProfile {
        provider: IdentityProvider::Google,
        subject: attribute(attributes, "sub"),
        email: attribute(attributes, "email").unwrap_or_default(),
        name,
        avatar_url: attribute(attributes, "picture"),
    }
}
