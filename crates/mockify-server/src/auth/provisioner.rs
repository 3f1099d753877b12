//! Federated identity to local account resolution

use std::sync::Arc;

use uuid::Uuid;

use super::credential::CredentialEncoder;
use super::error::Result;
use super::identity::{IdentityProfile, ProviderAttributes, normalize};
use crate::store::{NewUser, UserAccount, UserStore};

/// Maps provider profiles onto local user accounts
///
/// Email uniqueness is enforced by the [`UserStore`]. When two first logins
/// for the same email race, the loser receives `DuplicateEmail` from the store
/// and falls back to a lookup, so both callers observe the same account.
#[derive(Clone)]
pub struct IdentityProvisioner {
    store: Arc<dyn UserStore>,
    encoder: Arc<dyn CredentialEncoder>,
}

impl std::fmt::Debug for IdentityProvisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityProvisioner").finish_non_exhaustive()
    }
}

impl IdentityProvisioner {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, encoder: Arc<dyn CredentialEncoder>) -> Self {
        Self { store, encoder }
    }

    /// Normalize a provider callback and report whether the user is known
    ///
    /// Read-only: account creation is deferred to [`Self::resolve_or_create`].
    pub async fn load(
        &self,
        provider: &str,
        attributes: &ProviderAttributes,
    ) -> Result<IdentityProfile> {
        let profile = normalize(provider, attributes).inspect_err(|e| {
            tracing::warn!(provider, error = %e, "Rejected federated identity");
        })?;

        match self.store.find_user_by_email(&profile.email).await? {
            Some(user) => {
                tracing::info!(provider = %profile.provider, user_id = user.id, "Existing federated user");
            }
            None => tracing::info!(provider = %profile.provider, "New federated user"),
        }

        Ok(profile)
    }

    /// Look the profile's email up, creating an account on first contact
    pub async fn resolve_or_create(&self, profile: &IdentityProfile) -> Result<UserAccount> {
        if let Some(user) = self.store.find_user_by_email(&profile.email).await? {
            return Ok(user);
        }

        let name = if profile.name.trim().is_empty() {
            profile.email.clone()
        } else {
            profile.name.clone()
        };
        // Federated accounts never log in locally; the credential is unusable
        let credential = self.encoder.encode(&Uuid::new_v4().to_string())?;

        let new_user = NewUser {
            email: profile.email.clone(),
            name,
            credential,
        };

        match self.store.save_user(new_user).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, provider = %profile.provider, "Provisioned user account");
                Ok(user)
            }
            Err(e) if e.is_duplicate_email() => {
                tracing::debug!("Concurrent first login, resolving existing account");
                self.store
                    .find_user_by_email(&profile.email)
                    .await?
                    .ok_or_else(|| e.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::auth::credential::Argon2Encoder;
    use crate::auth::error::AuthError;
    use crate::auth::identity::IdentityProvider;
    use crate::store::{InMemoryStore, StoreResult};
    use crate::types::UserId;

    fn profile(email: &str, name: &str) -> IdentityProfile {
        IdentityProfile {
            provider: IdentityProvider::Google,
            subject: Some("123".to_string()),
            email: email.to_string(),
            name: name.to_string(),
            avatar_url: None,
        }
    }

    fn provisioner(store: Arc<dyn UserStore>) -> IdentityProvisioner {
        IdentityProvisioner::new(store, Arc::new(Argon2Encoder))
    }

    /// Hides existing users from the first lookup, forcing a losing insert
    struct RacingStore {
        inner: InMemoryStore,
        hide_once: AtomicBool,
    }

    #[async_trait]
    impl UserStore for RacingStore {
        async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>> {
            if self.hide_once.swap(false, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find_user_by_email(email).await
        }

        async fn find_user_by_id(&self, id: UserId) -> StoreResult<Option<UserAccount>> {
            self.inner.find_user_by_id(id).await
        }

        async fn save_user(&self, user: NewUser) -> StoreResult<UserAccount> {
            self.inner.save_user(user).await
        }
    }

    #[tokio::test]
    async fn test_creates_account_on_first_contact() {
        let store = InMemoryStore::new();
        let provisioner = provisioner(Arc::new(store.clone()));

        let user = provisioner
            .resolve_or_create(&profile("a@b.com", "A B"))
            .await
            .unwrap();

        assert_eq!(user.email, "a@b.com");
        assert_eq!(user.name, "A B");
        assert!(user.credential.starts_with("$argon2"));
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn test_blank_name_falls_back_to_email() {
        let provisioner = provisioner(Arc::new(InMemoryStore::new()));
        let user = provisioner
            .resolve_or_create(&profile("a@b.com", ""))
            .await
            .unwrap();
        assert_eq!(user.name, "a@b.com");
    }

    #[tokio::test]
    async fn test_existing_account_is_reused() {
        let store = InMemoryStore::new();
        let provisioner = provisioner(Arc::new(store.clone()));

        let first = provisioner
            .resolve_or_create(&profile("a@b.com", "A"))
            .await
            .unwrap();
        let second = provisioner
            .resolve_or_create(&profile("a@b.com", "Renamed"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "A");
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn test_lost_insert_falls_back_to_lookup() {
        let inner = InMemoryStore::new();
        let existing = inner
            .save_user(NewUser {
                email: "a@b.com".to_string(),
                name: "A".to_string(),
                credential: "x".to_string(),
            })
            .await
            .unwrap();
        let racing = Arc::new(RacingStore {
            inner: inner.clone(),
            hide_once: AtomicBool::new(true),
        });

        let user = provisioner(racing)
            .resolve_or_create(&profile("a@b.com", "A"))
            .await
            .unwrap();

        assert_eq!(user.id, existing.id);
        assert_eq!(inner.user_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_logins_share_one_account() {
        let store = InMemoryStore::new();
        let provisioner = provisioner(Arc::new(store.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let provisioner = provisioner.clone();
                tokio::spawn(async move {
                    provisioner
                        .resolve_or_create(&profile("race@b.com", "Racer"))
                        .await
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }

        assert_eq!(store.user_count(), 1);
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn test_load_is_read_only() {
        let store = InMemoryStore::new();
        let provisioner = provisioner(Arc::new(store.clone()));
        let attributes = serde_json::json!({"sub": "1", "email": "new@b.com"});
        let attributes = attributes.as_object().unwrap();

        let profile = provisioner.load("google", attributes).await.unwrap();
        assert_eq!(profile.email, "new@b.com");
        assert_eq!(store.user_count(), 0);
    }

    #[tokio::test]
    async fn test_load_rejects_unknown_provider() {
        let provisioner = provisioner(Arc::new(InMemoryStore::new()));
        let attributes = serde_json::json!({"email": "a@b.com"});

        let err = provisioner
            .load("github", attributes.as_object().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UnsupportedProvider(_)));
    }
}
