//! Application state shared by the HTTP handlers

use std::sync::Arc;

use crate::auth::{
    Argon2Encoder, AuthState, CredentialEncoder, SessionIssuer, TokenCodec, TokenValidator,
};
use crate::config::Config;
use crate::directory::{OrganizationService, ProjectService, PublicRecordService, RecordService};
use crate::store::{DirectoryStore, InMemoryStore, UserStore};

/// Services behind the router
///
/// Cloning is cheap; every service holds its collaborators behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionIssuer>,
    pub auth: AuthState,
    pub organizations: OrganizationService,
    pub projects: ProjectService,
    pub records: RecordService,
    pub public_records: PublicRecordService,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("sessions", &self.sessions)
            .field("public_records", &self.public_records)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Wire every service against the given stores
    #[must_use]
    pub fn new(
        config: &Config,
        users: Arc<dyn UserStore>,
        directory: Arc<dyn DirectoryStore>,
        encoder: Arc<dyn CredentialEncoder>,
    ) -> Self {
        let codec = Arc::new(TokenCodec::from_config(&config.jwt));
        let validator = TokenValidator::new(codec);

        let sessions = SessionIssuer::new(
            validator.clone(),
            Arc::clone(&users),
            encoder,
            &config.jwt,
            config.federated.clone(),
        );

        Self {
            sessions: Arc::new(sessions),
            auth: AuthState::new(validator),
            organizations: OrganizationService::new(Arc::clone(&directory), users),
            projects: ProjectService::new(Arc::clone(&directory)),
            records: RecordService::new(Arc::clone(&directory)),
            public_records: PublicRecordService::new(directory, config.public.schema_ids.clone()),
        }
    }

    /// State backed by a single in-memory store and Argon2 credentials
    #[must_use]
    pub fn in_memory(config: &Config, store: &InMemoryStore) -> Self {
        Self::new(
            config,
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(Argon2Encoder),
        )
    }
}
