//! Persistence collaborators
//!
//! The authentication core only needs [`UserStore`]; the organization, project,
//! schema and record services go through [`DirectoryStore`]. Both are async so a
//! database-backed implementation can replace [`InMemoryStore`] without touching
//! the callers.

mod error;
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;

use crate::types::{OrganizationId, ProjectId, RecordId, SchemaId, UserId};

/// Local user account
#[derive(Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: UserId,
    pub email: String,
    pub name: String,
    /// Encoded credential; opaque to everything except the credential encoder
    pub credential: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for UserAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAccount")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// User account before the store assigns an identifier
#[derive(Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub credential: String,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub organization_id: OrganizationId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockSchema {
    pub id: SchemaId,
    pub name: String,
    pub project_id: ProjectId,
    pub schema_json: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockRecord {
    pub id: RecordId,
    pub schema_id: SchemaId,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl MockRecord {
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// User lookup and creation
///
/// Implementations MUST enforce email uniqueness atomically inside
/// [`UserStore::save_user`]: a second account with an existing email is
/// rejected with [`StoreError::DuplicateEmail`].
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>>;

    async fn find_user_by_id(&self, id: UserId) -> StoreResult<Option<UserAccount>>;

    /// Persist a new account and assign its identifier
    async fn save_user(&self, user: NewUser) -> StoreResult<UserAccount>;
}

/// Record before the store assigns an identifier
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub schema_id: SchemaId,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Organization / project / schema / record persistence
///
/// Organization names are unique per owner, compared case-insensitively.
/// Implementations MUST check that atomically with the write in
/// [`DirectoryStore::insert_organization`] and
/// [`DirectoryStore::rename_organization`], rejecting a clash with
/// [`StoreError::DuplicateOrganizationName`].
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn insert_organization(&self, owner_id: UserId, name: &str) -> StoreResult<Organization>;

    async fn organization(&self, id: OrganizationId) -> StoreResult<Option<Organization>>;

    async fn organizations_by_owner(&self, owner_id: UserId) -> StoreResult<Vec<Organization>>;

    async fn rename_organization(
        &self,
        id: OrganizationId,
        name: &str,
    ) -> StoreResult<Option<Organization>>;

    /// Delete an organization together with its projects, schemas and records
    async fn delete_organization(&self, id: OrganizationId) -> StoreResult<bool>;

    async fn insert_project(
        &self,
        organization_id: OrganizationId,
        name: &str,
    ) -> StoreResult<Project>;

    async fn project(&self, id: ProjectId) -> StoreResult<Option<Project>>;

    async fn projects_by_organization(
        &self,
        organization_id: OrganizationId,
    ) -> StoreResult<Vec<Project>>;

    async fn insert_schema(
        &self,
        project_id: ProjectId,
        name: &str,
        schema_json: Value,
    ) -> StoreResult<MockSchema>;

    async fn schema(&self, id: SchemaId) -> StoreResult<Option<MockSchema>>;

    async fn schemas_by_project(&self, project_id: ProjectId) -> StoreResult<Vec<MockSchema>>;

    async fn insert_record(
        &self,
        schema_id: SchemaId,
        data: Value,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<MockRecord>;

    /// Insert a batch atomically: if any parent schema is missing, nothing is
    /// written
    async fn insert_records(&self, records: Vec<NewRecord>) -> StoreResult<Vec<MockRecord>>;

    async fn record(&self, id: RecordId) -> StoreResult<Option<MockRecord>>;

    async fn records_by_schema(&self, schema_id: SchemaId) -> StoreResult<Vec<MockRecord>>;

    async fn replace_record_data(&self, id: RecordId, data: Value)
    -> StoreResult<Option<MockRecord>>;

    async fn delete_record(&self, id: RecordId) -> StoreResult<bool>;

    /// Delete every record whose expiry lies before `cutoff`, returning the count
    async fn delete_records_expiring_before(&self, cutoff: DateTime<Utc>) -> StoreResult<usize>;
}
