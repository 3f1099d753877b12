//! In-memory store implementation

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;

use super::error::{StoreError, StoreResult};
use super::{
    DirectoryStore, MockRecord, MockSchema, NewRecord, NewUser, Organization, Project, UserAccount,
    UserStore,
};
use crate::types::{OrganizationId, ProjectId, RecordId, SchemaId, UserId};

/// Monotonic identifier sequences, one per table
#[derive(Default)]
struct Sequences {
    user: i64,
    organization: i64,
    project: i64,
    schema: i64,
    record: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, UserAccount>,
    users_by_email: HashMap<String, UserId>,
    organizations: BTreeMap<OrganizationId, Organization>,
    projects: BTreeMap<ProjectId, Project>,
    schemas: BTreeMap<SchemaId, MockSchema>,
    records: BTreeMap<RecordId, MockRecord>,
    sequences: Sequences,
}

impl Tables {
    /// Reject `name` when `owner_id` already owns another organization with
    /// it, ignoring case
    fn check_organization_name(
        &self,
        owner_id: UserId,
        name: &str,
        except: Option<OrganizationId>,
    ) -> StoreResult<()> {
        let lowered = name.to_lowercase();
        let taken = self.organizations.values().any(|o| {
            o.owner_id == owner_id && Some(o.id) != except && o.name.to_lowercase() == lowered
        });
        if taken {
            return Err(StoreError::DuplicateOrganizationName(name.to_string()));
        }
        Ok(())
    }

    fn push_record(&mut self, record: NewRecord) -> StoreResult<MockRecord> {
        if !self.schemas.contains_key(&record.schema_id) {
            return Err(StoreError::MissingParent {
                entity: "schema",
                id: record.schema_id,
            });
        }

        let record = MockRecord {
            id: next(&mut self.sequences.record),
            schema_id: record.schema_id,
            data: record.data,
            created_at: record.created_at,
            expires_at: record.expires_at,
        };
        self.records.insert(record.id, record.clone());
        Ok(record)
    }

    fn remove_schema_cascade(&mut self, schema_id: SchemaId) {
        self.schemas.remove(&schema_id);
        self.records.retain(|_, r| r.schema_id != schema_id);
    }

    fn remove_project_cascade(&mut self, project_id: ProjectId) {
        self.projects.remove(&project_id);
        let schema_ids: Vec<SchemaId> = self
            .schemas
            .values()
            .filter(|s| s.project_id == project_id)
            .map(|s| s.id)
            .collect();
        for schema_id in schema_ids {
            self.remove_schema_cascade(schema_id);
        }
    }
}

/// Thread-safe in-memory store
///
/// All tables sit behind one lock, so every uniqueness or parent check happens
/// atomically with the write that depends on it. The lock is never held across
/// an `.await`.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tables = self.tables.read();
        f.debug_struct("InMemoryStore")
            .field("users", &tables.users.len())
            .field("organizations", &tables.organizations.len())
            .field("projects", &tables.projects.len())
            .field("schemas", &tables.schemas.len())
            .field("records", &tables.records.len())
            .finish()
    }
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored user accounts
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.tables.read().users.len()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>> {
        let tables = self.tables.read();
        Ok(tables
            .users_by_email
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn find_user_by_id(&self, id: UserId) -> StoreResult<Option<UserAccount>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn save_user(&self, user: NewUser) -> StoreResult<UserAccount> {
        let mut tables = self.tables.write();
        if tables.users_by_email.contains_key(&user.email) {
            return Err(StoreError::DuplicateEmail(user.email));
        }

        let id = next(&mut tables.sequences.user);
        let account = UserAccount {
            id,
            email: user.email,
            name: user.name,
            credential: user.credential,
            created_at: Utc::now(),
        };
        tables.users_by_email.insert(account.email.clone(), id);
        tables.users.insert(id, account.clone());
        Ok(account)
    }
}

#[async_trait]
impl DirectoryStore for InMemoryStore {
    async fn insert_organization(&self, owner_id: UserId, name: &str) -> StoreResult<Organization> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&owner_id) {
            return Err(StoreError::MissingParent {
                entity: "user",
                id: owner_id,
            });
        }
        tables.check_organization_name(owner_id, name, None)?;

        let organization = Organization {
            id: next(&mut tables.sequences.organization),
            name: name.to_string(),
            owner_id,
            created_at: Utc::now(),
        };
        tables
            .organizations
            .insert(organization.id, organization.clone());
        Ok(organization)
    }

    async fn organization(&self, id: OrganizationId) -> StoreResult<Option<Organization>> {
        Ok(self.tables.read().organizations.get(&id).cloned())
    }

    async fn organizations_by_owner(&self, owner_id: UserId) -> StoreResult<Vec<Organization>> {
        Ok(self
            .tables
            .read()
            .organizations
            .values()
            .filter(|o| o.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn rename_organization(
        &self,
        id: OrganizationId,
        name: &str,
    ) -> StoreResult<Option<Organization>> {
        let mut tables = self.tables.write();
        let Some(owner_id) = tables.organizations.get(&id).map(|o| o.owner_id) else {
            return Ok(None);
        };
        tables.check_organization_name(owner_id, name, Some(id))?;

        Ok(tables.organizations.get_mut(&id).map(|o| {
            o.name = name.to_string();
            o.clone()
        }))
    }

    async fn delete_organization(&self, id: OrganizationId) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        if tables.organizations.remove(&id).is_none() {
            return Ok(false);
        }
        let project_ids: Vec<ProjectId> = tables
            .projects
            .values()
            .filter(|p| p.organization_id == id)
            .map(|p| p.id)
            .collect();
        for project_id in project_ids {
            tables.remove_project_cascade(project_id);
        }
        Ok(true)
    }

    async fn insert_project(
        &self,
        organization_id: OrganizationId,
        name: &str,
    ) -> StoreResult<Project> {
        let mut tables = self.tables.write();
        if !tables.organizations.contains_key(&organization_id) {
            return Err(StoreError::MissingParent {
                entity: "organization",
                id: organization_id,
            });
        }

        let project = Project {
            id: next(&mut tables.sequences.project),
            name: name.to_string(),
            organization_id,
            created_at: Utc::now(),
        };
        tables.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn project(&self, id: ProjectId) -> StoreResult<Option<Project>> {
        Ok(self.tables.read().projects.get(&id).cloned())
    }

    async fn projects_by_organization(
        &self,
        organization_id: OrganizationId,
    ) -> StoreResult<Vec<Project>> {
        Ok(self
            .tables
            .read()
            .projects
            .values()
            .filter(|p| p.organization_id == organization_id)
            .cloned()
            .collect())
    }

    async fn insert_schema(
        &self,
        project_id: ProjectId,
        name: &str,
        schema_json: Value,
    ) -> StoreResult<MockSchema> {
        let mut tables = self.tables.write();
        if !tables.projects.contains_key(&project_id) {
            return Err(StoreError::MissingParent {
                entity: "project",
                id: project_id,
            });
        }

        let schema = MockSchema {
            id: next(&mut tables.sequences.schema),
            name: name.to_string(),
            project_id,
            schema_json,
            created_at: Utc::now(),
        };
        tables.schemas.insert(schema.id, schema.clone());
        Ok(schema)
    }

    async fn schema(&self, id: SchemaId) -> StoreResult<Option<MockSchema>> {
        Ok(self.tables.read().schemas.get(&id).cloned())
    }

    async fn schemas_by_project(&self, project_id: ProjectId) -> StoreResult<Vec<MockSchema>> {
        Ok(self
            .tables
            .read()
            .schemas
            .values()
            .filter(|s| s.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn insert_record(
        &self,
        schema_id: SchemaId,
        data: Value,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<MockRecord> {
        self.tables.write().push_record(NewRecord {
            schema_id,
            data,
            created_at,
            expires_at,
        })
    }

    async fn insert_records(&self, records: Vec<NewRecord>) -> StoreResult<Vec<MockRecord>> {
        let mut tables = self.tables.write();
        if let Some(missing) = records
            .iter()
            .find(|r| !tables.schemas.contains_key(&r.schema_id))
        {
            return Err(StoreError::MissingParent {
                entity: "schema",
                id: missing.schema_id,
            });
        }
        records
            .into_iter()
            .map(|record| tables.push_record(record))
            .collect()
    }

    async fn record(&self, id: RecordId) -> StoreResult<Option<MockRecord>> {
        Ok(self.tables.read().records.get(&id).cloned())
    }

    async fn records_by_schema(&self, schema_id: SchemaId) -> StoreResult<Vec<MockRecord>> {
        Ok(self
            .tables
            .read()
            .records
            .values()
            .filter(|r| r.schema_id == schema_id)
            .cloned()
            .collect())
    }

    async fn replace_record_data(
        &self,
        id: RecordId,
        data: Value,
    ) -> StoreResult<Option<MockRecord>> {
        let mut tables = self.tables.write();
        Ok(tables.records.get_mut(&id).map(|r| {
            r.data = data;
            r.clone()
        }))
    }

    async fn delete_record(&self, id: RecordId) -> StoreResult<bool> {
        Ok(self.tables.write().records.remove(&id).is_some())
    }

    async fn delete_records_expiring_before(&self, cutoff: DateTime<Utc>) -> StoreResult<usize> {
        let mut tables = self.tables.write();
        let before = tables.records.len();
        tables.records.retain(|_, r| r.expires_at >= cutoff);
        Ok(before - tables.records.len())
    }
}
