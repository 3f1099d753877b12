//! Authorized mock record service
//!
//! Serves every record of an owned schema regardless of expiry; expired
//! records disappear only through [`RecordService::purge_expired_records`].

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use super::{find_schema, schema_organization};
use crate::auth::check_access;
use crate::constants::RECORD_TTL_DAYS;
use crate::error::{Error, Result};
use crate::store::{DirectoryStore, MockRecord, MockSchema, NewRecord};
use crate::types::{RecordId, RecordResponse, SchemaId, UpdateRecordRequest, UserId};

const RESOURCE: &str = "Record";

pub(super) fn record_response(record: MockRecord) -> RecordResponse {
    RecordResponse {
        id: record.id,
        schema_id: record.schema_id,
        data: record.data,
        created_at: record.created_at,
        expires_at: record.expires_at,
    }
}

fn expiry_from(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(RECORD_TTL_DAYS)
}

fn require_object(data: &Value) -> Result<()> {
    if data.is_object() {
        Ok(())
    } else {
        Err(Error::bad_request("Record data must be a JSON object"))
    }
}

#[derive(Clone)]
pub struct RecordService {
    store: Arc<dyn DirectoryStore>,
}

impl std::fmt::Debug for RecordService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordService").finish_non_exhaustive()
    }
}

impl RecordService {
    #[must_use]
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self { store }
    }

    /// Load a schema the caller owns
    async fn owned_schema(&self, user_id: UserId, schema_id: SchemaId) -> Result<MockSchema> {
        let schema = find_schema(self.store.as_ref(), schema_id).await?;
        let org = schema_organization(self.store.as_ref(), &schema).await?;
        check_access(user_id, org.owner_id, RESOURCE)?;
        Ok(schema)
    }

    /// Load a record the caller owns
    async fn owned_record(&self, user_id: UserId, record_id: RecordId) -> Result<MockRecord> {
        let record = self
            .store
            .record(record_id)
            .await?
            .ok_or_else(|| Error::not_found("Record not found"))?;
        self.owned_schema(user_id, record.schema_id).await?;
        Ok(record)
    }

    /// Create a record expiring seven days from now
    pub async fn create(
        &self,
        user_id: UserId,
        schema_id: SchemaId,
        data: Value,
    ) -> Result<RecordResponse> {
        require_object(&data)?;
        let schema = self.owned_schema(user_id, schema_id).await?;
        self.insert(schema.id, data).await
    }

    async fn insert(&self, schema_id: SchemaId, data: Value) -> Result<RecordResponse> {
        let now = Utc::now();
        let record = self
            .store
            .insert_record(schema_id, data, now, expiry_from(now))
            .await?;
        tracing::info!(record_id = record.id, schema_id, "Record created");
        Ok(record_response(record))
    }

    /// Create several records; nothing is written unless every entry passes
    /// validation and the ownership check
    ///
    /// The batch goes to the store in one call, so a schema deleted after the
    /// checks fails the whole batch instead of leaving part of it behind.
    pub async fn create_bulk(
        &self,
        user_id: UserId,
        entries: Vec<(SchemaId, Value)>,
    ) -> Result<Vec<RecordResponse>> {
        if entries.is_empty() {
            return Err(Error::bad_request("Records list cannot be empty"));
        }
        tracing::info!(user_id, count = entries.len(), "Bulk record create");

        for (schema_id, data) in &entries {
            require_object(data)?;
            self.owned_schema(user_id, *schema_id).await?;
        }

        let now = Utc::now();
        let batch = entries
            .into_iter()
            .map(|(schema_id, data)| NewRecord {
                schema_id,
                data,
                created_at: now,
                expires_at: expiry_from(now),
            })
            .collect();
        let created = self.store.insert_records(batch).await?;
        tracing::info!(user_id, count = created.len(), "Bulk records created");
        Ok(created.into_iter().map(record_response).collect())
    }

    pub async fn get(&self, user_id: UserId, record_id: RecordId) -> Result<RecordResponse> {
        self.owned_record(user_id, record_id)
            .await
            .map(record_response)
    }

    pub async fn list_by_schema(
        &self,
        user_id: UserId,
        schema_id: SchemaId,
    ) -> Result<Vec<RecordResponse>> {
        let schema = self.owned_schema(user_id, schema_id).await?;
        let records = self.store.records_by_schema(schema.id).await?;
        Ok(records.into_iter().map(record_response).collect())
    }

    /// Replace the record's data; an absent `data` leaves it unchanged
    pub async fn update(
        &self,
        user_id: UserId,
        record_id: RecordId,
        request: UpdateRecordRequest,
    ) -> Result<RecordResponse> {
        let record = self.owned_record(user_id, record_id).await?;
        let Some(data) = request.data else {
            return Ok(record_response(record));
        };
        require_object(&data)?;

        self.store
            .replace_record_data(record_id, data)
            .await?
            .map(record_response)
            .ok_or_else(|| Error::not_found("Record not found"))
    }

    pub async fn delete(&self, user_id: UserId, record_id: RecordId) -> Result<()> {
        self.owned_record(user_id, record_id).await?;
        tracing::warn!(record_id, user_id, "Deleting record");
        self.store.delete_record(record_id).await?;
        Ok(())
    }

    /// Remove every record whose expiry has passed
    pub async fn purge_expired_records(&self) -> Result<usize> {
        let purged = self
            .store
            .delete_records_expiring_before(Utc::now())
            .await?;
        tracing::info!(count = purged, "Expired records deleted");
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::directory::fixtures::{schema_for, shared, user};
    use crate::store::{InMemoryStore, Organization, Project, StoreError, StoreResult};
    use crate::types::{OrganizationId, ProjectId};

    /// Deletes `organization` right before a batch insert lands
    struct VanishingStore {
        inner: InMemoryStore,
        organization: OrganizationId,
    }

    #[async_trait]
    impl DirectoryStore for VanishingStore {
        async fn insert_organization(&self, owner_id: UserId, name: &str) -> StoreResult<Organization> {
            self.inner.insert_organization(owner_id, name).await
        }

        async fn organization(&self, id: OrganizationId) -> StoreResult<Option<Organization>> {
            self.inner.organization(id).await
        }

        async fn organizations_by_owner(&self, owner_id: UserId) -> StoreResult<Vec<Organization>> {
            self.inner.organizations_by_owner(owner_id).await
        }

        async fn rename_organization(
            &self,
            id: OrganizationId,
            name: &str,
        ) -> StoreResult<Option<Organization>> {
            self.inner.rename_organization(id, name).await
        }

        async fn delete_organization(&self, id: OrganizationId) -> StoreResult<bool> {
            self.inner.delete_organization(id).await
        }

        async fn insert_project(
            &self,
            organization_id: OrganizationId,
            name: &str,
        ) -> StoreResult<Project> {
            self.inner.insert_project(organization_id, name).await
        }

        async fn project(&self, id: ProjectId) -> StoreResult<Option<Project>> {
            self.inner.project(id).await
        }

        async fn projects_by_organization(
            &self,
            organization_id: OrganizationId,
        ) -> StoreResult<Vec<Project>> {
            self.inner.projects_by_organization(organization_id).await
        }

        async fn insert_schema(
            &self,
            project_id: ProjectId,
            name: &str,
            schema_json: Value,
        ) -> StoreResult<MockSchema> {
            self.inner.insert_schema(project_id, name, schema_json).await
        }

        async fn schema(&self, id: SchemaId) -> StoreResult<Option<MockSchema>> {
            self.inner.schema(id).await
        }

        async fn schemas_by_project(&self, project_id: ProjectId) -> StoreResult<Vec<MockSchema>> {
            self.inner.schemas_by_project(project_id).await
        }

        async fn insert_record(
            &self,
            schema_id: SchemaId,
            data: Value,
            created_at: DateTime<Utc>,
            expires_at: DateTime<Utc>,
        ) -> StoreResult<MockRecord> {
            self.inner
                .insert_record(schema_id, data, created_at, expires_at)
                .await
        }

        async fn insert_records(&self, records: Vec<NewRecord>) -> StoreResult<Vec<MockRecord>> {
            self.inner.delete_organization(self.organization).await?;
            self.inner.insert_records(records).await
        }

        async fn record(&self, id: RecordId) -> StoreResult<Option<MockRecord>> {
            self.inner.record(id).await
        }

        async fn records_by_schema(&self, schema_id: SchemaId) -> StoreResult<Vec<MockRecord>> {
            self.inner.records_by_schema(schema_id).await
        }

        async fn replace_record_data(
            &self,
            id: RecordId,
            data: Value,
        ) -> StoreResult<Option<MockRecord>> {
            self.inner.replace_record_data(id, data).await
        }

        async fn delete_record(&self, id: RecordId) -> StoreResult<bool> {
            self.inner.delete_record(id).await
        }

        async fn delete_records_expiring_before(&self, cutoff: DateTime<Utc>) -> StoreResult<usize> {
            self.inner.delete_records_expiring_before(cutoff).await
        }
    }

    #[tokio::test]
    async fn test_create_sets_seven_day_expiry() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice@example.com", "Alice").await;
        let (_, schema_id) = schema_for(&store, &alice).await;
        let service = RecordService::new(shared(&store));

        let record = service
            .create(alice.id, schema_id, json!({"sku": "A-1"}))
            .await
            .unwrap();
        assert_eq!(record.schema_id, schema_id);
        assert_eq!(record.expires_at - record.created_at, Duration::days(7));
    }

    #[tokio::test]
    async fn test_create_requires_object_data() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice@example.com", "Alice").await;
        let (_, schema_id) = schema_for(&store, &alice).await;
        let service = RecordService::new(shared(&store));

        for data in [json!([1, 2]), json!("text"), Value::Null] {
            let err = service.create(alice.id, schema_id, data).await.unwrap_err();
            assert!(err.is_bad_request());
        }
    }

    #[tokio::test]
    async fn test_stranger_is_forbidden_everywhere() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice@example.com", "Alice").await;
        let bob = user(&store, "bob@example.com", "Bob").await;
        let (_, schema_id) = schema_for(&store, &alice).await;
        let service = RecordService::new(shared(&store));
        let record = service
            .create(alice.id, schema_id, json!({"a": 1}))
            .await
            .unwrap();

        let err = service.get(bob.id, record.id).await.unwrap_err();
        assert!(err.is_forbidden());
        assert_eq!(
            err.to_string(),
            "You do not have permission to access this Record"
        );
        assert!(service.list_by_schema(bob.id, schema_id).await.unwrap_err().is_forbidden());
        assert!(service.create(bob.id, schema_id, json!({})).await.unwrap_err().is_forbidden());
        assert!(
            service
                .update(bob.id, record.id, UpdateRecordRequest { data: Some(json!({})) })
                .await
                .unwrap_err()
                .is_forbidden()
        );
        assert!(service.delete(bob.id, record.id).await.unwrap_err().is_forbidden());
    }

    #[tokio::test]
    async fn test_missing_record_and_schema() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice@example.com", "Alice").await;
        let service = RecordService::new(shared(&store));

        assert!(service.get(alice.id, 5).await.unwrap_err().is_not_found());
        assert!(service.list_by_schema(alice.id, 5).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_includes_expired_records() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice@example.com", "Alice").await;
        let (_, schema_id) = schema_for(&store, &alice).await;
        let now = Utc::now();
        store
            .insert_record(schema_id, json!({}), now - Duration::days(8), now - Duration::days(1))
            .await
            .unwrap();
        let service = RecordService::new(shared(&store));
        service.create(alice.id, schema_id, json!({})).await.unwrap();

        let records = service.list_by_schema(alice.id, schema_id).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice@example.com", "Alice").await;
        let (_, schema_id) = schema_for(&store, &alice).await;
        let service = RecordService::new(shared(&store));
        let record = service
            .create(alice.id, schema_id, json!({"v": 1}))
            .await
            .unwrap();

        let updated = service
            .update(alice.id, record.id, UpdateRecordRequest { data: Some(json!({"v": 2})) })
            .await
            .unwrap();
        assert_eq!(updated.data["v"], 2);

        let unchanged = service
            .update(alice.id, record.id, UpdateRecordRequest { data: None })
            .await
            .unwrap();
        assert_eq!(unchanged.data["v"], 2);

        service.delete(alice.id, record.id).await.unwrap();
        assert!(service.get(alice.id, record.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_bulk_create_is_all_or_nothing() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice@example.com", "Alice").await;
        let (_, schema_id) = schema_for(&store, &alice).await;
        let service = RecordService::new(shared(&store));

        let err = service
            .create_bulk(alice.id, vec![(schema_id, json!({})), (schema_id, json!(3))])
            .await
            .unwrap_err();
        assert!(err.is_bad_request());
        assert!(store.records_by_schema(schema_id).await.unwrap().is_empty());

        let created = service
            .create_bulk(alice.id, vec![(schema_id, json!({"n": 1})), (schema_id, json!({"n": 2}))])
            .await
            .unwrap();
        assert_eq!(created.len(), 2);

        let err = service.create_bulk(alice.id, Vec::new()).await.unwrap_err();
        assert!(err.is_bad_request());
    }

    #[tokio::test]
    async fn test_bulk_create_writes_nothing_when_schema_vanishes() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice@example.com", "Alice").await;
        let (project_id, schema_id) = schema_for(&store, &alice).await;
        let organization = store.project(project_id).await.unwrap().unwrap().organization_id;
        let service = RecordService::new(Arc::new(VanishingStore {
            inner: store.clone(),
            organization,
        }));

        let err = service
            .create_bulk(alice.id, vec![(schema_id, json!({"n": 1})), (schema_id, json!({"n": 2}))])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Store(StoreError::MissingParent { entity: "schema", .. })));
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
        assert!(store.records_by_schema(schema_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_purge_expired_records() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice@example.com", "Alice").await;
        let (_, schema_id) = schema_for(&store, &alice).await;
        let now = Utc::now();
        store
            .insert_record(schema_id, json!({}), now - Duration::days(8), now - Duration::days(1))
            .await
            .unwrap();
        let service = RecordService::new(shared(&store));
        let live = service.create(alice.id, schema_id, json!({})).await.unwrap();

        assert_eq!(service.purge_expired_records().await.unwrap(), 1);
        let remaining = service.list_by_schema(alice.id, schema_id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, live.id);
    }
}
