//! Unauthenticated read access to allow-listed schemas

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;

use super::find_schema;
use super::records::record_response;
use crate::error::{Error, Result};
use crate::store::DirectoryStore;
use crate::types::{RecordId, RecordResponse, SchemaId};

/// Read-only record access for schemas on the public allow-list
///
/// Unlike [`RecordService`](super::RecordService) only records that have not
/// yet expired are visible.
#[derive(Clone)]
pub struct PublicRecordService {
    store: Arc<dyn DirectoryStore>,
    schema_ids: BTreeSet<SchemaId>,
}

impl std::fmt::Debug for PublicRecordService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicRecordService")
            .field("schema_ids", &self.schema_ids)
            .finish_non_exhaustive()
    }
}

impl PublicRecordService {
    #[must_use]
    pub fn new(store: Arc<dyn DirectoryStore>, schema_ids: BTreeSet<SchemaId>) -> Self {
        Self { store, schema_ids }
    }

    #[must_use]
    pub fn is_public(&self, schema_id: SchemaId) -> bool {
        self.schema_ids.contains(&schema_id)
    }

    async fn public_schema(&self, schema_id: SchemaId) -> Result<()> {
        if !self.is_public(schema_id) {
            return Err(Error::not_found("This schema is private"));
        }
        find_schema(self.store.as_ref(), schema_id).await?;
        Ok(())
    }

    pub async fn get(&self, schema_id: SchemaId, record_id: RecordId) -> Result<RecordResponse> {
        tracing::info!(schema_id, record_id, "Public record lookup");
        self.public_schema(schema_id).await?;

        let record = self
            .store
            .record(record_id)
            .await?
            .filter(|r| !r.is_expired_at(Utc::now()))
            .ok_or_else(|| Error::not_found("Record not found"))?;
        if record.schema_id != schema_id {
            return Err(Error::not_found("Record does not belong to this schema"));
        }

        Ok(record_response(record))
    }

    pub async fn list_by_schema(&self, schema_id: SchemaId) -> Result<Vec<RecordResponse>> {
        tracing::info!(schema_id, "Public record listing");
        self.public_schema(schema_id).await?;

        let now = Utc::now();
        let records = self.store.records_by_schema(schema_id).await?;
        Ok(records
            .into_iter()
            .filter(|r| !r.is_expired_at(now))
            .map(record_response)
            .collect())
    }
}
