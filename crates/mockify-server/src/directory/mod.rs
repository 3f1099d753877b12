//! Organization, project, schema and record services
//!
//! Every authorized operation resolves the ownership chain of its target
//! (record → schema → project → organization → user) and hands the owning user
//! to [`check_access`](crate::auth::check_access). The gate itself never reads
//! the store.

mod organizations;
mod projects;
mod public;
mod records;

pub use organizations::OrganizationService;
pub use projects::ProjectService;
pub use public::PublicRecordService;
pub use records::RecordService;

use crate::error::{Error, Result};
use crate::store::{DirectoryStore, MockSchema, Organization, Project};
use crate::types::{OrganizationId, ProjectId, SchemaId};

async fn find_organization(store: &dyn DirectoryStore, id: OrganizationId) -> Result<Organization> {
    store
        .organization(id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Organization not found with id: {id}")))
}

async fn find_project(store: &dyn DirectoryStore, id: ProjectId) -> Result<Project> {
    store
        .project(id)
        .await?
        .ok_or_else(|| Error::not_found("Project not found"))
}

async fn find_schema(store: &dyn DirectoryStore, id: SchemaId) -> Result<MockSchema> {
    store
        .schema(id)
        .await?
        .ok_or_else(|| Error::not_found("Schema not found"))
}

/// Organization at the top of a schema's ownership chain
async fn schema_organization(store: &dyn DirectoryStore, schema: &MockSchema) -> Result<Organization> {
    let project = find_project(store, schema.project_id).await?;
    find_organization(store, project.organization_id).await
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use serde_json::json;

    use crate::store::{DirectoryStore, InMemoryStore, NewUser, UserAccount, UserStore};
    use crate::types::{ProjectId, SchemaId};

    pub(crate) async fn user(store: &InMemoryStore, email: &str, name: &str) -> UserAccount {
        store
            .save_user(NewUser {
                email: email.to_string(),
                name: name.to_string(),
                credential: "encoded".to_string(),
            })
            .await
            .unwrap()
    }

    /// Organization, project and schema owned by `owner`
    pub(crate) async fn schema_for(store: &InMemoryStore, owner: &UserAccount) -> (ProjectId, SchemaId) {
        let org = store.insert_organization(owner.id, "Acme").await.unwrap();
        let project = store.insert_project(org.id, "Shop").await.unwrap();
        let schema = store
            .insert_schema(project.id, "Products", json!({"type": "object"}))
            .await
            .unwrap();
        (project.id, schema.id)
    }

    pub(crate) fn shared(store: &InMemoryStore) -> Arc<InMemoryStore> {
        Arc::new(store.clone())
    }
}
