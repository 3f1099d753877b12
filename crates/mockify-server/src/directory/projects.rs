//! Project and schema creation under owned organizations

use std::sync::Arc;

use super::{find_organization, find_project};
use crate::auth::check_access;
use crate::error::{Error, Result};
use crate::store::DirectoryStore;
use crate::types::{
    CreateProjectRequest, CreateSchemaRequest, OrganizationId, ProjectId, ProjectResponse,
    SchemaResponse, UserId,
};

#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn DirectoryStore>,
}

impl std::fmt::Debug for ProjectService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectService").finish_non_exhaustive()
    }
}

fn required(name: &str, what: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::bad_request(format!("{what} name is required")));
    }
    Ok(name.to_string())
}

impl ProjectService {
    #[must_use]
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self { store }
    }

    pub async fn create_project(
        &self,
        user_id: UserId,
        org_id: OrganizationId,
        request: &CreateProjectRequest,
    ) -> Result<ProjectResponse> {
        let name = required(&request.name, "Project")?;
        let org = find_organization(self.store.as_ref(), org_id).await?;
        check_access(user_id, org.owner_id, "Organization")?;

        let project = self.store.insert_project(org.id, &name).await?;
        tracing::info!(project_id = project.id, organization_id = org.id, "Project created");
        Ok(ProjectResponse {
            id: project.id,
            name: project.name,
            organization_id: project.organization_id,
            created_at: project.created_at,
        })
    }

    pub async fn create_schema(
        &self,
        user_id: UserId,
        project_id: ProjectId,
        request: &CreateSchemaRequest,
    ) -> Result<SchemaResponse> {
        let name = required(&request.name, "Schema")?;
        let project = find_project(self.store.as_ref(), project_id).await?;
        let org = find_organization(self.store.as_ref(), project.organization_id).await?;
        check_access(user_id, org.owner_id, "Project")?;

        let schema = self
            .store
            .insert_schema(project.id, &name, request.schema_json.clone())
            .await?;
        tracing::info!(schema_id = schema.id, project_id = project.id, "Schema created");
        Ok(SchemaResponse {
            id: schema.id,
            name: schema.name,
            project_id: schema.project_id,
            schema_json: schema.schema_json,
            created_at: schema.created_at,
        })
    }
}
