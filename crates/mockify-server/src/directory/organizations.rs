//! Organization service

use std::sync::Arc;

use super::find_organization;
use crate::auth::check_access;
use crate::error::{Error, Result};
use crate::store::{DirectoryStore, Organization, StoreError, UserAccount, UserStore};
use crate::types::{
    CreateOrganizationRequest, OrganizationDetailResponse, OrganizationId, OrganizationResponse,
    ProjectSummary, UpdateOrganizationRequest, UserId, UserResponse,
};

const RESOURCE: &str = "Organization";

#[derive(Clone)]
pub struct OrganizationService {
    store: Arc<dyn DirectoryStore>,
    users: Arc<dyn UserStore>,
}

impl std::fmt::Debug for OrganizationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrganizationService").finish_non_exhaustive()
    }
}

fn user_response(user: &UserAccount) -> UserResponse {
    UserResponse {
        id: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        created_at: user.created_at,
    }
}

fn validated_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::bad_request("Organization name is required"));
    }
    Ok(name)
}

impl OrganizationService {
    #[must_use]
    pub fn new(store: Arc<dyn DirectoryStore>, users: Arc<dyn UserStore>) -> Self {
        Self { store, users }
    }

    async fn owner(&self, user_id: UserId) -> Result<UserAccount> {
        self.users
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("User not found with ID: {user_id}")))
    }

    async fn response(&self, org: Organization, owner_name: String) -> Result<OrganizationResponse> {
        let project_count = self.store.projects_by_organization(org.id).await?.len();
        Ok(OrganizationResponse {
            id: org.id,
            name: org.name,
            owner_id: org.owner_id,
            owner_name,
            created_at: org.created_at,
            project_count,
        })
    }

    pub async fn create(
        &self,
        user_id: UserId,
        request: &CreateOrganizationRequest,
    ) -> Result<OrganizationResponse> {
        let name = validated_name(&request.name)?;
        tracing::info!(user_id, name, "Creating organization");

        let owner = self.owner(user_id).await?;
        let org = self
            .store
            .insert_organization(owner.id, name)
            .await
            .map_err(|e| match e {
                StoreError::DuplicateOrganizationName(_) => Error::bad_request(format!(
                    "Organization with name '{name}' already exists for this user."
                )),
                other => other.into(),
            })?;
        tracing::info!(organization_id = org.id, "Organization created");
        self.response(org, owner.name).await
    }

    /// Organization with its owner and project summaries
    pub async fn detail(
        &self,
        org_id: OrganizationId,
        user_id: UserId,
    ) -> Result<OrganizationDetailResponse> {
        let org = find_organization(self.store.as_ref(), org_id).await?;
        check_access(user_id, org.owner_id, RESOURCE)?;

        let owner = self.owner(org.owner_id).await?;
        let mut projects = Vec::new();
        for project in self.store.projects_by_organization(org.id).await? {
            let schema_count = self.store.schemas_by_project(project.id).await?.len();
            projects.push(ProjectSummary {
                id: project.id,
                name: project.name,
                schema_count,
                created_at: project.created_at,
            });
        }

        Ok(OrganizationDetailResponse {
            id: org.id,
            name: org.name,
            owner: user_response(&owner),
            created_at: org.created_at,
            projects,
        })
    }

    pub async fn list_mine(&self, user_id: UserId) -> Result<Vec<OrganizationResponse>> {
        let owner = self.owner(user_id).await?;
        let mut responses = Vec::new();
        for org in self.store.organizations_by_owner(user_id).await? {
            responses.push(self.response(org, owner.name.clone()).await?);
        }
        Ok(responses)
    }

    /// Rename an owned organization; an absent name leaves it unchanged
    pub async fn update(
        &self,
        user_id: UserId,
        org_id: OrganizationId,
        request: &UpdateOrganizationRequest,
    ) -> Result<OrganizationResponse> {
        let org = find_organization(self.store.as_ref(), org_id).await?;
        check_access(user_id, org.owner_id, RESOURCE)?;
        let owner = self.owner(org.owner_id).await?;

        let Some(name) = request.name.as_deref() else {
            return self.response(org, owner.name).await;
        };
        let name = validated_name(name)?;

        let updated = self
            .store
            .rename_organization(org_id, name)
            .await
            .map_err(|e| match e {
                StoreError::DuplicateOrganizationName(_) => Error::bad_request(format!(
                    "Another organization with name '{name}' already exists for this user."
                )),
                other => other.into(),
            })?
            .ok_or_else(|| Error::not_found(format!("Organization not found with id: {org_id}")))?;
        tracing::info!(organization_id = org_id, "Organization updated");
        self.response(updated, owner.name).await
    }

    /// Delete an owned organization and everything under it
    pub async fn delete(&self, user_id: UserId, org_id: OrganizationId) -> Result<()> {
        let org = find_organization(self.store.as_ref(), org_id).await?;
        check_access(user_id, org.owner_id, RESOURCE)?;

        tracing::warn!(organization_id = org_id, user_id, "Deleting organization");
        self.store.delete_organization(org_id).await?;
        Ok(())
    }
}
