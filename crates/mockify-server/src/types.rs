//! Identifiers and response payloads shared across the server

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Local user account identifier (the `sub` claim of every session token)
pub type UserId = i64;
pub type OrganizationId = i64;
pub type ProjectId = i64;
pub type SchemaId = i64;
pub type RecordId = i64;

/// Public view of a user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Organization summary returned by list/create/update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationResponse {
    pub id: OrganizationId,
    pub name: String,
    pub owner_id: UserId,
    pub owner_name: String,
    pub created_at: DateTime<Utc>,
    pub project_count: usize,
}

/// Organization with its owner and project summaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationDetailResponse {
    pub id: OrganizationId,
    pub name: String,
    pub owner: UserResponse,
    pub created_at: DateTime<Utc>,
    pub projects: Vec<ProjectSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub name: String,
    pub schema_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: ProjectId,
    pub name: String,
    pub organization_id: OrganizationId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaResponse {
    pub id: SchemaId,
    pub name: String,
    pub project_id: ProjectId,
    pub schema_json: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Mock record as served to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponse {
    pub id: RecordId,
    pub schema_id: SchemaId,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizationRequest {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrganizationRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSchemaRequest {
    pub name: String,
    #[serde(default)]
    pub schema_json: serde_json::Value,
}

/// Record creation body; `schemaId` may be omitted when the route names it
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordRequest {
    #[serde(default)]
    pub schema_id: Option<SchemaId>,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecordRequest {
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Refresh body; the token may instead arrive in the refresh cookie
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for RefreshRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshRequest")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_organization_response_uses_camel_case() {
        let response = OrganizationResponse {
            id: 1,
            name: "Acme".to_string(),
            owner_id: 7,
            owner_name: "Alice".to_string(),
            created_at: Utc::now(),
            project_count: 2,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["ownerId"], 7);
        assert_eq!(json["ownerName"], "Alice");
        assert_eq!(json["projectCount"], 2);
    }

    #[test]
    fn test_update_organization_request_name_optional() {
        let request: UpdateOrganizationRequest = serde_json::from_str("{}").unwrap();
        assert!(request.name.is_none());
    }

    #[test]
    fn test_create_record_request_deserialize() {
        let request: CreateRecordRequest =
            serde_json::from_str(r#"{"schemaId": 3, "data": {"name": "widget"}}"#).unwrap();
        assert_eq!(request.schema_id, Some(3));
        assert_eq!(request.data["name"], "widget");

        let request: CreateRecordRequest = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert_eq!(request.schema_id, None);
    }

    #[test]
    fn test_create_schema_request_defaults_schema_json() {
        let request: CreateSchemaRequest = serde_json::from_str(r#"{"name": "Users"}"#).unwrap();
        assert_eq!(request.name, "Users");
        assert!(request.schema_json.is_null());
    }

    #[test]
    fn test_login_request_debug_hides_password() {
        let request: LoginRequest =
            serde_json::from_str(r#"{"email": "a@example.com", "password": "hunter2"}"#).unwrap();
        let debug_str = format!("{request:?}");
        assert!(debug_str.contains("a@example.com"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_refresh_request_token_optional() {
        let request: RefreshRequest = serde_json::from_str("{}").unwrap();
        assert!(request.refresh_token.is_none());

        let request: RefreshRequest =
            serde_json::from_str(r#"{"refreshToken": "abc"}"#).unwrap();
        assert_eq!(request.refresh_token.as_deref(), Some("abc"));
        assert!(!format!("{request:?}").contains("abc"));
    }
}
