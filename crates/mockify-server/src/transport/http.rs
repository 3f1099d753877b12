//! HTTP transport: axum router and handlers

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::{Extension, Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthError, AuthenticatedUser, SessionPayload, require_bearer};
use crate::config::HttpConfig;
use crate::constants::{REFRESH_TOKEN_COOKIE, STATUS_OK};
use crate::server::AppState;
use crate::types::{
    CreateOrganizationRequest, CreateProjectRequest, CreateRecordRequest, CreateSchemaRequest,
    HealthResponse, LoginRequest, OrganizationDetailResponse, OrganizationId,
    OrganizationResponse, ProjectId, ProjectResponse, RecordId, RecordResponse, RefreshRequest,
    SchemaId, SchemaResponse, UpdateOrganizationRequest, UpdateRecordRequest,
};
use crate::{Error, Result};

/// Build the application router
///
/// Everything under `/api/v1` except `auth` and `public` requires a bearer
/// access token.
pub fn router(state: AppState, cors_origin: Option<&str>) -> Router {
    let protected = Router::new()
        .route(
            "/organizations",
            post(create_organization).get(list_organizations),
        )
        .route(
            "/organizations/{id}",
            get(organization_detail)
                .put(update_organization)
                .delete(delete_organization),
        )
        .route("/organizations/{id}/projects", post(create_project))
        .route("/projects/{id}/schemas", post(create_schema))
        .route(
            "/schemas/{schema_id}/records",
            post(create_record).get(list_records),
        )
        .route("/schemas/{schema_id}/records/bulk", post(create_records_bulk))
        .route(
            "/records/{id}",
            get(get_record).put(update_record).delete(delete_record),
        )
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            require_bearer,
        ));

    let open = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/public/schemas/{schema_id}/records", get(list_public_records))
        .route(
            "/public/schemas/{schema_id}/records/{record_id}",
            get(get_public_record),
        );

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/v1", open.merge(protected))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(cors_origin))
}

/// Serve the router until `shutdown` resolves
pub async fn run_http(
    state: AppState,
    config: &HttpConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = SocketAddr::new(config.host, config.port);
    emit_security_warnings(config);

    let app = router(state, config.cors_origin.as_deref());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Transport(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("HTTP server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Transport(format!("HTTP server error: {e}")))?;

    tracing::info!("HTTP server shutdown complete");
    Ok(())
}

fn build_cors_layer(origin: Option<&str>) -> CorsLayer {
    match origin.and_then(|o| o.parse::<HeaderValue>().ok()) {
        Some(origin_value) => CorsLayer::new()
            .allow_origin(origin_value)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true),
        // No origin configured: same-origin only
        None => CorsLayer::new(),
    }
}

fn emit_security_warnings(config: &HttpConfig) {
    let host = config.host;
    let is_all_interfaces = host == IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        || host == IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED);

    if is_all_interfaces {
        tracing::warn!("HTTP server binding to all interfaces");
    } else if !host.is_loopback() {
        tracing::warn!("HTTP server binding to non-loopback address ({host})");
    }

    if config.cors_origin.is_none() {
        tracing::info!(
            "CORS origin not configured (MOCKIFY_CORS_ORIGIN); cross-origin requests are refused"
        );
    }
}

/// Refresh token carried by the `refresh_token` cookie
fn refresh_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == REFRESH_TOKEN_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

fn no_store(payload: SessionPayload) -> impl IntoResponse {
    ([(header::CACHE_CONTROL, "no-store")], Json(payload))
}

/// Route and body must agree on the schema when both name one
fn schema_of(path_schema: SchemaId, request: &CreateRecordRequest) -> Result<SchemaId> {
    match request.schema_id {
        Some(id) if id != path_schema => Err(Error::bad_request(
            "Schema id in request body does not match the route",
        )),
        _ => Ok(path_schema),
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: STATUS_OK,
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let session = state
        .sessions
        .login(&request.email, &request.password)
        .await?;
    Ok(no_store(session))
}

async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> Result<impl IntoResponse> {
    let token = body
        .and_then(|Json(request)| request.refresh_token)
        .filter(|t| !t.is_empty())
        .or_else(|| refresh_cookie(&headers))
        .ok_or(AuthError::NotAuthenticated)?;

    let session = state.sessions.refresh(&token).await?;
    Ok(no_store(session))
}

async fn create_organization(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateOrganizationRequest>,
) -> Result<(StatusCode, Json<OrganizationResponse>)> {
    let org = state.organizations.create(user.user_id, &request).await?;
    Ok((StatusCode::CREATED, Json(org)))
}

async fn list_organizations(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<OrganizationResponse>>> {
    Ok(Json(state.organizations.list_mine(user.user_id).await?))
}

async fn organization_detail(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<OrganizationId>,
) -> Result<Json<OrganizationDetailResponse>> {
    Ok(Json(state.organizations.detail(id, user.user_id).await?))
}

async fn update_organization(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<OrganizationId>,
    Json(request): Json<UpdateOrganizationRequest>,
) -> Result<Json<OrganizationResponse>> {
    Ok(Json(
        state.organizations.update(user.user_id, id, &request).await?,
    ))
}

async fn delete_organization(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<OrganizationId>,
) -> Result<StatusCode> {
    state.organizations.delete(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_project(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(org_id): Path<OrganizationId>,
    Json(request): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>)> {
    let project = state
        .projects
        .create_project(user.user_id, org_id, &request)
        .await?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn create_schema(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(project_id): Path<ProjectId>,
    Json(request): Json<CreateSchemaRequest>,
) -> Result<(StatusCode, Json<SchemaResponse>)> {
    let schema = state
        .projects
        .create_schema(user.user_id, project_id, &request)
        .await?;
    Ok((StatusCode::CREATED, Json(schema)))
}

async fn create_record(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(schema_id): Path<SchemaId>,
    Json(request): Json<CreateRecordRequest>,
) -> Result<(StatusCode, Json<RecordResponse>)> {
    let schema_id = schema_of(schema_id, &request)?;
    let record = state
        .records
        .create(user.user_id, schema_id, request.data)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn create_records_bulk(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(schema_id): Path<SchemaId>,
    Json(requests): Json<Vec<CreateRecordRequest>>,
) -> Result<(StatusCode, Json<Vec<RecordResponse>>)> {
    let entries = requests
        .into_iter()
        .map(|request| -> Result<_> { Ok((schema_of(schema_id, &request)?, request.data)) })
        .collect::<Result<Vec<_>>>()?;

    let records = state.records.create_bulk(user.user_id, entries).await?;
    Ok((StatusCode::CREATED, Json(records)))
}

async fn list_records(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(schema_id): Path<SchemaId>,
) -> Result<Json<Vec<RecordResponse>>> {
    Ok(Json(
        state.records.list_by_schema(user.user_id, schema_id).await?,
    ))
}

async fn get_record(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<RecordId>,
) -> Result<Json<RecordResponse>> {
    Ok(Json(state.records.get(user.user_id, id).await?))
}

async fn update_record(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<RecordId>,
    Json(request): Json<UpdateRecordRequest>,
) -> Result<Json<RecordResponse>> {
    Ok(Json(state.records.update(user.user_id, id, request).await?))
}

async fn delete_record(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<RecordId>,
) -> Result<StatusCode> {
    state.records.delete(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_public_records(
    State(state): State<AppState>,
    Path(schema_id): Path<SchemaId>,
) -> Result<Json<Vec<RecordResponse>>> {
    Ok(Json(state.public_records.list_by_schema(schema_id).await?))
}

async fn get_public_record(
    State(state): State<AppState>,
    Path((schema_id, record_id)): Path<(SchemaId, RecordId)>,
) -> Result<Json<RecordResponse>> {
    Ok(Json(state.public_records.get(schema_id, record_id).await?))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok",
            version: "0.1.0",
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("ok"));
        assert!(json.contains("0.1.0"));
    }

    #[test]
    fn test_refresh_cookie_lookup() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; refresh_token=abc.def.ghi; lang=en"),
        );
        assert_eq!(refresh_cookie(&headers).as_deref(), Some("abc.def.ghi"));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("refresh_token="));
        assert!(refresh_cookie(&headers).is_none());
        assert!(refresh_cookie(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_schema_of_checks_body_against_route() {
        let request = CreateRecordRequest {
            schema_id: Some(4),
            data: json!({}),
        };
        assert_eq!(schema_of(4, &request).unwrap(), 4);
        assert!(schema_of(5, &request).unwrap_err().is_bad_request());

        let request = CreateRecordRequest {
            schema_id: None,
            data: json!({}),
        };
        assert_eq!(schema_of(9, &request).unwrap(), 9);
    }

    #[test]
    fn test_build_cors_layer() {
        let _with_origin = build_cors_layer(Some("https://app.mockify.dev"));
        let _without_origin = build_cors_layer(None);
    }

    #[test]
    fn test_security_warnings_for_non_loopback() {
        let config = HttpConfig {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            ..HttpConfig::default()
        };
        emit_security_warnings(&config);
    }
}
