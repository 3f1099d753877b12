//! Authentication failure responses

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::constants::{UNAUTHORIZED_ERROR, UNAUTHORIZED_MESSAGE};

/// Body returned for every authentication failure
///
/// Carries a fixed message only; the rejection cause stays in the logs.
#[derive(Debug, Clone, Serialize)]
pub struct AuthFailureBody {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub error: &'static str,
    pub message: &'static str,
    pub path: String,
}

impl AuthFailureBody {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            status: StatusCode::UNAUTHORIZED.as_u16(),
            error: UNAUTHORIZED_ERROR,
            message: UNAUTHORIZED_MESSAGE,
            path: path.into(),
        }
    }
}

impl IntoResponse for AuthFailureBody {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(self)).into_response()
    }
}

/// 401 response for a request to `path`
#[must_use]
pub fn unauthorized(path: &str) -> Response {
    AuthFailureBody::new(path).into_response()
}
