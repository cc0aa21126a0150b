use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use models::validation::Violations;
use serde::Serialize;
use service::errors::{ErrorKind, ServiceError};
use thiserror::Error;
use tracing::error;

/// JSON error body returned by the REST adapter.
#[derive(Debug, Serialize)]
pub struct JsonApiError {
    #[serde(skip)]
    pub status: StatusCode,
    #[serde(rename = "status")]
    pub code: u16,
    pub error: &'static str,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Violations>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, error: &'static str, message: Option<String>) -> Self {
        Self { status, code: status.as_u16(), error, message, violations: None }
    }

    pub fn with_violations(mut self, violations: Violations) -> Self {
        self.violations = Some(violations);
        self
    }

    /// Request that could not be decoded.
    pub fn bad_request(message: String) -> Self {
        JsonApiError::new(StatusCode::BAD_REQUEST, "Bad Request", Some(message))
    }
}

impl From<JsonRejection> for JsonApiError {
    fn from(r: JsonRejection) -> Self {
        JsonApiError::bad_request(r.body_text())
    }
}

impl From<PathRejection> for JsonApiError {
    fn from(r: PathRejection) -> Self {
        JsonApiError::bad_request(r.body_text())
    }
}

impl From<QueryRejection> for JsonApiError {
    fn from(r: QueryRejection) -> Self {
        JsonApiError::bad_request(r.body_text())
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        match e.kind() {
            ErrorKind::NotFound => {
                JsonApiError::new(StatusCode::NOT_FOUND, "Not Found", Some(e.public_message()))
            }
            ErrorKind::ValidationFailed => {
                let violations = e.violations().cloned().unwrap_or_default();
                let message = Some(violations.to_string());
                JsonApiError::new(StatusCode::BAD_REQUEST, "Validation Error", message)
                    .with_violations(violations)
            }
            ErrorKind::Internal => {
                error!(error = %e, "request failed");
                let message = Some(e.public_message());
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                JsonApiError::new(status, "Internal Server Error", message)
            }
        }
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: std::io::Error },
    #[error("http server failed: {0}")]
    Http(std::io::Error),
    #[error("grpc server failed: {0}")]
    Grpc(#[from] tonic::transport::Error),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
