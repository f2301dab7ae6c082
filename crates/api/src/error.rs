//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use policy::PolicyError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
///
/// A denied decision is not an error; it is answered with 403 by the
/// authorize handler.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request from the client.
    #[error("{0}")]
    BadRequest(String),

    /// Policy engine error.
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_)
            | ApiError::Policy(PolicyError::InvalidResource(_))
            | ApiError::Policy(PolicyError::InvalidPrincipal(_)) => StatusCode::BAD_REQUEST,
            // Unconfigured pairs and broken registries are server faults.
            ApiError::Policy(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!(error = %message, "internal server error");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_resource_is_bad_request() {
        let err = ApiError::from(PolicyError::InvalidResource("resource type is empty".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn empty_principal_is_bad_request() {
        let err = ApiError::from(PolicyError::InvalidPrincipal("principal id is empty".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_configured_is_server_error() {
        let err = ApiError::from(PolicyError::PolicyNotConfigured {
            resource_type: "Order".into(),
            action: "teleport".into(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
