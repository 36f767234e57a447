//! Mapping of Codesage errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::types::errors::GatewayError;
use crate::types::responses::ErrorResponse;
use crate::CodesageError;

/// Error returned by every API handler.
#[derive(Debug)]
pub struct ApiError(pub CodesageError);

impl<E: Into<CodesageError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    /// Status code and body for this error.
    pub fn to_parts(&self) -> (StatusCode, ErrorResponse) {
        match &self.0 {
            CodesageError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("validation", msg.clone()),
            ),
            CodesageError::Gateway(err @ GatewayError::UnknownModel(_)) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("validation", err.to_string()),
            ),
            CodesageError::Gateway(err @ GatewayError::MissingCredential) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("configuration", err.to_string()),
            ),
            CodesageError::Gateway(err) => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse::new("upstream", err.to_string()).with_status(err.upstream_status()),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("internal", "internal server error"),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.to_parts();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.0, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self.0, "Request rejected");
        }

        (status, Json(body)).into_response()
    }
}
