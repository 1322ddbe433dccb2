//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes.
//! Core failures are logged with their cause and reported generically.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use reslookup_core::models::ValidationError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Body is not a decodable lookup request (422)
    Unprocessable { message: String },

    /// Request decoded but is missing what a lookup needs (400)
    Validation(ValidationError),

    /// Invocation failed (500, logged)
    Internal(reslookup_core::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Unprocessable { message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": "unprocessable_entity",
                    "message": message
                }),
            ),
            Self::Validation(e) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "validation_error",
                    "message": e.to_string()
                }),
            ),
            Self::Internal(e) => {
                // Log the actual error, return generic message
                tracing::error!(error = %e, "Invocation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<reslookup_core::Error> for ApiError {
    fn from(e: reslookup_core::Error) -> Self {
        Self::Internal(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reslookup_core::store::StoreError;

    #[tokio::test]
    async fn validation_error_is_400() {
        let err = ApiError::Validation(ValidationError::Empty {
            field: "reservation id",
        });
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unprocessable_is_422() {
        let err = ApiError::Unprocessable {
            message: "bad json".into(),
        };
        assert_eq!(
            err.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn core_error_is_500() {
        let err = ApiError::from(reslookup_core::Error::Lookup(StoreError::TableMissing {
            table: "reservations".into(),
        }));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
