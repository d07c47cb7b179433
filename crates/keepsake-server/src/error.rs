use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use keepsake_store::StoreError;

/// Errors surfaced by the HTTP layer.
///
/// Every variant maps onto exactly one status code.  Conversion happens
/// once, in `into_response`; nothing is re-raised after the response is
/// produced.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) | StoreError::BlobMissing(_) | StoreError::BlobNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            StoreError::InvalidKey(_) | StoreError::DuplicateUsername(_) => {
                ApiError::BadRequest(err.to_string())
            }
            StoreError::Io(_) => ApiError::Storage(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            ApiError::Storage(detail) => {
                tracing::error!(detail = %detail, "Storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        assert!(matches!(
            ApiError::from(StoreError::NotFound(4)),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::BlobMissing(4)),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::InvalidKey("..".into())),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::Io(std::io::Error::other("disk"))),
            ApiError::Storage(_)
        ));
    }
}
