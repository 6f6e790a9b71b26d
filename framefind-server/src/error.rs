//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use framefind_core::FramefindError;
use thiserror::Error;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error - unexpected server-side failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable - required service is not configured or available
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// FrameFind core error - error from the fingerprint library
    #[error("FrameFind error: {0}")]
    Core(#[from] FramefindError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a service unavailable error
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Core(ref e) => match e {
                // Client-provided invalid input → 400
                FramefindError::Decode(_) | FramefindError::Parse { .. } => {
                    StatusCode::BAD_REQUEST
                }

                // Nothing loaded yet → 503
                FramefindError::IndexNotReady => StatusCode::SERVICE_UNAVAILABLE,

                // Server-side data or processing failures → 500
                FramefindError::StoreCorrupt(_)
                | FramefindError::IngestUnit { .. }
                | FramefindError::Io(_)
                | FramefindError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Get the error code for programmatic error handling
    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Core(ref e) => match e {
                FramefindError::Decode(_) => "UNDECODABLE_IMAGE",
                FramefindError::Parse { .. } => "UNPARSEABLE_NAME",
                FramefindError::IndexNotReady => "INDEX_NOT_READY",
                FramefindError::StoreCorrupt(_) => "STORE_CORRUPT",
                FramefindError::IngestUnit { .. } => "INGEST_FAILED",
                FramefindError::Io(_) => "IO_ERROR",
                FramefindError::Json(_) => "SERIALIZATION_ERROR",
            },
        }
    }

    /// Get sanitized error message for client response
    fn client_message(&self) -> String {
        match self {
            // For core errors, sanitize internal details
            Self::Core(ref e) => match e {
                FramefindError::Decode(_) => {
                    "Could not decode the uploaded image".to_string()
                }
                FramefindError::Parse { .. } => "Unrecognized media file name".to_string(),
                FramefindError::IndexNotReady => {
                    "Search index not loaded yet, try again shortly".to_string()
                }
                FramefindError::StoreCorrupt(_) => "Fingerprint store is corrupt".to_string(),
                FramefindError::IngestUnit { .. } => "Media ingestion failed".to_string(),
                FramefindError::Io(_) => "Storage I/O failure".to_string(),
                FramefindError::Json(_) => "Metadata serialization error".to_string(),
            },
            // For other errors, use the Display message
            _ => self.to_string(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal",
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::Core(_) => "core",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        // Log based on severity, always including internal details
        match status {
            StatusCode::BAD_REQUEST | StatusCode::SERVICE_UNAVAILABLE => {
                tracing::warn!(
                    status = %status,
                    category = category,
                    code = code,
                    error = %internal_message,
                    "Client-visible error"
                );
            }
            _ => {
                tracing::error!(
                    status = %status,
                    category = category,
                    code = code,
                    error = %internal_message,
                    client_message = %client_message,
                    "Server error (internal details logged)"
                );
            }
        }

        // All error responses include a `code` field for programmatic error handling
        let body = serde_json::json!({
            "error": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::bad_request("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(FramefindError::IndexNotReady).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(FramefindError::Decode("bad".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(FramefindError::StoreCorrupt("bad".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_client_message_hides_internals() {
        let err = ApiError::from(FramefindError::StoreCorrupt(
            "fingerprints.bin holds 3 records, metadata.json 4".into(),
        ));
        assert_eq!(err.client_message(), "Fingerprint store is corrupt");
    }
}
