//! Upload validation module
//!
//! Provides validation utilities for multipart image uploads.

use crate::error::ApiError;

/// Allowed MIME type categories for query image uploads
const ALLOWED_MIME_PREFIXES: &[&str] = &["image/", "application/octet-stream"];

/// Validates the Content-Type of an uploaded query image
///
/// Accepts image/* (image/jpeg, image/png, image/webp, etc.) and
/// application/octet-stream. A missing Content-Type is treated as binary.
pub fn validate_content_type(content_type: Option<&str>) -> Result<(), ApiError> {
    match content_type {
        Some(ct) => {
            let ct_lower = ct.to_lowercase();
            if ALLOWED_MIME_PREFIXES
                .iter()
                .any(|prefix| ct_lower.starts_with(prefix))
            {
                Ok(())
            } else {
                Err(ApiError::bad_request(format!(
                    "Unsupported Content-Type: '{}'. Allowed types: image/*, application/octet-stream",
                    ct
                )))
            }
        }
        None => Ok(()),
    }
}

/// Validates the size of an uploaded file
///
/// Returns an error if the file exceeds the maximum size.
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ApiError> {
    if size > max_size {
        let max_mb = max_size / (1024 * 1024);
        Err(ApiError::bad_request(format!(
            "File too large: {} bytes exceeds maximum of {} MB",
            size, max_mb
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_content_types_accepted() {
        assert!(validate_content_type(Some("image/jpeg")).is_ok());
        assert!(validate_content_type(Some("image/PNG")).is_ok());
        assert!(validate_content_type(Some("application/octet-stream")).is_ok());
        assert!(validate_content_type(None).is_ok());
    }

    #[test]
    fn test_non_image_content_types_rejected() {
        assert!(validate_content_type(Some("video/mp4")).is_err());
        assert!(validate_content_type(Some("text/html")).is_err());
    }

    #[test]
    fn test_file_size_limit() {
        assert!(validate_file_size(100, 1024).is_ok());
        assert!(validate_file_size(2048, 1024).is_err());
    }
}
