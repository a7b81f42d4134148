//! Pure functions for mapping store errors to HTTP status codes.
//!
//! The routing layer is not part of this workspace, but list and delete
//! endpoints need one agreed mapping from [`StoreError`] kinds to responses.

use super::StoreError;

/// Maps a [`StoreError`] to an HTTP status code.
///
/// - `NotFound` -> 404 (Not Found)
/// - `IntegrityViolation` -> 500 (Internal Server Error)
/// - `StoreUnavailable` -> 503 (Service Unavailable)
/// - `InvalidCursor`, `InvalidPageSize`, `InvalidKey`, `Validation` -> 400 (Bad Request)
/// - `InvalidData` -> 500 (Internal Server Error)
/// - `Cancelled` -> 499 (Client Closed Request)
///
/// # Examples
///
/// ```
/// use submit_core::storage::{store_error_to_status_code, StoreError};
///
/// let error = StoreError::InvalidCursor("not base64".to_string());
/// assert_eq!(store_error_to_status_code(&error), 400);
/// ```
pub fn store_error_to_status_code(error: &StoreError) -> u16 {
    match error {
        StoreError::NotFound { .. } => 404,
        StoreError::IntegrityViolation { .. } => 500,
        StoreError::StoreUnavailable(_) => 503,
        StoreError::InvalidCursor(_) => 400,
        StoreError::InvalidPageSize(_) => 400,
        StoreError::InvalidKey(_) => 400,
        StoreError::Validation(_) => 400,
        StoreError::InvalidData(_) => 500,
        StoreError::Cancelled => 499,
    }
}
