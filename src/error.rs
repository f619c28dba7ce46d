//! Error types for the URL cache
//!
//! Provides unified error handling using thiserror.
//!
//! Inside the cache most failures never reach the caller: a missing entry is
//! an `Option::None`, and disk failures are logged and downgraded to a miss or
//! a dropped write. `CacheError` surfaces at the edges: configuration
//! validation, the `DiskStore` trait, and the HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the URL cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// URL or key absent from the relevant store
    #[error("Not cached: {0}")]
    NotFound(String),

    /// Disk read, write, rename, or removal failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration value rejected when it was set
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::InvalidConfiguration(_) => {
                StatusCode::BAD_REQUEST
            }
            CacheError::Io(_) | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the URL cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let response = CacheError::NotFound("http://a/b".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_configuration_maps_to_400() {
        let response =
            CacheError::InvalidConfiguration("bad budget".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_io_error_converts() {
        let err: CacheError = std::io::Error::other("disk gone").into();
        assert!(matches!(err, CacheError::Io(_)));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
