//! Request DTOs for the cache server API
//!
//! Defines query strings and JSON bodies accepted by the endpoints.

use std::time::Duration;

use serde::Deserialize;

use crate::config::age_from_secs;
use crate::error::Result;

/// Query string naming a URL (`?url=`)
#[derive(Debug, Clone, Deserialize)]
pub struct UrlQuery {
    /// The URL whose cache entry is addressed
    pub url: String,
}

/// Query string for `GET /data`
#[derive(Debug, Clone, Deserialize)]
pub struct DataQuery {
    /// The URL to read
    pub url: String,
    /// Maximum acceptable age in seconds; absent or 0 = never expires
    #[serde(default)]
    pub expires: Option<f64>,
}

impl DataQuery {
    /// Converts `expires` to a Duration, rejecting negative values.
    pub fn expiration(&self) -> Result<Option<Duration>> {
        self.expires.map(age_from_secs).transpose()
    }
}

/// Query string for removal endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct RemoveQuery {
    /// The URL to remove; absent on `DELETE /all`
    #[serde(default)]
    pub url: Option<String>,
    /// Also remove from disk
    #[serde(default)]
    pub from_disk: bool,
}

/// Request body for `POST /move`
#[derive(Debug, Clone, Deserialize)]
pub struct MoveRequest {
    /// URL the data is currently cached under
    pub from: String,
    /// URL to cache it under instead
    pub to: String,
}

/// Request body for `POST /invalidate`
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    pub url: String,
}

/// Rejects empty URLs.
pub fn validate_url(url: &str) -> Option<String> {
    if url.trim().is_empty() {
        return Some("URL cannot be empty".to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_query_deserialize() {
        let query: DataQuery =
            serde_json::from_str(r#"{"url": "http://a/b", "expires": 60}"#).unwrap();
        assert_eq!(query.url, "http://a/b");
        assert_eq!(query.expiration().unwrap(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_data_query_without_expiry() {
        let query: DataQuery = serde_json::from_str(r#"{"url": "http://a/b"}"#).unwrap();
        assert_eq!(query.expiration().unwrap(), None);
    }

    #[test]
    fn test_negative_expiry_rejected() {
        let query = DataQuery {
            url: "http://a/b".to_string(),
            expires: Some(-3.0),
        };
        assert!(query.expiration().is_err());
    }

    #[test]
    fn test_remove_query_defaults() {
        let query: RemoveQuery = serde_json::from_str(r#"{}"#).unwrap();
        assert!(query.url.is_none());
        assert!(!query.from_disk);
    }

    #[test]
    fn test_move_request_deserialize() {
        let req: MoveRequest =
            serde_json::from_str(r#"{"from": "temp:abc", "to": "http://real/x"}"#).unwrap();
        assert_eq!(req.from, "temp:abc");
        assert_eq!(req.to, "http://real/x");
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("").is_some());
        assert!(validate_url("   ").is_some());
        assert!(validate_url("http://a/b").is_none());
    }
}
