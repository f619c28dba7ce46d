//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.
//!
//! Every handler that touches the disk runs the cache call on Tokio's
//! blocking pool so filesystem latency never stalls the async workers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};

use crate::cache::UrlCache;
use crate::error::{CacheError, Result};
use crate::models::{
    validate_url, DataQuery, ExistsResponse, HealthResponse, InvalidateRequest, MessageResponse,
    MoveRequest, RemoveQuery, StatsResponse, StoreResponse, UrlQuery,
};

/// Response header carrying the cached entry's timestamp (RFC 3339).
pub const TIMESTAMP_HEADER: &str = "x-cache-timestamp";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared URL cache
    pub cache: Arc<UrlCache>,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: Arc<UrlCache>) -> Self {
        Self { cache }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &crate::config::Config) -> Result<Self> {
        let cache = UrlCache::new(config.cache.clone())?;
        Ok(Self::new(Arc::new(cache)))
    }

    /// Runs a cache call on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&UrlCache) -> T + Send + 'static,
        T: Send + 'static,
    {
        let cache = Arc::clone(&self.cache);
        tokio::task::spawn_blocking(move || f(&cache))
            .await
            .map_err(|err| CacheError::Internal(format!("cache task failed: {}", err)))
    }
}

fn require_url(url: &str) -> Result<()> {
    match validate_url(url) {
        Some(error_msg) => Err(CacheError::InvalidRequest(error_msg)),
        None => Ok(()),
    }
}

/// Handler for GET /data?url=&expires=
///
/// Returns the raw cached bytes with their timestamp header, or 404 if the
/// entry is missing or older than `expires` seconds.
pub async fn get_data_handler(
    State(state): State<AppState>,
    Query(query): Query<DataQuery>,
) -> Result<Response> {
    require_url(&query.url)?;
    let expires = query.expiration()?;

    let url = query.url.clone();
    let data = state
        .blocking(move |cache| cache.data_for_url(&url, expires))
        .await?
        .ok_or_else(|| CacheError::NotFound(query.url.clone()))?;

    let timestamp = HeaderValue::from_str(&data.timestamp_utc().to_rfc3339())
        .map_err(|err| CacheError::Internal(err.to_string()))?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (HeaderName::from_static(TIMESTAMP_HEADER), timestamp),
        ],
        data.bytes,
    )
        .into_response())
}

/// Handler for PUT /data?url=
///
/// Stores the request body on disk for the URL.
pub async fn put_data_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
    body: Bytes,
) -> Result<Json<StoreResponse>> {
    require_url(&query.url)?;

    let url = query.url.clone();
    let key = state
        .blocking(move |cache| {
            cache.store_data_for_url(&body, &url);
            cache.key_for_url(&url)
        })
        .await?;

    Ok(Json(StoreResponse::new(query.url, key)))
}

/// Handler for DELETE /data?url=&from_disk=
///
/// Drops the memory entry, and the disk entry when `from_disk` is set.
pub async fn delete_data_handler(
    State(state): State<AppState>,
    Query(query): Query<RemoveQuery>,
) -> Result<Json<MessageResponse>> {
    let url = query
        .url
        .ok_or_else(|| CacheError::InvalidRequest("url is required".to_string()))?;
    require_url(&url)?;

    let from_disk = query.from_disk;
    let target = url.clone();
    state
        .blocking(move |cache| cache.remove_url(&target, from_disk))
        .await?;

    Ok(Json(MessageResponse::new(format!(
        "Removed '{}' (from_disk={})",
        url, from_disk
    ))))
}

/// Handler for GET /exists?url=
pub async fn exists_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<ExistsResponse>> {
    require_url(&query.url)?;

    let url = query.url.clone();
    let cached = state
        .blocking(move |cache| cache.has_data_for_url(&url))
        .await?;

    Ok(Json(ExistsResponse::new(query.url, cached)))
}

/// Handler for POST /temporary
///
/// Stores the request body under a fresh temporary URL and returns it.
pub async fn temporary_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StoreResponse>> {
    let (url, key) = state
        .blocking(move |cache| {
            let url = cache.store_temporary_data(&body);
            let key = cache.key_for_url(&url);
            (url, key)
        })
        .await?;

    Ok(Json(StoreResponse::new(url, key)))
}

/// Handler for POST /move
///
/// Moves the disk entry from one URL to another. Memory is left untouched.
pub async fn move_handler(
    State(state): State<AppState>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<MessageResponse>> {
    require_url(&req.from)?;
    require_url(&req.to)?;

    let message = format!("Moved '{}' to '{}'", req.from, req.to);
    state
        .blocking(move |cache| cache.move_data(&req.from, &req.to))
        .await?;

    Ok(Json(MessageResponse::new(message)))
}

/// Handler for POST /invalidate
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<MessageResponse>> {
    require_url(&req.url)?;

    let message = format!("Invalidated '{}'", req.url);
    state
        .blocking(move |cache| cache.invalidate_url(&req.url))
        .await?;

    Ok(Json(MessageResponse::new(message)))
}

/// Handler for POST /invalidate-all
pub async fn invalidate_all_handler(
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>> {
    state.blocking(|cache| cache.invalidate_all()).await?;
    Ok(Json(MessageResponse::new("Invalidated all disk entries")))
}

/// Handler for DELETE /all?from_disk=
pub async fn remove_all_handler(
    State(state): State<AppState>,
    Query(query): Query<RemoveQuery>,
) -> Result<Json<MessageResponse>> {
    let from_disk = query.from_disk;
    state
        .blocking(move |cache| cache.remove_all(from_disk))
        .await?;

    Ok(Json(MessageResponse::new(format!(
        "Cache cleared (from_disk={})",
        from_disk
    ))))
}

/// Handler for GET /stats
///
/// Returns memory cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = &state.cache;
    Json(StatsResponse::new(
        &cache.stats(),
        cache.disk_cache_enabled(),
        cache.image_cache_enabled(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
