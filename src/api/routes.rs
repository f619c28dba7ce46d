//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_data_handler, exists_handler, get_data_handler, health_handler,
    invalidate_all_handler, invalidate_handler, move_handler, put_data_handler,
    remove_all_handler, stats_handler, temporary_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /data?url=&expires=` - Read cached bytes
/// - `PUT /data?url=` - Store bytes for a URL
/// - `DELETE /data?url=&from_disk=` - Remove a URL
/// - `GET /exists?url=` - Check whether a URL is cached
/// - `POST /temporary` - Store bytes under a fresh temporary URL
/// - `POST /move` - Move disk data between URLs
/// - `POST /invalidate` - Mark a URL's disk entry stale
/// - `POST /invalidate-all` - Mark every disk entry stale
/// - `DELETE /all?from_disk=` - Clear the cache
/// - `GET /stats` - Memory cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/data",
            get(get_data_handler)
                .put(put_data_handler)
                .delete(delete_data_handler),
        )
        .route("/exists", get(exists_handler))
        .route("/temporary", post(temporary_handler))
        .route("/move", post(move_handler))
        .route("/invalidate", post(invalidate_handler))
        .route("/invalidate-all", post(invalidate_all_handler))
        .route("/all", delete(remove_all_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
