//! API Module
//!
//! HTTP handlers and routing exposing the URL cache over REST.
//!
//! # Endpoints
//! - `GET|PUT|DELETE /data` - Read, store, or remove data for a URL
//! - `GET /exists` - Check whether a URL is cached
//! - `POST /temporary` - Store data under a temporary URL
//! - `POST /move` - Move data to its permanent URL
//! - `POST /invalidate`, `POST /invalidate-all` - Mark disk entries stale
//! - `DELETE /all` - Clear the cache
//! - `GET /stats` - Memory cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
