//! Image Proxy - fetch, resize and cache origin images on demand
//!
//! A request names a source URL and optional geometry/quality. The proxy
//! serves from its in-memory cache when it can, otherwise fetches the origin,
//! checks it is an image, resizes it if asked, caches the result and serves it.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod origin;
pub mod resize;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::ProxyError;
pub use tasks::spawn_cleanup_task;
