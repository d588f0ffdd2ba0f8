//! API Module
//!
//! HTTP surface of the proxy.
//!
//! # Endpoints
//! - `GET /?url=<source>&width=<w>&height=<h>&quality=<q>` - serve an image
//!
//! Any other path is 404 and any other method is 405.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
