//! Request and cached-value models
//!
//! The normalised `ImageRequest`, the `CacheKey` derived from it, and the
//! `CachedImage` values held by the cache.

pub mod cache_key;
pub mod cached_image;
pub mod requests;

// Re-export commonly used types
pub use cache_key::CacheKey;
pub use cached_image::CachedImage;
pub use requests::{ImageRequest, RequestNormalizer};
