//! Configuration Module
//!
//! Server configuration. Only the listening port comes from the environment;
//! cache and fetch limits are fixed defaults that tests override directly.

use std::env;
use std::time::Duration;

/// Default listening port
pub const DEFAULT_PORT: u16 = 8080;
/// Maximum number of cached images
pub const DEFAULT_MAX_ENTRIES: usize = 500;
/// Lifetime of a cached image
pub const DEFAULT_TTL: Duration = Duration::from_millis(60_000);
/// Largest origin body accepted, in bytes
pub const DEFAULT_MAX_BODY_BYTES: usize = 10_000_000;
/// Largest accepted width or height
pub const DEFAULT_MAX_DIMENSION: u32 = 2160;

/// Server configuration parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Time an entry stays in the cache after insertion
    pub ttl: Duration,
    /// Interval between background sweeps of expired entries
    pub cleanup_interval: Duration,
    /// Ceiling on the origin response body
    pub max_body_bytes: usize,
    /// Ceiling on requested width and height
    pub max_dimension: u32,
    /// Timeout for a single origin request
    pub fetch_timeout: Duration,
}

impl Config {
    /// Creates a Config from defaults, reading the port from `PORT`.
    ///
    /// A missing or unparsable `PORT` falls back to 8080.
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: DEFAULT_PORT,
            max_entries: DEFAULT_MAX_ENTRIES,
            ttl: DEFAULT_TTL,
            cleanup_interval: Duration::from_secs(1),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_dimension: DEFAULT_MAX_DIMENSION,
            fetch_timeout: Duration::from_secs(30),
        }
    }
}
