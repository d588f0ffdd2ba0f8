//! TTL Cleanup Task
//!
//! Background sweep that drops expired images so their memory is released
//! even if nobody asks for them again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Spawns a task that purges expired entries every `interval`.
///
/// The returned handle is aborted on shutdown.
pub fn spawn_cleanup_task(cache: SharedCache, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "Starting TTL cleanup task");

        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let removed = cache.cleanup_expired();

            if removed > 0 {
                let stats = cache.stats();
                info!(
                    removed,
                    entries = stats.total_entries,
                    hits = stats.hits,
                    misses = stats.misses,
                    evictions = stats.evictions,
                    hit_rate = stats.hit_rate(),
                    "TTL cleanup removed expired images"
                );
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
