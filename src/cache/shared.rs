//! Shared Cache Handle
//!
//! Cloneable, thread-safe handle over a [`CacheStore`]. Each call holds the
//! lock only for the in-memory operation itself and never across an await.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::cache::{CacheStats, CacheStore};
use crate::models::CachedImage;

/// Thread-safe handle to the image cache.
#[derive(Debug, Clone)]
pub struct SharedCache {
    inner: Arc<Mutex<CacheStore<CachedImage>>>,
}

impl SharedCache {
    pub fn new(store: CacheStore<CachedImage>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn get(&self, key: &str) -> Option<CachedImage> {
        self.lock().get(key)
    }

    pub fn set(&self, key: &str, image: CachedImage) {
        self.lock().set(key, image);
    }

    pub fn delete(&self, key: &str) -> bool {
        self.lock().delete(key)
    }

    pub fn cleanup_expired(&self) -> usize {
        self.lock().cleanup_expired()
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave the store half-updated in a
    // way later calls care about, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, CacheStore<CachedImage>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
