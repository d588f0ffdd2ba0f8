//! Origin Fetcher
//!
//! Single GET against the origin with a hard ceiling on body size.

use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::{header, Client};
use tracing::{debug, warn};

use crate::error::{ProxyError, Result};

/// Retrieves the raw bytes behind a source URL.
#[async_trait]
pub trait OriginFetcher: Send + Sync {
    /// Fetches `url` once. Never retries.
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// `reqwest`-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    /// Builds a fetcher with its own connection pool.
    pub fn new(max_body_bytes: usize, timeout: Duration) -> std::result::Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, max_body_bytes))
    }

    pub fn with_client(client: Client, max_body_bytes: usize) -> Self {
        Self {
            client,
            max_body_bytes,
        }
    }

    fn too_large(&self) -> ProxyError {
        ProxyError::ImageTooLarge {
            limit: self.max_body_bytes,
        }
    }
}

#[async_trait]
impl OriginFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let mut response = self
            .client
            .get(url)
            .header(header::ACCEPT, "image/*")
            .send()
            .await
            .map_err(|e| {
                warn!(url, error = %e, "Origin request failed");
                ProxyError::OriginUnavailable
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, %status, "Origin returned non-success status");
            return Err(ProxyError::OriginUnavailable);
        }

        // Reject early when the origin announces an oversized body.
        if let Some(declared) = response.content_length() {
            if declared > self.max_body_bytes as u64 {
                warn!(url, declared, limit = self.max_body_bytes, "Origin body too large");
                return Err(self.too_large());
            }
        }

        let capacity = response
            .content_length()
            .map_or(0, |len| len as usize)
            .min(self.max_body_bytes);
        let mut body = BytesMut::with_capacity(capacity);

        // Stream the body so an oversized response is abandoned as soon as it
        // crosses the ceiling.
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            warn!(url, error = %e, "Failed to read origin body");
            ProxyError::OriginUnavailable
        })? {
            if body.len() + chunk.len() > self.max_body_bytes {
                warn!(url, limit = self.max_body_bytes, "Origin body too large");
                return Err(self.too_large());
            }
            body.extend_from_slice(&chunk);
        }

        if body.is_empty() {
            warn!(url, "Origin returned an empty body");
            return Err(ProxyError::OriginUnavailable);
        }

        debug!(url, bytes = body.len(), "Fetched origin image");
        Ok(body.freeze())
    }
}
