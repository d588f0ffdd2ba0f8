//! API Handlers
//!
//! The image endpoint: validate, consult the cache, and on a miss fetch,
//! sniff, resize and populate the cache before responding.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::cache::{CacheStore, SharedCache};
use crate::config::Config;
use crate::error::{ProxyError, Result};
use crate::models::{CachedImage, RequestNormalizer};
use crate::origin::{HttpFetcher, InferSniffer, OriginFetcher, TypeSniffer};
use crate::resize::{ImageTranscoder, ResizePipeline, Transcoder};

/// `Cache-Control` sent to clients for freshly produced images.
pub const CLIENT_CACHE_CONTROL: &str = "public, max-age=31536000";

/// Application state shared across all handlers.
///
/// The cache is the only state shared between concurrent requests.
#[derive(Clone)]
pub struct AppState {
    /// Shared image cache
    pub cache: SharedCache,
    pub normalizer: RequestNormalizer,
    pub fetcher: Arc<dyn OriginFetcher>,
    pub sniffer: Arc<dyn TypeSniffer>,
    pub pipeline: ResizePipeline,
}

impl AppState {
    /// Assembles state from explicit collaborators.
    pub fn new(
        cache: SharedCache,
        normalizer: RequestNormalizer,
        fetcher: Arc<dyn OriginFetcher>,
        sniffer: Arc<dyn TypeSniffer>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        Self {
            cache,
            normalizer,
            fetcher,
            sniffer,
            pipeline: ResizePipeline::new(transcoder),
        }
    }

    /// Production wiring: system-clock cache, `reqwest` fetcher, `infer`
    /// sniffer and `image` transcoder.
    pub fn from_config(config: &Config) -> std::result::Result<Self, reqwest::Error> {
        let cache = SharedCache::new(CacheStore::new(config.max_entries, config.ttl));
        let fetcher = HttpFetcher::new(config.max_body_bytes, config.fetch_timeout)?;

        Ok(Self::new(
            cache,
            RequestNormalizer::new(config.max_dimension),
            Arc::new(fetcher),
            Arc::new(InferSniffer),
            Arc::new(ImageTranscoder::default()),
        ))
    }
}

/// Handler for every request.
///
/// Registered as the router fallback so method is checked before path.
pub async fn image_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response> {
    let request = state.normalizer.normalize(&method, &uri, &headers)?;
    let key = request.key.as_str();

    if request.bypass_cache {
        state.cache.delete(key);
        debug!(%key, "Cache bypassed by request");
    } else if let Some(hit) = state.cache.get(key) {
        debug!(%key, bytes = hit.bytes.len(), "Cache hit");
        return Ok(image_response(hit, false));
    } else {
        debug!(%key, "Cache miss");
    }

    let body = state.fetcher.fetch(&request.source_url).await?;

    let mime_type = state.sniffer.sniff(&body).ok_or_else(|| {
        debug!(url = %request.source_url, "Origin body is not an image");
        ProxyError::NotAnImage
    })?;

    let rendered = state
        .pipeline
        .render(CachedImage::new(mime_type, body), &request)
        .await?;

    state.cache.set(key, rendered.image.clone());

    let long_lived = rendered.resized || !request.bypass_cache;
    Ok(image_response(rendered.image, long_lived))
}

fn image_response(image: CachedImage, long_lived: bool) -> Response {
    let mut response = (
        StatusCode::OK,
        [(header::CONTENT_TYPE, image.mime_type)],
        image.bytes,
    )
        .into_response();

    if long_lived {
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(CLIENT_CACHE_CONTROL),
        );
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::resize::{Geometry, TranscodeError, Transcoded};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[derive(Default)]
    struct FakeOrigin {
        responses: HashMap<String, Result<Bytes>>,
        calls: AtomicUsize,
    }

    impl FakeOrigin {
        fn with(mut self, url: &str, response: Result<Bytes>) -> Self {
            self.responses.insert(url.to_string(), response);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl OriginFetcher for FakeOrigin {
        async fn fetch(&self, url: &str) -> Result<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .get(url)
                .cloned()
                .unwrap_or(Err(ProxyError::OriginUnavailable))
        }
    }

    struct FakeEngine {
        fail: bool,
    }

    impl Transcoder for FakeEngine {
        fn transcode(
            &self,
            _source: &[u8],
            geometry: Geometry,
            quality: u8,
        ) -> std::result::Result<Transcoded, TranscodeError> {
            if self.fail {
                return Err(TranscodeError::UnsupportedFormat(image::ImageFormat::Tiff));
            }
            let bytes = format!("{}x{}@{}", geometry.width, geometry.height, quality).into_bytes();
            Ok(Transcoded {
                mime_type: "image/png",
                bytes,
            })
        }
    }

    struct Harness {
        state: AppState,
        origin: Arc<FakeOrigin>,
        clock: ManualClock,
    }

    fn harness(origin: FakeOrigin, engine_fails: bool) -> Harness {
        let clock = ManualClock::new(0);
        let origin = Arc::new(origin);
        let cache = SharedCache::new(CacheStore::with_clock(
            500,
            Duration::from_millis(60_000),
            Arc::new(clock.clone()),
        ));
        let state = AppState::new(
            cache,
            RequestNormalizer::default(),
            origin.clone(),
            Arc::new(InferSniffer),
            Arc::new(FakeEngine { fail: engine_fails }),
        );
        Harness {
            state,
            origin,
            clock,
        }
    }

    fn cat_origin() -> FakeOrigin {
        FakeOrigin::default()
            .with("https://example.com/cat.png", Ok(Bytes::from_static(PNG_MAGIC)))
            .with("https://example.com/page.html", Ok(Bytes::from_static(b"<html></html>")))
            .with(
                "https://example.com/huge.bin",
                Err(ProxyError::ImageTooLarge { limit: 10_000_000 }),
            )
    }

    async fn call(state: &AppState, method: Method, uri: &str, no_cache: bool) -> Result<Response> {
        let mut headers = HeaderMap::new();
        if no_cache {
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        }
        image_handler(State(state.clone()), method, uri.parse().unwrap(), headers).await
    }

    async fn body(response: Response) -> Bytes {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let h = harness(cat_origin(), false);
        let uri = "/?url=https://example.com/cat.png";

        let first = call(&h.state, Method::GET, uri, false).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(first.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(first.headers()[header::CACHE_CONTROL], CLIENT_CACHE_CONTROL);
        assert_eq!(body(first).await, Bytes::from_static(PNG_MAGIC));

        let second = call(&h.state, Method::GET, uri, false).await.unwrap();
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(second.headers()[header::CONTENT_TYPE], "image/png");
        assert!(second.headers().get(header::CACHE_CONTROL).is_none());
        assert_eq!(body(second).await, Bytes::from_static(PNG_MAGIC));

        assert_eq!(h.origin.calls(), 1);
    }

    #[tokio::test]
    async fn test_resize_cached_under_distinct_key() {
        let h = harness(cat_origin(), false);

        call(&h.state, Method::GET, "/?url=https://example.com/cat.png", false)
            .await
            .unwrap();
        let resized = call(
            &h.state,
            Method::GET,
            "/?url=https://example.com/cat.png&width=100&height=100&quality=50",
            false,
        )
        .await
        .unwrap();

        assert_eq!(resized.headers()[header::CACHE_CONTROL], CLIENT_CACHE_CONTROL);
        assert_eq!(&body(resized).await[..], b"100x100@50");
        assert_eq!(h.state.cache.len(), 2);
        assert_eq!(h.origin.calls(), 2);
    }

    #[tokio::test]
    async fn test_no_cache_always_fetches() {
        let h = harness(cat_origin(), false);
        let uri = "/?url=https://example.com/cat.png";

        call(&h.state, Method::GET, uri, false).await.unwrap();
        let bypass = call(&h.state, Method::GET, uri, true).await.unwrap();

        assert_eq!(bypass.status(), StatusCode::OK);
        assert!(bypass.headers().get(header::CACHE_CONTROL).is_none());
        assert_eq!(h.origin.calls(), 2);

        // The bypassed response repopulates the cache.
        call(&h.state, Method::GET, uri, false).await.unwrap();
        assert_eq!(h.origin.calls(), 2);
    }

    #[tokio::test]
    async fn test_no_cache_with_resize_sets_client_cache_control() {
        let h = harness(cat_origin(), false);

        let response = call(
            &h.state,
            Method::GET,
            "/?url=https://example.com/cat.png&width=5&height=5",
            true,
        )
        .await
        .unwrap();

        assert_eq!(response.headers()[header::CACHE_CONTROL], CLIENT_CACHE_CONTROL);
        assert_eq!(&body(response).await[..], b"5x5@100");
    }

    #[tokio::test]
    async fn test_expired_entry_refetches() {
        let h = harness(cat_origin(), false);
        let uri = "/?url=https://example.com/cat.png";

        call(&h.state, Method::GET, uri, false).await.unwrap();
        h.clock.advance(Duration::from_millis(60_000));
        call(&h.state, Method::GET, uri, false).await.unwrap();

        assert_eq!(h.origin.calls(), 2);
    }

    #[tokio::test]
    async fn test_validation_errors_skip_cache_and_origin() {
        let h = harness(cat_origin(), false);

        let cases = [
            (Method::POST, "/?url=https://example.com/cat.png", ProxyError::InvalidMethod),
            (Method::GET, "/other-path", ProxyError::NotFound),
            (Method::GET, "/?url=not-a-url", ProxyError::InvalidUrl),
            (
                Method::GET,
                "/?url=https://example.com/cat.png&width=3000&height=10",
                ProxyError::InvalidDimension { max: 2160 },
            ),
            (
                Method::GET,
                "/?url=https://example.com/cat.png&width=10&height=10&quality=0",
                ProxyError::InvalidQuality,
            ),
        ];

        for (method, uri, expected) in cases {
            let result = call(&h.state, method, uri, false).await;
            assert_eq!(result.err(), Some(expected), "{uri}");
        }

        assert_eq!(h.origin.calls(), 0);
        assert!(h.state.cache.is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let h = harness(cat_origin(), true);

        let cases = [
            ("/?url=https://example.com/missing.png", ProxyError::OriginUnavailable),
            (
                "/?url=https://example.com/huge.bin",
                ProxyError::ImageTooLarge { limit: 10_000_000 },
            ),
            ("/?url=https://example.com/page.html", ProxyError::NotAnImage),
            (
                "/?url=https://example.com/cat.png&width=10&height=10",
                ProxyError::ResizeFailure,
            ),
        ];

        for (uri, expected) in cases {
            let result = call(&h.state, Method::GET, uri, false).await;
            assert_eq!(result.err(), Some(expected), "{uri}");
        }

        assert!(h.state.cache.is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_existing_entries() {
        let h = harness(cat_origin(), false);

        call(&h.state, Method::GET, "/?url=https://example.com/cat.png", false)
            .await
            .unwrap();
        let _ = call(&h.state, Method::GET, "/?url=https://example.com/page.html", false).await;

        assert_eq!(h.state.cache.len(), 1);
    }
}
