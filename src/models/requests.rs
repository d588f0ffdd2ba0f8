//! Request normalisation
//!
//! Turns a raw GET request into a validated [`ImageRequest`]. Checks run in a
//! fixed order and the first failure wins: method, path, `url`, dimensions,
//! quality.

use axum::http::{header, HeaderMap, Method, Uri};
use url::{form_urlencoded, Url};

use crate::config::DEFAULT_MAX_DIMENSION;
use crate::error::{ProxyError, Result};
use crate::models::CacheKey;

/// Quality used when the request does not name one.
pub const DEFAULT_QUALITY: u8 = 100;

/// A validated image request. Built once per inbound request.
///
/// `width` and `height` are either both 0 (serve the original) or both in
/// `1..=max_dimension`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    /// Origin image URL
    pub source_url: String,
    /// Target width, 0 when not resizing
    pub width: u32,
    /// Target height, 0 when not resizing
    pub height: u32,
    /// Encoder quality in `1..=100`, only applied when resizing
    pub quality: u8,
    /// Set by `Cache-Control: no-cache`
    pub bypass_cache: bool,
    /// Key derived from the full query string
    pub key: CacheKey,
}

impl ImageRequest {
    /// Whether the origin bytes go through the resize pipeline.
    pub fn wants_resize(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Validates inbound requests against the configured dimension ceiling.
#[derive(Debug, Clone, Copy)]
pub struct RequestNormalizer {
    max_dimension: u32,
}

impl Default for RequestNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DIMENSION)
    }
}

impl RequestNormalizer {
    pub fn new(max_dimension: u32) -> Self {
        Self { max_dimension }
    }

    /// Validates the request and builds its [`ImageRequest`].
    pub fn normalize(&self, method: &Method, uri: &Uri, headers: &HeaderMap) -> Result<ImageRequest> {
        if *method != Method::GET {
            return Err(ProxyError::InvalidMethod);
        }

        if uri.path() != "/" {
            return Err(ProxyError::NotFound);
        }

        let query = uri.query().unwrap_or("");
        let params = QueryParams::parse(query);

        let source_url = params
            .url
            .as_deref()
            .filter(|url| is_valid_source_url(url))
            .map(str::to_owned)
            .ok_or(ProxyError::InvalidUrl)?;

        let (width, height, quality) = self.geometry(&params)?;

        Ok(ImageRequest {
            source_url,
            width,
            height,
            quality,
            bypass_cache: wants_no_cache(headers),
            key: CacheKey::from_query(query),
        })
    }

    /// Resolves `(width, height, quality)`.
    ///
    /// A resize needs both dimensions and both nonzero; otherwise the request
    /// serves the original and `quality` is ignored.
    fn geometry(&self, params: &QueryParams) -> Result<(u32, u32, u8)> {
        let invalid_dimension = ProxyError::InvalidDimension {
            max: self.max_dimension,
        };

        let width = parse_optional::<i64>(params.width.as_deref())
            .map_err(|_| invalid_dimension.clone())?;
        let height = parse_optional::<i64>(params.height.as_deref())
            .map_err(|_| invalid_dimension.clone())?;

        let (width, height) = match (width, height) {
            (Some(width), Some(height)) if width != 0 && height != 0 => (width, height),
            _ => return Ok((0, 0, DEFAULT_QUALITY)),
        };

        let max = i64::from(self.max_dimension);
        if !(1..=max).contains(&width) || !(1..=max).contains(&height) {
            return Err(invalid_dimension);
        }

        let quality = parse_optional::<i64>(params.quality.as_deref())
            .map_err(|_| ProxyError::InvalidQuality)?
            .unwrap_or(i64::from(DEFAULT_QUALITY));
        if !(1..=100).contains(&quality) {
            return Err(ProxyError::InvalidQuality);
        }

        // All three are range checked above.
        Ok((width as u32, height as u32, quality as u8))
    }
}

/// First occurrence of each parameter the proxy reads.
#[derive(Debug, Default)]
struct QueryParams {
    url: Option<String>,
    width: Option<String>,
    height: Option<String>,
    quality: Option<String>,
}

impl QueryParams {
    fn parse(query: &str) -> Self {
        let mut params = Self::default();
        for (name, value) in form_urlencoded::parse(query.as_bytes()) {
            let slot = match name.as_ref() {
                "url" => &mut params.url,
                "width" => &mut params.width,
                "height" => &mut params.height,
                "quality" => &mut params.quality,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }
}

fn parse_optional<T: std::str::FromStr>(value: Option<&str>) -> std::result::Result<Option<T>, T::Err> {
    value.map(|v| v.trim().parse()).transpose()
}

/// Absolute http(s) URL with a host.
///
/// Percent escapes that are not valid UTF-8 decode to U+FFFD, so any URL
/// carrying it is rejected rather than fetched in mangled form.
pub fn is_valid_source_url(candidate: &str) -> bool {
    if candidate.contains(char::REPLACEMENT_CHARACTER) {
        return false;
    }
    match Url::parse(candidate) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}

/// True when any `Cache-Control` directive is `no-cache`.
fn wants_no_cache(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::CACHE_CONTROL)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|directive| directive.trim().eq_ignore_ascii_case("no-cache"))
}
