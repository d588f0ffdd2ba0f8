//! Cache key derivation
//!
//! A key is the request's whole query string in canonical form: pairs are
//! decoded, stable-sorted by name and re-encoded. Every parameter takes part,
//! so distinct parameter sets never share a key, while reordering parameters
//! does not change it.

use std::fmt;

use url::form_urlencoded;

/// Key under which a served image is cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derives the key from a raw (still percent-encoded) query string.
    pub fn from_query(query: &str) -> Self {
        let mut pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        // Stable: repeated names keep their relative order.
        pairs.sort_by(|a, b| a.0.cmp(&b.0));

        let canonical = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        Self(canonical)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
