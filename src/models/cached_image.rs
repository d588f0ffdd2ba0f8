//! Cached image value

use bytes::Bytes;

/// Bytes served for a request together with their MIME type.
///
/// `bytes` is reference counted, so cloning a cache hit does not copy the
/// image data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedImage {
    /// MIME type sent as `Content-Type`
    pub mime_type: String,
    /// Final response body, already resized if a resize was requested
    pub bytes: Bytes,
}

impl CachedImage {
    pub fn new(mime_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }
}
