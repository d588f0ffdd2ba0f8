//! Type Sniffer
//!
//! Classifies raw bytes by magic number.

/// Maps raw bytes to an image MIME type.
pub trait TypeSniffer: Send + Sync {
    /// Returns the MIME type, or `None` when the bytes are not an image.
    fn sniff(&self, bytes: &[u8]) -> Option<String>;
}

/// Sniffer backed by the `infer` magic-number tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct InferSniffer;

impl TypeSniffer for InferSniffer {
    fn sniff(&self, bytes: &[u8]) -> Option<String> {
        infer::get(bytes)
            .filter(|kind| matches!(kind.matcher_type(), infer::MatcherType::Image))
            .map(|kind| kind.mime_type().to_string())
    }
}
