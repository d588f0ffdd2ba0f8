//! Error types for the image proxy
//!
//! Every per-request failure is one of these kinds. The `Display` text is the
//! plain-text body sent back to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

// == Proxy Error Enum ==
/// Failure kinds surfaced by the request handler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// Method other than GET
    #[error("Invalid method")]
    InvalidMethod,

    /// Path other than `/`
    #[error("Not found")]
    NotFound,

    /// `url` missing or not a valid absolute http(s) URL
    #[error("Invalid URL. Expected a valid url in query")]
    InvalidUrl,

    /// `width` or `height` outside `(0, max]`
    #[error("Invalid dimensions. Width and height must be between 1 and {max}")]
    InvalidDimension { max: u32 },

    /// `quality` outside `[1, 100]`
    #[error("Invalid quality. Quality must be between 1 and 100")]
    InvalidQuality,

    /// Origin request failed, returned non-success, or had no body
    #[error("Image not found on origin server")]
    OriginUnavailable,

    /// Origin body exceeded the size ceiling
    #[error("Image too large. Max image size is {limit} bytes")]
    ImageTooLarge { limit: usize },

    /// Origin body is not a recognised image format
    #[error("Provided url is not an image")]
    NotAnImage,

    /// Transcode engine failed
    #[error("Failed to process image")]
    ResizeFailure,
}

impl ProxyError {
    /// HTTP status this kind is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::InvalidMethod => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::NotFound => StatusCode::NOT_FOUND,
            ProxyError::InvalidUrl
            | ProxyError::InvalidDimension { .. }
            | ProxyError::InvalidQuality
            | ProxyError::OriginUnavailable
            | ProxyError::ImageTooLarge { .. }
            | ProxyError::NotAnImage
            | ProxyError::ResizeFailure => StatusCode::BAD_REQUEST,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the image proxy.
pub type Result<T> = std::result::Result<T, ProxyError>;
