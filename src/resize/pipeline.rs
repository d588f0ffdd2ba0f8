//! Resize Pipeline
//!
//! Decides whether a fetched image needs transcoding and, if so, runs the
//! engine off the async runtime.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error, warn};

use crate::error::{ProxyError, Result};
use crate::models::{CachedImage, ImageRequest};
use crate::resize::{Geometry, Transcoder};

/// Output of the pipeline: the body to serve and whether it was resized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub image: CachedImage,
    pub resized: bool,
}

/// Marshals request parameters into the transcode engine.
#[derive(Clone)]
pub struct ResizePipeline {
    engine: Arc<dyn Transcoder>,
}

impl ResizePipeline {
    pub fn new(engine: Arc<dyn Transcoder>) -> Self {
        Self { engine }
    }

    /// Produces the response body for `request` from the sniffed origin image.
    ///
    /// Without a full geometry the original is passed through untouched.
    pub async fn render(&self, original: CachedImage, request: &ImageRequest) -> Result<Rendered> {
        if !request.wants_resize() {
            return Ok(Rendered {
                image: original,
                resized: false,
            });
        }

        let geometry = Geometry {
            width: request.width,
            height: request.height,
        };
        let quality = request.quality;
        let engine = Arc::clone(&self.engine);
        let source = original.bytes.clone();

        let outcome =
            tokio::task::spawn_blocking(move || engine.transcode(&source, geometry, quality)).await;

        match outcome {
            Ok(Ok(transcoded)) => {
                debug!(
                    url = %request.source_url,
                    width = geometry.width,
                    height = geometry.height,
                    quality,
                    bytes = transcoded.bytes.len(),
                    "Resized image"
                );
                Ok(Rendered {
                    image: CachedImage::new(transcoded.mime_type, Bytes::from(transcoded.bytes)),
                    resized: true,
                })
            }
            Ok(Err(e)) => {
                warn!(url = %request.source_url, error = %e, "Transcode failed");
                Err(ProxyError::ResizeFailure)
            }
            Err(e) => {
                error!(url = %request.source_url, error = %e, "Transcode task panicked");
                Err(ProxyError::ResizeFailure)
            }
        }
    }
}
