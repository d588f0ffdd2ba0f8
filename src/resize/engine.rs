//! Transcode engine
//!
//! Decode, resize to an exact geometry and re-encode in the source format.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use thiserror::Error;

/// Target width × height of a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

/// Re-encoded output of the engine.
#[derive(Debug, Clone)]
pub struct Transcoded {
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("image codec error: {0}")]
    Codec(#[from] image::ImageError),

    #[error("no encoder for {0:?}")]
    UnsupportedFormat(ImageFormat),
}

/// Blocking decode/resize/encode engine.
pub trait Transcoder: Send + Sync {
    /// Resizes `source` to exactly `geometry`, applying `quality` (1..=100)
    /// where the output codec supports it.
    fn transcode(
        &self,
        source: &[u8],
        geometry: Geometry,
        quality: u8,
    ) -> Result<Transcoded, TranscodeError>;
}

/// Engine built on the `image` crate.
#[derive(Debug, Clone, Copy)]
pub struct ImageTranscoder {
    filter: FilterType,
}

impl Default for ImageTranscoder {
    fn default() -> Self {
        Self {
            filter: FilterType::Lanczos3,
        }
    }
}

impl Transcoder for ImageTranscoder {
    fn transcode(
        &self,
        source: &[u8],
        geometry: Geometry,
        quality: u8,
    ) -> Result<Transcoded, TranscodeError> {
        let format = image::guess_format(source)?;
        let mime_type = mime_type_for_format(format).ok_or(TranscodeError::UnsupportedFormat(format))?;

        let decoded = image::load_from_memory_with_format(source, format)?;
        // Aspect ratio is not preserved.
        let resized = decoded.resize_exact(geometry.width, geometry.height, self.filter);

        let bytes = encode(&resized, format, quality)?;
        Ok(Transcoded { mime_type, bytes })
    }
}

fn encode(image: &DynamicImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>, TranscodeError> {
    let mut buf = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = image.to_rgb8();
            JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).encode_image(&rgb)?;
        }
        ImageFormat::Png | ImageFormat::Gif | ImageFormat::WebP => {
            let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
            rgba.write_to(&mut Cursor::new(&mut buf), format)?;
        }
        other => return Err(TranscodeError::UnsupportedFormat(other)),
    }
    Ok(buf)
}

fn mime_type_for_format(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::WebP => Some("image/webp"),
        _ => None,
    }
}
