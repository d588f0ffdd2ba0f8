//! Resize Module
//!
//! The pipeline that decides whether to transcode, and the engine behind it.

mod engine;
mod pipeline;

pub use engine::{Geometry, ImageTranscoder, TranscodeError, Transcoded, Transcoder};
pub use pipeline::{Rendered, ResizePipeline};
