//! Origin Module
//!
//! Fetching source images and classifying what came back.

mod fetcher;
mod sniffer;

pub use fetcher::{HttpFetcher, OriginFetcher};
pub use sniffer::{InferSniffer, TypeSniffer};
