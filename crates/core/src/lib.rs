#![deny(unsafe_code)]
//! Core types and algorithms for hueify.
//!
//! Provides the color types (`Rgb`, `Lch`) and the sRGB to CIELCh chain, the
//! median-cut quantizer, the `ColorExtractor` trait, representative color
//! selection, the `Track`/`ProcessedTrack` data model, the perceptual sort
//! comparator, and parameter helpers. Everything here is synchronous and
//! free of I/O; loading and batching live in `hueify-pipeline`.

pub mod color;
pub mod error;
pub mod extractor;
pub mod params;
pub mod processed;
pub mod quantize;
pub mod select;
pub mod sort;
pub mod track;

pub use color::{rgb_to_lch, Lch, Rgb, FALLBACK_COLOR};
pub use error::ColorError;
pub use extractor::{extract_from_pixels, ColorExtraction, ColorExtractor, ExtractorConfig};
pub use processed::{ColorSource, FallbackReason, ProcessedTrack};
pub use quantize::{quantize, PixelLayout, Swatch};
pub use select::{select_best_color, select_best_color_with, SelectorThresholds};
pub use sort::{compare_lch, compare_tracks, sort_tracks, LightnessOrder, SortOptions};
pub use track::{get_artwork_url, Artwork, Track, DEFAULT_ARTWORK_INDEX, FALLBACK_IMAGE};
