//! Error types for the hueify core.

use thiserror::Error;

/// Errors produced by color, quantization and track operations.
#[derive(Debug, Error)]
pub enum ColorError {
    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// The image held no usable pixels (empty, fully transparent, or all near-white).
    #[error("image has no usable pixels")]
    EmptyImage,

    /// Raw image bytes could not be decoded into pixels.
    #[error("image decode failed: {0}")]
    Decode(String),

    /// An artwork variant index outside `[0, 2]` was requested.
    #[error("artwork index {index} out of range (expected 0..=2)")]
    ArtworkIndexOutOfRange { index: usize },

    /// A configuration value was outside its valid range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
