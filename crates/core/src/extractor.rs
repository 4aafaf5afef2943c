//! The `ColorExtractor` trait and the value it produces.
//!
//! An extractor turns raw image bytes into a dominant color plus a small
//! palette. The trait is object-safe and requires `Send + Sync` so a single
//! shared instance can serve many concurrent extractions.

use crate::color::{Rgb, FALLBACK_COLOR};
use crate::error::ColorError;
use crate::params::Params;
use crate::quantize::{quantize, PixelLayout};
use serde::Serialize;
use serde_json::Value;

/// Number of swatches quantized when picking the dominant color.
const DOMINANT_SWATCHES: usize = 5;
/// Default palette length.
const DEFAULT_PALETTE_SIZE: usize = 5;
/// Default sampling stride for the palette pass.
const DEFAULT_QUALITY: usize = 10;
/// Default sampling stride for the dominant-color pass.
const DEFAULT_DOMINANT_QUALITY: usize = 2;
/// Images larger than this on either side are downscaled before sampling.
const DEFAULT_MAX_IMAGE_DIMENSION: u32 = 512;

/// Dominant color and palette of one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorExtraction {
    pub dominant: Rgb,
    /// Ordered by dominance, first = largest coverage. Never empty.
    pub palette: Vec<Rgb>,
}

impl ColorExtraction {
    /// The neutral result used when an image yields no color.
    pub fn fallback() -> Self {
        Self {
            dominant: FALLBACK_COLOR,
            palette: vec![FALLBACK_COLOR],
        }
    }
}

/// Tunables for palette extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractorConfig {
    /// Maximum number of palette entries.
    pub palette_size: usize,
    /// Pixel sampling stride for the palette pass.
    pub quality: usize,
    /// Pixel sampling stride for the dominant-color pass.
    pub dominant_quality: usize,
    /// Longest side an image is reduced to before sampling.
    pub max_image_dimension: u32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            palette_size: DEFAULT_PALETTE_SIZE,
            quality: DEFAULT_QUALITY,
            dominant_quality: DEFAULT_DOMINANT_QUALITY,
            max_image_dimension: DEFAULT_MAX_IMAGE_DIMENSION,
        }
    }
}

impl ExtractorConfig {
    /// Reads settings from a JSON object, falling back to defaults.
    pub fn from_json(params: &Value) -> Self {
        let p = Params::new(params);
        Self {
            palette_size: p.usize("palette_size", DEFAULT_PALETTE_SIZE),
            quality: p.usize("quality", DEFAULT_QUALITY),
            dominant_quality: p.usize("dominant_quality", DEFAULT_DOMINANT_QUALITY),
            max_image_dimension: p.u32("max_image_dimension", DEFAULT_MAX_IMAGE_DIMENSION),
        }
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<(), ColorError> {
        if self.palette_size == 0 {
            return Err(ColorError::InvalidConfig(
                "palette_size must be at least 1".to_string(),
            ));
        }
        if self.quality == 0 || self.dominant_quality == 0 {
            return Err(ColorError::InvalidConfig(
                "quality strides must be at least 1".to_string(),
            ));
        }
        if self.max_image_dimension == 0 {
            return Err(ColorError::InvalidConfig(
                "max_image_dimension must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Extracts dominant color and palette from already-decoded pixels.
///
/// The dominant color is the most populated swatch of a fine-stride pass;
/// the palette comes from a coarser pass limited to `palette_size` entries.
pub fn extract_from_pixels(
    pixels: &[u8],
    layout: PixelLayout,
    config: &ExtractorConfig,
) -> Result<ColorExtraction, ColorError> {
    config.validate()?;
    let dominant = quantize(pixels, layout, config.dominant_quality, DOMINANT_SWATCHES)?
        .first()
        .map(|s| s.color)
        .ok_or(ColorError::EmptyImage)?;
    // The coarser pass can land only on skipped pixels of an image the
    // dominant pass already found color in.
    let palette = match quantize(pixels, layout, config.quality, config.palette_size) {
        Ok(swatches) if !swatches.is_empty() => swatches.into_iter().map(|s| s.color).collect(),
        Ok(_) | Err(ColorError::EmptyImage) => vec![dominant],
        Err(e) => return Err(e),
    };
    Ok(ColorExtraction { dominant, palette })
}

/// Turns encoded image bytes into a [`ColorExtraction`].
pub trait ColorExtractor: Send + Sync {
    /// Decodes and quantizes `image_bytes`, reporting why it failed.
    fn try_extract(&self, image_bytes: &[u8]) -> Result<ColorExtraction, ColorError>;

    /// Like [`try_extract`](Self::try_extract) but never fails: any error
    /// degrades to [`ColorExtraction::fallback`].
    fn extract(&self, image_bytes: &[u8]) -> ColorExtraction {
        self.try_extract(image_bytes)
            .unwrap_or_else(|_| ColorExtraction::fallback())
    }
}
