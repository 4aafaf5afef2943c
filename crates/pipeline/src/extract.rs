//! `ColorExtractor` backed by the `image` crate.
//!
//! Decodes PNG, JPEG or WebP bytes, shrinks oversized artwork, and hands the
//! RGBA pixels to the core quantizer. Holds no mutable state, so one shared
//! instance serves every concurrent extraction.

use hueify_core::{
    extract_from_pixels, ColorError, ColorExtraction, ColorExtractor, ExtractorConfig, PixelLayout,
};
use image::imageops::FilterType;
use image::DynamicImage;

/// Decodes artwork with `image` and extracts its colors.
#[derive(Debug, Clone, Default)]
pub struct ImageExtractor {
    config: ExtractorConfig,
}

impl ImageExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Shrinks `img` so neither side exceeds `max_image_dimension`, keeping
    /// the aspect ratio. Nearest-neighbour sampling keeps source colors exact.
    fn bounded(&self, img: DynamicImage) -> DynamicImage {
        let max = self.config.max_image_dimension;
        if img.width() > max || img.height() > max {
            img.resize(max, max, FilterType::Nearest)
        } else {
            img
        }
    }
}

impl ColorExtractor for ImageExtractor {
    fn try_extract(&self, image_bytes: &[u8]) -> Result<ColorExtraction, ColorError> {
        self.config.validate()?;
        let img =
            image::load_from_memory(image_bytes).map_err(|e| ColorError::Decode(e.to_string()))?;
        let rgba = self.bounded(img).to_rgba8();
        extract_from_pixels(rgba.as_raw(), PixelLayout::Rgba, &self.config)
    }
}
