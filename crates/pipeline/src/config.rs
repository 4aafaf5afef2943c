//! Pipeline settings.

use crate::dedup::DuplicateAlbumPolicy;
use hueify_core::params::Params;
use hueify_core::track::MAX_ARTWORK_INDEX;
use hueify_core::{
    ColorError, ExtractorConfig, SelectorThresholds, SortOptions, DEFAULT_ARTWORK_INDEX,
};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_BATCH_SIZE: usize = 5;
const DEFAULT_ITEM_TIMEOUT_MS: u64 = 8000;

/// Everything a pipeline run can be tuned with.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Tracks processed concurrently per batch.
    pub batch_size: usize,
    /// Budget for loading plus extracting one track's artwork.
    pub item_timeout: Duration,
    /// Artwork variant to sample (0 = largest).
    pub artwork_index: usize,
    pub duplicate_albums: DuplicateAlbumPolicy,
    pub extractor: ExtractorConfig,
    pub selector: SelectorThresholds,
    pub sort: SortOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            item_timeout: Duration::from_millis(DEFAULT_ITEM_TIMEOUT_MS),
            artwork_index: DEFAULT_ARTWORK_INDEX,
            duplicate_albums: DuplicateAlbumPolicy::default(),
            extractor: ExtractorConfig::default(),
            selector: SelectorThresholds::default(),
            sort: SortOptions::default(),
        }
    }
}

impl PipelineConfig {
    /// Reads settings from a JSON object.
    ///
    /// ```json
    /// {
    ///   "batch_size": 5,
    ///   "item_timeout_ms": 8000,
    ///   "artwork_index": 1,
    ///   "duplicate_albums": "inherit",
    ///   "extractor": { "palette_size": 5 },
    ///   "selector": { "min_chroma": 15 },
    ///   "sort": { "lightness_order": "dark_first" }
    /// }
    /// ```
    ///
    /// Missing or mistyped keys keep their defaults.
    pub fn from_json(params: &Value) -> Self {
        let p = Params::new(params);
        Self {
            batch_size: p.usize("batch_size", DEFAULT_BATCH_SIZE),
            item_timeout: Duration::from_millis(p.u64("item_timeout_ms", DEFAULT_ITEM_TIMEOUT_MS)),
            artwork_index: p.usize("artwork_index", DEFAULT_ARTWORK_INDEX),
            duplicate_albums: DuplicateAlbumPolicy::from_name(p.str("duplicate_albums", ""))
                .unwrap_or_default(),
            extractor: ExtractorConfig::from_json(p.nested("extractor")),
            selector: SelectorThresholds::from_json(p.nested("selector")),
            sort: SortOptions::from_json(p.nested("sort")),
        }
    }

    /// Rejects settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ColorError> {
        if self.batch_size == 0 {
            return Err(ColorError::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.item_timeout.is_zero() {
            return Err(ColorError::InvalidConfig(
                "item_timeout must be positive".to_string(),
            ));
        }
        if self.artwork_index > MAX_ARTWORK_INDEX {
            return Err(ColorError::ArtworkIndexOutOfRange {
                index: self.artwork_index,
            });
        }
        self.extractor.validate()
    }
}
