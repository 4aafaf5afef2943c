//! A track paired with the color it will be sorted by.

use crate::color::{rgb_to_lch, Lch, Rgb, FALLBACK_COLOR};
use crate::extractor::ColorExtraction;
use crate::select::{select_best_color_with, SelectorThresholds};
use crate::track::Track;
use serde::Serialize;
use std::fmt;

/// Why a track ended up with the fallback color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// Artwork bytes could not be fetched.
    Load,
    /// Load plus extraction did not finish in time.
    Timeout,
    /// The image could not be decoded or held no usable pixels.
    Extraction,
    /// No artwork URL could be chosen for the track.
    Artwork,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FallbackReason::Load => "load",
            FallbackReason::Timeout => "timeout",
            FallbackReason::Extraction => "extraction",
            FallbackReason::Artwork => "artwork",
        };
        f.write_str(label)
    }
}

/// Where a track's color came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColorSource {
    /// Extracted from the track's own artwork.
    Extracted,
    /// Copied from an earlier track with the same album.
    Inherited { from: String },
    /// Neutral fallback after a per-track failure.
    Fallback { reason: FallbackReason },
}

/// A track with its representative color and LCH sort key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedTrack {
    pub track: Track,
    /// Representative color chosen for sorting.
    pub color: Rgb,
    pub dominant: Rgb,
    pub palette: Vec<Rgb>,
    pub lch: Lch,
    pub source: ColorSource,
}

impl ProcessedTrack {
    /// Builds a processed track from a successful extraction.
    pub fn from_extraction(
        track: Track,
        extraction: ColorExtraction,
        thresholds: &SelectorThresholds,
    ) -> Self {
        let color = select_best_color_with(thresholds, extraction.dominant, &extraction.palette);
        Self {
            track,
            color,
            dominant: extraction.dominant,
            palette: extraction.palette,
            lch: rgb_to_lch(color),
            source: ColorSource::Extracted,
        }
    }

    /// Builds a processed track carrying the fallback color.
    ///
    /// The LCH key is [`Lch::FALLBACK`], not the converted gray, so every
    /// failed track sorts identically.
    pub fn fallback(track: Track, reason: FallbackReason) -> Self {
        Self {
            track,
            color: FALLBACK_COLOR,
            dominant: FALLBACK_COLOR,
            palette: vec![FALLBACK_COLOR],
            lch: Lch::FALLBACK,
            source: ColorSource::Fallback { reason },
        }
    }

    /// Gives `track` the colors already computed for `origin`.
    ///
    /// A fallback origin passes its fallback on, so the copy still counts as
    /// a failure.
    pub fn inherit(track: Track, origin: &ProcessedTrack) -> Self {
        let source = match origin.source {
            ColorSource::Fallback { reason } => ColorSource::Fallback { reason },
            _ => ColorSource::Inherited {
                from: origin.track.id().to_string(),
            },
        };
        Self {
            track,
            color: origin.color,
            dominant: origin.dominant,
            palette: origin.palette.clone(),
            lch: origin.lch,
            source,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.source, ColorSource::Fallback { .. })
    }

    pub fn output_uri(&self) -> Option<&str> {
        self.track.output_uri()
    }
}
