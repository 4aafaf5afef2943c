//! Picks the one color that stands for a track.
//!
//! The dominant color wins unless it is too dark, too light or too dull to
//! be useful in a sorted grid. In that case the most vivid mid-lightness
//! palette entry replaces it.

use crate::color::{rgb_to_lch, Lch, Rgb};
use crate::params::Params;
use serde_json::Value;

const DEFAULT_MIN_LIGHTNESS: f64 = 15.0;
const DEFAULT_MAX_LIGHTNESS: f64 = 85.0;
const DEFAULT_MIN_CHROMA: f64 = 15.0;

/// Lightness that scores best; candidates lose a point per unit away from it.
const TARGET_LIGHTNESS: f64 = 50.0;
/// Weight of chroma relative to the lightness penalty.
const CHROMA_WEIGHT: f64 = 2.0;

/// Bounds a color must stay within to be used as-is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectorThresholds {
    pub min_lightness: f64,
    pub max_lightness: f64,
    pub min_chroma: f64,
}

impl Default for SelectorThresholds {
    fn default() -> Self {
        Self {
            min_lightness: DEFAULT_MIN_LIGHTNESS,
            max_lightness: DEFAULT_MAX_LIGHTNESS,
            min_chroma: DEFAULT_MIN_CHROMA,
        }
    }
}

impl SelectorThresholds {
    pub fn from_json(params: &Value) -> Self {
        let p = Params::new(params);
        Self {
            min_lightness: p.f64("min_lightness", DEFAULT_MIN_LIGHTNESS),
            max_lightness: p.f64("max_lightness", DEFAULT_MAX_LIGHTNESS),
            min_chroma: p.f64("min_chroma", DEFAULT_MIN_CHROMA),
        }
    }

    /// True when `lch` is neither too dark, too light nor too dull.
    pub fn is_viable(&self, lch: &Lch) -> bool {
        !(lch.l < self.min_lightness || lch.l > self.max_lightness || lch.c < self.min_chroma)
    }
}

/// Higher is better: favors saturated colors near mid lightness.
pub fn viability_score(lch: &Lch) -> f64 {
    CHROMA_WEIGHT * lch.c - (lch.l - TARGET_LIGHTNESS).abs()
}

/// [`select_best_color_with`] using the default thresholds.
pub fn select_best_color(dominant: Rgb, palette: &[Rgb]) -> Rgb {
    select_best_color_with(&SelectorThresholds::default(), dominant, palette)
}

/// Returns `dominant` when it is viable, otherwise the best-scoring palette
/// entry. Ties go to the earlier (more dominant) entry. Falls back to
/// `dominant` when no palette entry has a finite score.
pub fn select_best_color_with(
    thresholds: &SelectorThresholds,
    dominant: Rgb,
    palette: &[Rgb],
) -> Rgb {
    if thresholds.is_viable(&rgb_to_lch(dominant)) {
        return dominant;
    }

    let mut best: Option<(Rgb, f64)> = None;
    for &candidate in palette {
        let score = viability_score(&rgb_to_lch(candidate));
        if !score.is_finite() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((candidate, score)),
        }
    }
    best.map_or(dominant, |(color, _)| color)
}
