//! Perceptual ordering of processed tracks.
//!
//! Tracks are ordered by hue first, then by chroma, then by lightness, with
//! each key only consulted when the previous one is within a tolerance band:
//!
//! 1. Colors with chroma below `achromatic_chroma` get the sentinel hue 360
//!    so grays land after every chromatic hue.
//! 2. Hues more than `hue_tolerance` degrees apart sort ascending. Hue is
//!    compared as a raw value on `[0, 360]`; 2 and 358 are far apart.
//! 3. Chromas more than `chroma_tolerance` apart sort descending.
//! 4. Otherwise lightness decides, in the direction given by
//!    [`LightnessOrder`].
//!
//! Banded comparison is not transitive for chains of near-equal colors.
//! [`sort_tracks`] therefore uses [`stable_sort_by`], a merge sort that
//! accepts any comparator without panicking and keeps equal items in input
//! order.

use crate::color::Lch;
use crate::params::Params;
use crate::processed::ProcessedTrack;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Hue assigned to achromatic colors.
pub const ACHROMATIC_HUE: f64 = 360.0;

const DEFAULT_ACHROMATIC_CHROMA: f64 = 5.0;
const DEFAULT_HUE_TOLERANCE: f64 = 15.0;
const DEFAULT_CHROMA_TOLERANCE: f64 = 10.0;

/// Direction of the final lightness tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightnessOrder {
    /// Darker colors first (ascending lightness).
    #[default]
    DarkFirst,
    /// Lighter colors first (descending lightness).
    LightFirst,
}

impl LightnessOrder {
    /// Parses `"dark_first"` or `"light_first"`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "dark_first" => Some(LightnessOrder::DarkFirst),
            "light_first" => Some(LightnessOrder::LightFirst),
            _ => None,
        }
    }
}

/// Tolerances for the perceptual comparator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SortOptions {
    /// Chroma below which a color is treated as gray.
    pub achromatic_chroma: f64,
    /// Hue difference (degrees) within which chroma decides.
    pub hue_tolerance: f64,
    /// Chroma difference within which lightness decides.
    pub chroma_tolerance: f64,
    pub lightness_order: LightnessOrder,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            achromatic_chroma: DEFAULT_ACHROMATIC_CHROMA,
            hue_tolerance: DEFAULT_HUE_TOLERANCE,
            chroma_tolerance: DEFAULT_CHROMA_TOLERANCE,
            lightness_order: LightnessOrder::default(),
        }
    }
}

impl SortOptions {
    /// Reads options from a JSON object. Unknown lightness orders keep the default.
    pub fn from_json(params: &Value) -> Self {
        let p = Params::new(params);
        Self {
            achromatic_chroma: p.f64("achromatic_chroma", DEFAULT_ACHROMATIC_CHROMA),
            hue_tolerance: p.f64("hue_tolerance", DEFAULT_HUE_TOLERANCE),
            chroma_tolerance: p.f64("chroma_tolerance", DEFAULT_CHROMA_TOLERANCE),
            lightness_order: LightnessOrder::from_name(p.str("lightness_order", ""))
                .unwrap_or_default(),
        }
    }

    /// Hue used as the primary sort key: [`ACHROMATIC_HUE`] for grays and
    /// for non-finite hues, the raw hue otherwise.
    pub fn sort_hue(&self, lch: &Lch) -> f64 {
        if !lch.h.is_finite() || lch.c < self.achromatic_chroma {
            ACHROMATIC_HUE
        } else {
            lch.h
        }
    }
}

/// Compares two LCH colors with the banded hue/chroma/lightness rule.
pub fn compare_lch(a: &Lch, b: &Lch, options: &SortOptions) -> Ordering {
    let hue_a = options.sort_hue(a);
    let hue_b = options.sort_hue(b);
    if (hue_a - hue_b).abs() > options.hue_tolerance {
        return hue_a.total_cmp(&hue_b);
    }
    if (a.c - b.c).abs() > options.chroma_tolerance {
        return b.c.total_cmp(&a.c);
    }
    // Exact ties must stay Equal so the stable sort keeps input order.
    let by_lightness = match options.lightness_order {
        LightnessOrder::DarkFirst => a.l.partial_cmp(&b.l),
        LightnessOrder::LightFirst => b.l.partial_cmp(&a.l),
    };
    by_lightness.unwrap_or(Ordering::Equal)
}

/// [`compare_lch`] on the tracks' sort keys.
pub fn compare_tracks(a: &ProcessedTrack, b: &ProcessedTrack, options: &SortOptions) -> Ordering {
    compare_lch(&a.lch, &b.lch, options)
}

/// Sorts tracks into perceptual order. Equal tracks keep their input order.
pub fn sort_tracks(tracks: Vec<ProcessedTrack>, options: &SortOptions) -> Vec<ProcessedTrack> {
    stable_sort_by(tracks, |a, b| compare_tracks(a, b, options))
}

/// Stable top-down merge sort.
///
/// Unlike `slice::sort_by`, never panics when `compare` is not a total order;
/// the output is then some permutation of the input. Ties keep input order.
pub fn stable_sort_by<T, F>(items: Vec<T>, mut compare: F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    merge_sort(items, &mut compare)
}

fn merge_sort<T, F>(mut items: Vec<T>, compare: &mut F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    if items.len() <= 1 {
        return items;
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, compare);
    let right = merge_sort(right, compare);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare(l, r) == Ordering::Greater,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        merged.extend(next);
    }
    merged
}
