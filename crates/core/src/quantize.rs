//! Median-cut color quantization over a reduced-precision pixel histogram.
//!
//! Pixels are bucketed into a 5-bit-per-channel histogram (32768 cells).
//! Boxes over that histogram are split at the weighted median of their
//! longest axis, first by population until three quarters of the requested
//! colors exist, then by population times volume so that large sparse
//! regions of color space also get represented. Each final box contributes
//! its population-weighted mean color.
//!
//! The returned swatches are ordered by population, most dominant first.

use crate::color::Rgb;
use crate::error::ColorError;

/// Bits of precision kept per channel in the histogram.
const SIGNIFICANT_BITS: u32 = 5;
const CHANNEL_SHIFT: u32 = 8 - SIGNIFICANT_BITS;
const CELLS_PER_AXIS: usize = 1 << SIGNIFICANT_BITS;
const HISTOGRAM_SIZE: usize = 1 << (3 * SIGNIFICANT_BITS);
/// Width of one histogram cell in 8-bit channel units.
const CELL_WIDTH: f64 = (1 << CHANNEL_SHIFT) as f64;
/// Share of the target colors produced by population-only splitting.
const POPULATION_PHASE_FRACTION: f64 = 0.75;
/// Pixels with alpha below this are ignored.
const MIN_ALPHA: u8 = 125;
/// Pixels with all channels above this are treated as background white.
const WHITE_CUTOFF: u8 = 250;

/// Channel layout of a raw pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    /// Three bytes per pixel.
    Rgb,
    /// Four bytes per pixel; alpha is the fourth byte.
    Rgba,
}

impl PixelLayout {
    fn stride(self) -> usize {
        match self {
            PixelLayout::Rgb => 3,
            PixelLayout::Rgba => 4,
        }
    }
}

/// One quantized color and the number of sampled pixels it represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swatch {
    pub color: Rgb,
    pub population: u64,
}

/// Reduced-precision color histogram.
struct Histogram {
    cells: Vec<u64>,
    total: u64,
}

impl Histogram {
    fn from_pixels(pixels: &[u8], layout: PixelLayout, quality: usize) -> Self {
        let stride = layout.stride();
        let mut cells = vec![0u64; HISTOGRAM_SIZE];
        let mut total = 0u64;

        for px in pixels.chunks_exact(stride).step_by(quality.max(1)) {
            if layout == PixelLayout::Rgba && px[3] < MIN_ALPHA {
                continue;
            }
            let (r, g, b) = (px[0], px[1], px[2]);
            if r > WHITE_CUTOFF && g > WHITE_CUTOFF && b > WHITE_CUTOFF {
                continue;
            }
            let idx = cell_index(
                usize::from(r >> CHANNEL_SHIFT),
                usize::from(g >> CHANNEL_SHIFT),
                usize::from(b >> CHANNEL_SHIFT),
            );
            cells[idx] += 1;
            total += 1;
        }

        Self { cells, total }
    }

    fn at(&self, r: usize, g: usize, b: usize) -> u64 {
        self.cells[cell_index(r, g, b)]
    }
}

fn cell_index(r: usize, g: usize, b: usize) -> usize {
    (r << (2 * SIGNIFICANT_BITS)) | (g << SIGNIFICANT_BITS) | b
}

/// An axis-aligned box of histogram cells, bounds inclusive.
#[derive(Debug, Clone, Copy)]
struct ColorBox {
    lo: [usize; 3],
    hi: [usize; 3],
    population: u64,
}

impl ColorBox {
    /// Builds the tightest box around every populated cell inside `lo..=hi`.
    ///
    /// Returns `None` if no cell in the range is populated.
    fn fitted(hist: &Histogram, lo: [usize; 3], hi: [usize; 3]) -> Option<Self> {
        let mut min = [CELLS_PER_AXIS; 3];
        let mut max = [0usize; 3];
        let mut population = 0u64;

        for r in lo[0]..=hi[0] {
            for g in lo[1]..=hi[1] {
                for b in lo[2]..=hi[2] {
                    let count = hist.at(r, g, b);
                    if count == 0 {
                        continue;
                    }
                    population += count;
                    for (axis, v) in [r, g, b].into_iter().enumerate() {
                        min[axis] = min[axis].min(v);
                        max[axis] = max[axis].max(v);
                    }
                }
            }
        }

        (population > 0).then_some(Self {
            lo: min,
            hi: max,
            population,
        })
    }

    fn volume(&self) -> u64 {
        (0..3).map(|a| (self.hi[a] - self.lo[a] + 1) as u64).product()
    }

    fn longest_axis(&self) -> usize {
        let extent = |a: usize| self.hi[a] - self.lo[a];
        let mut axis = 0;
        for a in 1..3 {
            if extent(a) > extent(axis) {
                axis = a;
            }
        }
        axis
    }

    /// Population of the slab of this box where `axis == value`.
    fn slab_population(&self, hist: &Histogram, axis: usize, value: usize) -> u64 {
        let mut lo = self.lo;
        let mut hi = self.hi;
        lo[axis] = value;
        hi[axis] = value;
        let mut sum = 0;
        for r in lo[0]..=hi[0] {
            for g in lo[1]..=hi[1] {
                for b in lo[2]..=hi[2] {
                    sum += hist.at(r, g, b);
                }
            }
        }
        sum
    }

    /// Splits along the longest axis near the weighted median.
    ///
    /// The cut is pushed toward the middle of the larger side of the median
    /// so that a dense cluster at one edge is not sliced in half. Returns
    /// `None` when the box cannot be split into two populated halves.
    fn split(&self, hist: &Histogram) -> Option<(ColorBox, ColorBox)> {
        let axis = self.longest_axis();
        let (lo, hi) = (self.lo[axis], self.hi[axis]);
        if lo == hi {
            return None;
        }

        // cumulative[i] = population with axis value <= lo + i
        let mut cumulative = Vec::with_capacity(hi - lo + 1);
        let mut running = 0u64;
        for v in lo..=hi {
            running += self.slab_population(hist, axis, v);
            cumulative.push(running);
        }
        let total = running;

        let median = lo + cumulative.iter().position(|&c| c * 2 > total)?;
        let left = median - lo;
        let right = hi - median;
        let mut cut = if left <= right {
            (median + right / 2).min(hi - 1)
        } else {
            (median - 1 - left / 2).max(lo)
        };

        // Both halves must keep at least one pixel.
        while cut < hi && cumulative[cut - lo] == 0 {
            cut += 1;
        }
        while cut > lo && cumulative[cut - lo] == total {
            cut -= 1;
        }
        if cut >= hi || cumulative[cut - lo] == 0 || cumulative[cut - lo] == total {
            return None;
        }

        let mut left_hi = self.hi;
        left_hi[axis] = cut;
        let mut right_lo = self.lo;
        right_lo[axis] = cut + 1;

        let first = ColorBox::fitted(hist, self.lo, left_hi)?;
        let second = ColorBox::fitted(hist, right_lo, self.hi)?;
        Some((first, second))
    }

    /// Population-weighted mean color, sampled at cell centers.
    fn average(&self, hist: &Histogram) -> Rgb {
        let mut sums = [0f64; 3];
        let mut weight = 0f64;
        for r in self.lo[0]..=self.hi[0] {
            for g in self.lo[1]..=self.hi[1] {
                for b in self.lo[2]..=self.hi[2] {
                    let count = hist.at(r, g, b) as f64;
                    if count == 0.0 {
                        continue;
                    }
                    weight += count;
                    for (axis, v) in [r, g, b].into_iter().enumerate() {
                        sums[axis] += count * (v as f64 + 0.5) * CELL_WIDTH;
                    }
                }
            }
        }
        let channel = |sum: f64| -> u8 {
            if weight == 0.0 {
                0
            } else {
                (sum / weight).round().clamp(0.0, 255.0) as u8
            }
        };
        Rgb::new(channel(sums[0]), channel(sums[1]), channel(sums[2]))
    }
}

/// Repeatedly splits the highest-priority splittable box until `target`
/// boxes exist or nothing more can be split.
fn split_until<P>(boxes: &mut Vec<ColorBox>, hist: &Histogram, target: usize, priority: P)
where
    P: Fn(&ColorBox) -> u64,
{
    let mut unsplittable = vec![false; boxes.len()];
    while boxes.len() < target {
        let candidate = boxes
            .iter()
            .enumerate()
            .filter(|(i, _)| !unsplittable[*i])
            .max_by_key(|(_, b)| priority(b))
            .map(|(i, _)| i);
        let Some(idx) = candidate else {
            break;
        };
        match boxes[idx].split(hist) {
            Some((first, second)) => {
                boxes[idx] = first;
                boxes.push(second);
                unsplittable.push(false);
            }
            None => unsplittable[idx] = true,
        }
    }
}

/// Quantizes a raw pixel buffer into at most `max_colors` swatches.
///
/// `quality` is the pixel sampling stride: 1 visits every pixel, 10 every
/// tenth. Transparent and near-white pixels are skipped. Swatches are sorted
/// by population, largest first; equal populations keep split order.
///
/// Returns `ColorError::InvalidConfig` if `max_colors` is zero and
/// `ColorError::EmptyImage` if no pixel survives filtering.
pub fn quantize(
    pixels: &[u8],
    layout: PixelLayout,
    quality: usize,
    max_colors: usize,
) -> Result<Vec<Swatch>, ColorError> {
    if max_colors == 0 {
        return Err(ColorError::InvalidConfig(
            "max_colors must be at least 1".to_string(),
        ));
    }

    let hist = Histogram::from_pixels(pixels, layout, quality);
    if hist.total == 0 {
        return Err(ColorError::EmptyImage);
    }

    let full = ColorBox::fitted(&hist, [0; 3], [CELLS_PER_AXIS - 1; 3])
        .ok_or(ColorError::EmptyImage)?;
    let mut boxes = vec![full];

    let population_target = ((max_colors as f64) * POPULATION_PHASE_FRACTION).ceil() as usize;
    split_until(&mut boxes, &hist, population_target, |b| b.population);
    split_until(&mut boxes, &hist, max_colors, |b| {
        b.population.saturating_mul(b.volume())
    });

    let mut swatches: Vec<Swatch> = boxes
        .iter()
        .map(|b| Swatch {
            color: b.average(&hist),
            population: b.population,
        })
        .collect();
    swatches.sort_by(|a, b| b.population.cmp(&a.population));
    Ok(swatches)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(color: Rgb, count: usize) -> Vec<u8> {
        (0..count).flat_map(|_| [color.r, color.g, color.b]).collect()
    }

    fn channel_close(a: u8, b: u8) -> bool {
        (i16::from(a) - i16::from(b)).abs() <= CELL_WIDTH as i16
    }

    fn color_close(a: Rgb, b: Rgb) -> bool {
        channel_close(a.r, b.r) && channel_close(a.g, b.g) && channel_close(a.b, b.b)
    }

    #[test]
    fn zero_max_colors_is_rejected() {
        let pixels = solid(Rgb::new(10, 20, 30), 4);
        let result = quantize(&pixels, PixelLayout::Rgb, 1, 0);
        assert!(matches!(result, Err(ColorError::InvalidConfig(_))));
    }

    #[test]
    fn empty_buffer_is_empty_image() {
        let result = quantize(&[], PixelLayout::Rgb, 1, 5);
        assert!(matches!(result, Err(ColorError::EmptyImage)));
    }

    #[test]
    fn all_white_is_empty_image() {
        let pixels = solid(Rgb::new(255, 255, 255), 64);
        let result = quantize(&pixels, PixelLayout::Rgb, 1, 5);
        assert!(matches!(result, Err(ColorError::EmptyImage)));
    }

    #[test]
    fn transparent_pixels_are_ignored() {
        let mut pixels = Vec::new();
        for _ in 0..50 {
            pixels.extend_from_slice(&[255, 0, 0, 0]);
        }
        for _ in 0..10 {
            pixels.extend_from_slice(&[0, 0, 200, 255]);
        }
        let swatches = quantize(&pixels, PixelLayout::Rgba, 1, 5).unwrap();
        assert_eq!(swatches.len(), 1);
        assert!(color_close(swatches[0].color, Rgb::new(0, 0, 200)));
    }

    #[test]
    fn solid_image_yields_single_swatch_of_that_color() {
        let color = Rgb::new(200, 40, 90);
        let swatches = quantize(&solid(color, 100), PixelLayout::Rgb, 1, 5).unwrap();
        assert_eq!(swatches.len(), 1, "one populated cell cannot be split");
        assert!(
            color_close(swatches[0].color, color),
            "got {:?}",
            swatches[0].color
        );
        assert_eq!(swatches[0].population, 100);
    }

    #[test]
    fn majority_color_comes_first() {
        let mut pixels = solid(Rgb::new(20, 60, 220), 30);
        pixels.extend(solid(Rgb::new(230, 30, 30), 70));
        let swatches = quantize(&pixels, PixelLayout::Rgb, 1, 5).unwrap();
        assert!(swatches.len() >= 2);
        assert!(color_close(swatches[0].color, Rgb::new(230, 30, 30)));
        assert_eq!(swatches[0].population, 70);
        assert!(color_close(swatches[1].color, Rgb::new(20, 60, 220)));
    }

    #[test]
    fn swatches_are_sorted_by_population() {
        let mut pixels = solid(Rgb::new(10, 200, 10), 10);
        pixels.extend(solid(Rgb::new(200, 10, 10), 40));
        pixels.extend(solid(Rgb::new(10, 10, 200), 25));
        pixels.extend(solid(Rgb::new(200, 200, 10), 5));
        let swatches = quantize(&pixels, PixelLayout::Rgb, 1, 8).unwrap();
        let populations: Vec<u64> = swatches.iter().map(|s| s.population).collect();
        let mut sorted = populations.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(populations, sorted);
        assert_eq!(populations.iter().sum::<u64>(), 80);
    }

    #[test]
    fn quality_stride_samples_fewer_pixels() {
        let pixels = solid(Rgb::new(90, 90, 30), 100);
        let every = quantize(&pixels, PixelLayout::Rgb, 1, 3).unwrap();
        let tenth = quantize(&pixels, PixelLayout::Rgb, 10, 3).unwrap();
        assert_eq!(every[0].population, 100);
        assert_eq!(tenth[0].population, 10);
    }

    #[test]
    fn trailing_partial_pixel_is_ignored() {
        let mut pixels = solid(Rgb::new(50, 100, 150), 3);
        pixels.push(42);
        let swatches = quantize(&pixels, PixelLayout::Rgb, 1, 2).unwrap();
        assert_eq!(swatches[0].population, 3);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn palette_respects_bound_and_accounts_for_every_sample(
                pixels in prop::collection::vec(any::<u8>(), 3..600),
                max_colors in 1usize..12,
            ) {
                match quantize(&pixels, PixelLayout::Rgb, 1, max_colors) {
                    Ok(swatches) => {
                        prop_assert!(!swatches.is_empty());
                        prop_assert!(swatches.len() <= max_colors);
                        let kept = pixels
                            .chunks_exact(3)
                            .filter(|p| p.iter().any(|&v| v <= WHITE_CUTOFF))
                            .count() as u64;
                        let total: u64 = swatches.iter().map(|s| s.population).sum();
                        prop_assert_eq!(total, kept);
                        for pair in swatches.windows(2) {
                            prop_assert!(pair[0].population >= pair[1].population);
                        }
                    }
                    Err(ColorError::EmptyImage) => {}
                    Err(other) => prop_assert!(false, "unexpected error {other}"),
                }
            }
        }
    }
}
