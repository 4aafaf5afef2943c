//! Color types and conversion functions for hueify.
//!
//! Provides the 8-bit [`Rgb`] color produced by the quantizer and the
//! perceptual chain used to order tracks: `Rgb` -> [`LinearRgb`] -> [`Xyz`]
//! -> [`Lab`] -> [`Lch`]. All conversions are pure functions and use `f64`
//! throughout. The CIE chain uses the D65 reference white.

use crate::error::ColorError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Neutral gray used whenever artwork cannot be loaded, decoded or quantized.
pub const FALLBACK_COLOR: Rgb = Rgb::new(128, 128, 128);

/// D65 reference white, normalized to `Y = 1`.
const WHITE_X: f64 = 0.950470;
const WHITE_Y: f64 = 1.0;
const WHITE_Z: f64 = 1.088830;

/// CIELAB companding constants: `(6/29)^3`, `3 * (6/29)^2` and `4/29`.
const LAB_EPSILON: f64 = 0.008856452;
const LAB_SLOPE: f64 = 0.12841855;
const LAB_OFFSET: f64 = 0.137931034;

/// 8-bit sRGB color. No alpha.
///
/// Serializes as a hex string `"#rrggbb"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Linear RGB color (gamma-decoded), components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// CIE 1931 XYZ tristimulus values relative to D65.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// CIELAB color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

/// CIELCh (cylindrical form of CIELAB).
///
/// Lightness is 0 (black) to 100 (white), chroma is a non-negative distance
/// from the neutral axis, hue is in degrees on `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lch {
    pub l: f64,
    pub c: f64,
    pub h: f64,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses a hex color string like "#ff00aa" or "ff00aa" (case insensitive).
    pub fn from_hex(hex: &str) -> Result<Rgb, ColorError> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ColorError::InvalidColor(format!(
                "expected 6 hex digits, got {:?}",
                hex
            )));
        }
        let channel = |range: std::ops::Range<usize>, name: &str| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|e| ColorError::InvalidColor(format!("invalid {name} component: {e}")))
        };
        Ok(Rgb {
            r: channel(0..2, "red")?,
            g: channel(2..4, "green")?,
            b: channel(4..6, "blue")?,
        })
    }

    /// Formats the color as `"#rrggbb"`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Rgb { r, g, b }
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgb::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl Lch {
    /// Sentinel LCH assigned to tracks whose artwork failed to yield a color.
    ///
    /// Zero chroma routes it through the comparator's achromatic path, the
    /// same as a genuinely unsaturated image.
    pub const FALLBACK: Lch = Lch {
        l: 50.0,
        c: 0.0,
        h: 0.0,
    };

    /// True when every component is finite.
    pub fn is_finite(&self) -> bool {
        self.l.is_finite() && self.c.is_finite() && self.h.is_finite()
    }
}

/// Applies inverse sRGB gamma to a single component in [0, 1].
fn srgb_component_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// CIELAB companding function `f(t)`.
fn lab_f(t: f64) -> f64 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        t / LAB_SLOPE + LAB_OFFSET
    }
}

/// Replaces a non-finite component with zero.
fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Converts 8-bit sRGB to linear RGB by removing the sRGB gamma.
pub fn rgb_to_linear(c: Rgb) -> LinearRgb {
    LinearRgb {
        r: srgb_component_to_linear(f64::from(c.r) / 255.0),
        g: srgb_component_to_linear(f64::from(c.g) / 255.0),
        b: srgb_component_to_linear(f64::from(c.b) / 255.0),
    }
}

/// Converts linear RGB to CIE XYZ (sRGB primaries, D65).
pub fn linear_to_xyz(c: LinearRgb) -> Xyz {
    Xyz {
        x: 0.4124564 * c.r + 0.3575761 * c.g + 0.1804375 * c.b,
        y: 0.2126729 * c.r + 0.7151522 * c.g + 0.0721750 * c.b,
        z: 0.0193339 * c.r + 0.1191920 * c.g + 0.9503041 * c.b,
    }
}

/// Converts CIE XYZ to CIELAB relative to the D65 white point.
pub fn xyz_to_lab(c: Xyz) -> Lab {
    let fx = lab_f(c.x / WHITE_X);
    let fy = lab_f(c.y / WHITE_Y);
    let fz = lab_f(c.z / WHITE_Z);
    Lab {
        l: 116.0 * fy - 16.0,
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

/// Converts CIELAB to CIELCh.
///
/// For achromatic input the hue is whatever `atan2` yields for the residual
/// `a`/`b` noise; it is meaningless but finite. Consumers decide how to treat
/// low-chroma colors.
pub fn lab_to_lch(c: Lab) -> Lch {
    let chroma = (c.a * c.a + c.b * c.b).sqrt();
    let hue = c.b.atan2(c.a).to_degrees().rem_euclid(360.0);
    Lch {
        l: c.l,
        c: chroma,
        h: hue,
    }
}

/// Normalizes any non-finite LCH component to `0`.
pub fn normalize_lch(c: Lch) -> Lch {
    Lch {
        l: finite_or_zero(c.l),
        c: finite_or_zero(c.c),
        h: finite_or_zero(c.h),
    }
}

/// Convenience: sRGB to CIELCh via sRGB -> linear -> XYZ -> Lab -> LCh.
///
/// The result never carries a NaN or infinite component.
pub fn rgb_to_lch(c: Rgb) -> Lch {
    normalize_lch(lab_to_lch(xyz_to_lab(linear_to_xyz(rgb_to_linear(c)))))
}
