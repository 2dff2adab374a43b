//! Colors in configs and color maps for colorizing scalar fields.

use enterpolation::{linear::ConstEquidistantLinear, Curve};
use itertools::izip;
use palette::{FromColor, IntoColor, Oklab, Srgb};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

use crate::{
    buffer::Rgba,
    config::{Bounds, Param, ParamKind},
};

/// An 8-bit sRGB color as used in effect configs.
///
/// Deserializes from a hex string (`"#rrggbb"` or `"#rgb"`)
/// or an `[r, g, b]` triple, and serializes as a `"#rrggbb"` string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub Srgb<u8>);

impl Rgb {
    /// Create a color from its channels.
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self(Srgb::new(red, green, blue))
    }

    /// Red channel.
    #[inline]
    pub fn red(self) -> u8 {
        self.0.red
    }

    /// Green channel.
    #[inline]
    pub fn green(self) -> u8 {
        self.0.green
    }

    /// Blue channel.
    #[inline]
    pub fn blue(self) -> u8 {
        self.0.blue
    }

    /// The color as an opaque pixel.
    #[inline]
    pub fn opaque(self) -> Rgba {
        self.with_alpha(u8::MAX)
    }

    /// The color as a pixel with the given alpha.
    #[inline]
    pub fn with_alpha(self, alpha: u8) -> Rgba {
        [self.red(), self.green(), self.blue(), alpha]
    }

    /// Interpolate linearly towards `other`,
    /// truncating each channel towards zero.
    ///
    /// `t` is clamped to `[0, 1]`.
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let ch = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).floor() as u8;
        Rgb::new(
            ch(self.red(), other.red()),
            ch(self.green(), other.green()),
            ch(self.blue(), other.blue()),
        )
    }

    /// The color as floating point sRGB.
    pub fn into_f32(self) -> Srgb<f32> {
        self.0.into_format()
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

/// Error parsing a hex color.
#[derive(Debug, Error)]
#[error("invalid hex color {input:?}")]
pub struct HexColorError {
    input: String,
    #[source]
    source: palette::rgb::FromHexError,
}

impl FromStr for Rgb {
    type Err = HexColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<Srgb<u8>>()
            .map(Rgb)
            .map_err(|source| HexColorError {
                input: s.to_string(),
                source,
            })
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}",
            self.red(),
            self.green(),
            self.blue()
        )
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RgbRepr {
    Hex(String),
    Channels([u8; 3]),
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RgbRepr::deserialize(deserializer)? {
            RgbRepr::Hex(s) => s.parse().map_err(de::Error::custom),
            RgbRepr::Channels(c) => Ok(Rgb::from(c)),
        }
    }
}

impl Param for Rgb {
    const KIND: ParamKind = ParamKind::Color;

    fn clamp_to(self, _bounds: &Bounds<Self>) -> Self {
        self
    }

    fn distance(&self, other: &Self) -> f64 {
        izip!(
            [self.red(), self.green(), self.blue()],
            [other.red(), other.green(), other.blue()]
        )
        .map(|(a, b)| a.abs_diff(b))
        .max()
        .unwrap_or(0) as f64
    }

    fn as_f64(&self) -> f64 {
        f64::NAN
    }
}

//
// color maps
//

/// A lookup table mapping a parameter in `[0, 1)` to a color.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorMap {
    lut: Vec<Rgb>,
}

impl ColorMap {
    /// Create a color map of `size` entries from an [`enterpolation`] curve
    /// interpolating [`palette`] colors.
    pub fn from_curve<C, Color>(size: usize, curve: C) -> Self
    where
        Color: IntoColor<Srgb>,
        C: Curve<f32, Output = Color>,
    {
        let as_u8 = |channel: f32| (u8::MAX as f32 * channel.clamp(0.0, 1.0)).round() as u8;
        let lut = curve
            .take(size.max(1))
            .map(|color| {
                let c: Srgb = color.into_color();
                Rgb::new(as_u8(c.red), as_u8(c.green), as_u8(c.blue))
            })
            .collect();
        Self { lut }
    }

    /// Create a color map of `size` entries from a function
    /// taking the normalized index `i / size` to a color.
    pub fn from_fn(size: usize, f: impl Fn(f64) -> Rgb) -> Self {
        let size = size.max(1);
        Self {
            lut: (0..size).map(|i| f(i as f64 / size as f64)).collect(),
        }
    }

    /// Smooth gradient through equally spaced `colors`.
    ///
    /// Interpolating in Oklab gives perceptually even steps.
    pub fn gradient<const COUNT: usize>(size: usize, colors: [Rgb; COUNT]) -> Self {
        let stops = colors.map(|c| Oklab::from_color(c.into_f32()));
        Self::from_curve(size, ConstEquidistantLinear::equidistant_unchecked(stops))
    }

    /// Two-segment piecewise linear palette through `colors`
    /// with channels truncated, indexed by `i / size`.
    pub fn piecewise(size: usize, colors: [Rgb; 3]) -> Self {
        let [c1, c2, c3] = colors;
        Self::from_fn(size, |t| {
            if t < 0.5 {
                c1.lerp(c2, t * 2.0)
            } else {
                c2.lerp(c3, (t - 0.5) * 2.0)
            }
        })
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.lut.len()
    }

    /// Always false; color maps have at least one entry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lut.is_empty()
    }

    /// Entry at `index`, wrapped into range.
    #[inline]
    pub fn get(&self, index: usize) -> Rgb {
        self.lut[index % self.lut.len()]
    }

    /// Entry at a fractional position, wrapped into range
    /// (negative positions wrap from the end).
    #[inline]
    pub fn wrapped(&self, position: f64) -> Rgb {
        let len = self.lut.len() as f64;
        let idx = position.rem_euclid(len).floor() as usize;
        self.get(idx)
    }

    /// Entry at a normalized parameter, clamped to `[0, 1]`.
    pub fn sample(&self, t: f64) -> Rgb {
        let last = self.lut.len() - 1;
        let idx = (t.clamp(0.0, 1.0) * last as f64).round() as usize;
        self.lut[idx]
    }
}
