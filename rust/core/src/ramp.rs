// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Metric color ramps
//!
//! A ramp is a piecewise-linear mapping from `[0, 1]` to colors, defined by ordered
//! stops. Metric values are normalised against the ramp's domain before lookup;
//! missing values (null or NaN) map to the ramp's null color.
//!
//! ```rust,ignore
//! use collage_core::{colorize, ColorRamp, RampName};
//!
//! let ramp = ColorRamp::builtin(RampName::Viridis).fit_domain(values.values());
//! let colors = colorize(&values, &ramp);
//! ```

use crate::color::Color;
use crate::error::{Error, Result};
use rustc_hash::FxHashMap;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Metric values keyed by entity id; `None` marks a missing value
pub type MetricValues = FxHashMap<String, Option<f64>>;

/// Gray used for missing values by every built-in ramp
pub const DEFAULT_NULL_COLOR: u32 = 0x808080;

/// A single ramp stop
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColorStop {
    pub value: f64,
    pub color: Color,
}

impl ColorStop {
    pub fn new(value: f64, color: Color) -> Self {
        Self { value, color }
    }
}

/// Piecewise-linear color ramp
///
/// Invariants (checked by [`ColorRamp::new`]): at least two stops, sorted ascending
/// by value, first stop at 0 and last stop at 1.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "RampDefinition", into = "RampDefinition")
)]
pub struct ColorRamp {
    name: String,
    stops: Vec<ColorStop>,
    domain: (f64, f64),
    null_color: Color,
}

impl ColorRamp {
    /// Create a validated ramp
    pub fn new(
        name: impl Into<String>,
        stops: Vec<ColorStop>,
        domain: (f64, f64),
        null_color: Color,
    ) -> Result<Self> {
        let name = name.into();

        if stops.len() < 2 {
            return Err(Error::InvalidRamp(format!(
                "'{}' needs at least two stops, got {}",
                name,
                stops.len()
            )));
        }
        if stops.iter().any(|s| !s.value.is_finite()) {
            return Err(Error::InvalidRamp(format!("'{}' has a non-finite stop", name)));
        }
        if stops.windows(2).any(|w| w[1].value < w[0].value) {
            return Err(Error::InvalidRamp(format!(
                "'{}' stops are not sorted ascending",
                name
            )));
        }
        if stops[0].value != 0.0 || stops[stops.len() - 1].value != 1.0 {
            return Err(Error::InvalidRamp(format!(
                "'{}' stops must start at 0 and end at 1",
                name
            )));
        }
        if !domain.0.is_finite() || !domain.1.is_finite() {
            return Err(Error::InvalidRamp(format!("'{}' has a non-finite domain", name)));
        }

        Ok(Self {
            name,
            stops,
            domain,
            null_color,
        })
    }

    /// One of the built-in palettes, with domain `[0, 1]`
    pub fn builtin(name: RampName) -> Self {
        let stops = name
            .stop_colors()
            .iter()
            .zip(BUILTIN_STOP_VALUES)
            .map(|(&hex, value)| ColorStop::new(value, Color::from_u32(hex)))
            .collect();

        Self {
            name: name.as_str().to_string(),
            stops,
            domain: (0.0, 1.0),
            null_color: Color::from_u32(DEFAULT_NULL_COLOR),
        }
    }

    /// Look up a built-in palette by its name
    pub fn by_name(name: &str) -> Result<Self> {
        name.parse::<RampName>().map(Self::builtin)
    }

    /// Same ramp with a different domain
    ///
    /// `min == max` is allowed and maps every value to the ramp midpoint.
    pub fn with_domain(mut self, min: f64, max: f64) -> Self {
        self.domain = (min, max);
        self
    }

    /// Same ramp with its domain set to the finite range of `values`.
    /// The domain is left unchanged when no finite value is present.
    pub fn fit_domain<'a, I>(self, values: I) -> Self
    where
        I: IntoIterator<Item = &'a Option<f64>>,
    {
        match value_range(values.into_iter().filter_map(|v| *v)) {
            Some((min, max)) => self.with_domain(min, max),
            None => self,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    #[inline]
    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    #[inline]
    pub fn null_color(&self) -> Color {
        self.null_color
    }

    /// Map a domain value to the ramp parameter.
    ///
    /// A collapsed domain (`min == max`) yields 0.5 for every value.
    #[inline]
    pub fn normalize(&self, value: f64) -> f64 {
        let (min, max) = self.domain;
        let range = max - min;
        if range == 0.0 {
            0.5
        } else {
            (value - min) / range
        }
    }

    /// Color at ramp parameter `t`, clamped to `[0, 1]` first
    pub fn interpolate(&self, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);

        for pair in self.stops.windows(2) {
            let (lo, hi) = (&pair[0], &pair[1]);
            if t >= lo.value && t <= hi.value {
                let width = hi.value - lo.value;
                let local = if width == 0.0 {
                    0.0
                } else {
                    (t - lo.value) / width
                };
                return lo.color.lerp(hi.color, local as f32);
            }
        }

        // NaN never matches an interval and takes the last color.
        self.stops[self.stops.len() - 1].color
    }

    /// Color for an optional metric value; null and NaN give the null color
    #[inline]
    pub fn color_for(&self, value: Option<f64>) -> Color {
        match value {
            Some(v) if !v.is_nan() => self.interpolate(self.normalize(v)),
            _ => self.null_color,
        }
    }
}

const BUILTIN_STOP_VALUES: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// Built-in palettes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum RampName {
    Viridis,
    Magma,
    Rdylgn,
    Blues,
    Spectral,
}

impl RampName {
    pub const ALL: [RampName; 5] = [
        RampName::Viridis,
        RampName::Magma,
        RampName::Rdylgn,
        RampName::Blues,
        RampName::Spectral,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Viridis => "viridis",
            Self::Magma => "magma",
            Self::Rdylgn => "rdylgn",
            Self::Blues => "blues",
            Self::Spectral => "spectral",
        }
    }

    /// Whether the palette diverges around its midpoint
    pub fn is_diverging(self) -> bool {
        matches!(self, Self::Rdylgn | Self::Spectral)
    }

    fn stop_colors(self) -> &'static [u32; 5] {
        match self {
            Self::Viridis => &[0x440154, 0x3b528b, 0x21918c, 0x5ec962, 0xfde725],
            Self::Magma => &[0x000004, 0x51127c, 0xb73779, 0xfb8861, 0xfcfdbf],
            Self::Rdylgn => &[0xd73027, 0xfc8d59, 0xffffbf, 0x91cf60, 0x1a9850],
            Self::Blues => &[0xf7fbff, 0xc6dbef, 0x6baed6, 0x2171b5, 0x08306b],
            Self::Spectral => &[0x9e0142, 0xf46d43, 0xffffbf, 0x66c2a5, 0x5e4fa2],
        }
    }
}

impl fmt::Display for RampName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RampName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownRamp(s.to_string()))
    }
}

/// Interpolate a color from `ramp` at normalised position `t`
#[inline]
pub fn interpolate(ramp: &ColorRamp, t: f64) -> Color {
    ramp.interpolate(t)
}

/// Map every metric value to a color using the ramp's domain
pub fn colorize(values: &MetricValues, ramp: &ColorRamp) -> FxHashMap<String, Color> {
    let mut colors = FxHashMap::default();
    colors.reserve(values.len());
    for (id, value) in values {
        colors.insert(id.clone(), ramp.color_for(*value));
    }
    colors
}

/// Finite min/max of an iterator of values
pub fn value_range<I>(values: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Ramp in the JSON shape used by the rendering host
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RampDefinition {
    pub name: String,
    pub stops: Vec<ColorStop>,
    pub domain: [f64; 2],
    pub null_color: Color,
}

impl TryFrom<RampDefinition> for ColorRamp {
    type Error = Error;

    fn try_from(def: RampDefinition) -> Result<Self> {
        ColorRamp::new(def.name, def.stops, (def.domain[0], def.domain[1]), def.null_color)
    }
}

impl From<ColorRamp> for RampDefinition {
    fn from(ramp: ColorRamp) -> Self {
        Self {
            name: ramp.name,
            stops: ramp.stops,
            domain: [ramp.domain.0, ramp.domain.1],
            null_color: ramp.null_color,
        }
    }
}
