// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! How much red, green and blue weight an orbit point contributes.
//!
//! The sampling engine only knows the `Coloring` trait: a cheap, pure
//! function of an orbit index and an orbit length, plus a gradient
//! lookup for the modes that color by angle.  It is called for nearly
//! every point of every accepted orbit, so `Gradient` pre-calculates
//! its interpolated colors into a lookup table.

use std::fmt;
use std::str::FromStr;

use image::RgbImage;

use crate::errors::{BuddhaError, Result};
use crate::planes::Pixel;

/// A color with floating point components, nominally in [0, 1].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rgb {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
}

impl Rgb {
    /// Black, the usual background.
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    /// Constructor.
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Rgb { r, g, b }
    }

    /// Interpolates between two colors in the RGB color space.
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        Rgb {
            r: self.r + t * (other.r - self.r),
            g: self.g + t * (other.g - self.g),
            b: self.b + t * (other.b - self.b),
        }
    }
}

/// Colors and interpolation stops for non-uniform gradients, with a
/// base color used for anything outside the gradient range.
#[derive(Debug, Clone)]
pub struct Gradient {
    colors: Vec<Rgb>,
    stops: Vec<f64>,
    base: Rgb,
    table: Vec<Rgb>,
}

impl Gradient {
    /// Builds a gradient from colors and their stop points.  The stops
    /// must be strictly ascending; they are rescaled to [0, 1].
    /// `granularity` is the number of interpolated colors to
    /// pre-calculate.
    pub fn new(colors: Vec<Rgb>, stops: Vec<f64>, base: Rgb, granularity: usize) -> Result<Self> {
        if colors.len() != stops.len() {
            return Err(BuddhaError::InvalidConfig(format!(
                "gradient has {} colors but {} stops",
                colors.len(),
                stops.len()
            )));
        }
        if colors.len() < 2 {
            return Err(BuddhaError::InvalidConfig(
                "a gradient needs at least two colors".to_string(),
            ));
        }
        if stops.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(BuddhaError::InvalidConfig(
                "gradient stops must be in ascending order".to_string(),
            ));
        }
        if granularity == 0 {
            return Err(BuddhaError::InvalidConfig(
                "gradient granularity must be positive".to_string(),
            ));
        }

        // Anchor the gradient at 0 and scale the last stop to 1.
        let first = stops[0];
        let last = stops[stops.len() - 1] - first;
        let stops: Vec<f64> = stops.iter().map(|s| (s - first) / last).collect();

        let mut gradient = Gradient {
            colors,
            stops,
            base,
            table: Vec::with_capacity(granularity),
        };
        gradient.table = (0..granularity)
            .map(|i| gradient.interpolate(i as f64 / granularity as f64))
            .collect();
        Ok(gradient)
    }

    /// A gradient whose colors are spread evenly over [0, 1].
    pub fn uniform(colors: Vec<Rgb>, base: Rgb, granularity: usize) -> Result<Self> {
        let n = colors.len();
        let stops = (0..n)
            .map(|i| i as f64 / (n.max(2) - 1) as f64)
            .collect();
        Gradient::new(colors, stops, base, granularity)
    }

    /// Number of colors in the gradient.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Never true for a constructed gradient.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// The gradient's colors, in stop order.
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// The color for values outside the gradient range.
    pub fn base(&self) -> Rgb {
        self.base
    }

    /// The pre-calculated color for `t`.  Values outside [0, 1), NaN
    /// included, get the base color.
    #[inline]
    pub fn lookup(&self, t: f64) -> Rgb {
        if !(t >= 0.0 && t < 1.0) {
            return self.base;
        }
        let index = (t * self.table.len() as f64) as usize;
        self.table.get(index).cloned().unwrap_or(self.base)
    }

    // Finds the two stops nearest t and blends their colors.
    fn interpolate(&self, t: f64) -> Rgb {
        let upper_index = match self.stops.iter().position(|&stop| stop > t) {
            Some(0) | None => return self.base,
            Some(i) => i,
        };
        let lower_index = upper_index - 1;
        let (lower, upper) = (self.stops[lower_index], self.stops[upper_index]);
        let relative = (t - lower) / (upper - lower);
        self.colors[lower_index].lerp(self.colors[upper_index], relative)
    }
}

/// How orbits are colored, which also decides how they are registered
/// into the histogram.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColoringMode {
    /// One color per orbit, cycled through the gradient colors by
    /// orbit length.
    Modulo,
    /// One color per orbit, chosen by which range the orbit length falls
    /// in.
    IterationCount,
    /// Each point is colored by its position along the orbit.
    OrbitLength,
    /// Each point is colored by the angle to the next point.
    VectorField,
    /// Consecutive points are joined by lines in a single color.
    Path,
    /// Each point takes its color from a reference image.
    Image,
}

impl ColoringMode {
    /// Every coloring mode.
    pub const ALL: [ColoringMode; 6] = [
        ColoringMode::Modulo,
        ColoringMode::IterationCount,
        ColoringMode::OrbitLength,
        ColoringMode::VectorField,
        ColoringMode::Path,
        ColoringMode::Image,
    ];

    /// The selector name of the mode.
    pub fn name(self) -> &'static str {
        match self {
            ColoringMode::Modulo => "modulo",
            ColoringMode::IterationCount => "iteration",
            ColoringMode::OrbitLength => "orbit",
            ColoringMode::VectorField => "vector",
            ColoringMode::Path => "path",
            ColoringMode::Image => "image",
        }
    }
}

impl fmt::Display for ColoringMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColoringMode {
    type Err = BuddhaError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.to_lowercase();
        ColoringMode::ALL
            .iter()
            .find(|mode| mode.name() == wanted)
            .cloned()
            .ok_or_else(|| BuddhaError::UnknownSelector("coloring mode", s.to_string()))
    }
}

/// The coloring policy consumed by the sampling engine.  Must be pure
/// and cheap: it is called from every worker for every orbit point.
pub trait Coloring: Sync {
    /// The registration mode this coloring asks for.
    fn mode(&self) -> ColoringMode;

    /// The color of point `index` of an orbit, or of a whole orbit of
    /// length `index`, relative to `length`.
    fn get(&self, index: usize, length: usize) -> Rgb;

    /// The gradient color for a ratio in [0, 1).
    fn lookup(&self, t: f64) -> Rgb;
}

/// A gradient-based coloring policy.
#[derive(Debug, Clone)]
pub struct Palette {
    mode: ColoringMode,
    gradient: Gradient,
    ranges: Vec<f64>,
}

impl Palette {
    /// Iteration-count coloring needs one range threshold per gradient
    /// color; the other modes ignore `ranges`.
    pub fn new(mode: ColoringMode, gradient: Gradient, ranges: Vec<f64>) -> Result<Self> {
        if mode == ColoringMode::IterationCount && ranges.len() != gradient.len() {
            return Err(BuddhaError::InvalidConfig(format!(
                "number of colors ({}) and ranges ({}) mismatch",
                gradient.len(),
                ranges.len()
            )));
        }
        Ok(Palette {
            mode,
            gradient,
            ranges,
        })
    }

    fn modulo(&self, i: usize) -> Rgb {
        if i < 10 {
            return self.gradient.base();
        }
        let colors = self.gradient.colors();
        colors[i % colors.len()]
    }

    fn iteration(&self, i: usize, length: usize) -> Rgb {
        let ratio = i as f64 / length as f64;
        match self.ranges.iter().rposition(|&range| ratio >= range) {
            Some(key) => self.gradient.colors()[key],
            None => self.gradient.base(),
        }
    }
}

impl Coloring for Palette {
    fn mode(&self) -> ColoringMode {
        self.mode
    }

    #[inline]
    fn get(&self, index: usize, length: usize) -> Rgb {
        match self.mode {
            ColoringMode::Modulo => self.modulo(index),
            ColoringMode::IterationCount => self.iteration(index, length),
            _ => self.gradient.lookup(index as f64 / length as f64),
        }
    }

    #[inline]
    fn lookup(&self, t: f64) -> Rgb {
        self.gradient.lookup(t)
    }
}

/// The color at a pixel of the reference image, wrapping around its
/// edges.
pub fn reference_color(reference: &RgbImage, pixel: Pixel) -> Rgb {
    let (w, h) = reference.dimensions();
    if w == 0 || h == 0 {
        return Rgb::BLACK;
    }
    let p = reference.get_pixel(pixel.0 as u32 % w, pixel.1 as u32 % h);
    Rgb::new(
        f64::from(p[0]) / 255.0,
        f64::from(p[1]) / 255.0,
        f64::from(p[2]) / 255.0,
    )
}
