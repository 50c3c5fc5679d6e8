// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tone mapping: turning accumulated histogram weights into an image.
//! Each channel is scaled by its own maximum after passing through a
//! scaling function, which is how the faint orbits stay visible next
//! to the bright ones.

use std::fmt;
use std::str::FromStr;

use image::{Rgb, RgbImage};

use crate::errors::{BuddhaError, Result};
use crate::histogram::{Channel, Histogram};

/// A color scaling function.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Scaling {
    /// 1 - e^(-f·x)
    Exp,
    /// ln(1 + f·x)
    Log,
    /// √(f·x)
    Sqrt,
    /// x
    Lin,
}

impl Scaling {
    /// Every scaling function.
    pub const ALL: [Scaling; 4] = [Scaling::Exp, Scaling::Log, Scaling::Sqrt, Scaling::Lin];

    /// The selector name of the scaling function.
    pub fn name(self) -> &'static str {
        match self {
            Scaling::Exp => "exp",
            Scaling::Log => "log",
            Scaling::Sqrt => "sqrt",
            Scaling::Lin => "lin",
        }
    }

    /// Applies the function to `x`.
    pub fn apply(self, x: f64, factor: f64) -> f64 {
        match self {
            Scaling::Exp => 1.0 - (-factor * x).exp(),
            Scaling::Log => (factor * x).ln_1p(),
            Scaling::Sqrt => (factor * x).sqrt(),
            Scaling::Lin => x,
        }
    }
}

impl fmt::Display for Scaling {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scaling {
    type Err = BuddhaError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.to_lowercase();
        Scaling::ALL
            .iter()
            .find(|scaling| scaling.name() == wanted)
            .cloned()
            .ok_or_else(|| BuddhaError::UnknownSelector("scaling function", s.to_string()))
    }
}

/// Maps one histogram value onto 0..=255 given the channel maximum.
struct Tone {
    scaling: Scaling,
    factor: f64,
    scale: f64,
}

impl Tone {
    fn new(scaling: Scaling, factor: f64, exposure: f64, max: f64) -> Self {
        let top = scaling.apply(max, factor);
        let scale = if top > 0.0 && top.is_finite() {
            255.0 * exposure / top
        } else {
            0.0
        };
        Tone {
            scaling,
            factor,
            scale,
        }
    }

    fn value(&self, v: f64) -> u8 {
        let value = self.scaling.apply(v, self.factor) * self.scale;
        if value.is_nan() {
            return 0;
        }
        value.max(0.0).min(255.0) as u8
    }
}

/// The scaling factor for a render that registered `pixel_ratio`
/// pixels per orbit attempt at `tries` attempts per pixel.  Denser
/// renders get a gentler curve.
pub fn derived_factor(pixel_ratio: f64, tries: f64) -> f64 {
    if tries.is_nan() || tries <= 0.0 {
        return 0.0;
    }
    pixel_ratio / (10_000.0 * tries)
}

/// Renders `histogram` with `scaling`: each channel value becomes
/// min(F(v)·255·exposure / F(max), 255).  An all-zero channel stays
/// black.
pub fn plot(histogram: &Histogram, scaling: Scaling, factor: f64, exposure: f64) -> RgbImage {
    let (width, height) = histogram.dimensions();
    let (rmax, gmax, bmax) = histogram.max();
    let r = Tone::new(scaling, factor, exposure, rmax);
    let g = Tone::new(scaling, factor, exposure, gmax);
    let b = Tone::new(scaling, factor, exposure, bmax);
    let (rs, gs, bs) = (
        histogram.r.cells(),
        histogram.g.cells(),
        histogram.b.cells(),
    );

    RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let offset = y as usize * width + x as usize;
        Rgb([r.value(rs[offset]), g.value(gs[offset]), b.value(bs[offset])])
    })
}

/// Renders a single channel, such as the importance map, in grey.
pub fn plot_channel(channel: &Channel, scaling: Scaling, factor: f64) -> RgbImage {
    let (width, height) = channel.dimensions();
    let tone = Tone::new(scaling, factor, 1.0, channel.max());
    let cells = channel.cells();
    RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let v = tone.value(cells[y as usize * width + x as usize]);
        Rgb([v, v, v])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coloring;

    #[test]
    fn scaling_functions() {
        assert_eq!(Scaling::Lin.apply(3.0, 100.0), 3.0);
        assert_eq!(Scaling::Sqrt.apply(4.0, 4.0), 4.0);
        assert_eq!(Scaling::Log.apply(0.0, 2.0), 0.0);
        assert!((Scaling::Exp.apply(1.0, 1.0) - (1.0 - (-1.0f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn factor_follows_pixels_per_try() {
        assert_eq!(derived_factor(30.0, 1.0), 0.003);
        assert_eq!(derived_factor(30.0, 3.0), 0.001);
        assert_eq!(derived_factor(30.0, 0.0), 0.0);
        assert_eq!(derived_factor(0.0, 2.0), 0.0);
    }

    #[test]
    fn scaling_parses_by_name() {
        assert_eq!("SQRT".parse::<Scaling>().unwrap(), Scaling::Sqrt);
        for scaling in Scaling::ALL.iter() {
            assert_eq!(scaling.to_string().parse::<Scaling>().unwrap(), *scaling);
        }
        assert!("cube".parse::<Scaling>().is_err());
    }

    #[test]
    fn brightest_cell_is_saturated() {
        let mut histogram = Histogram::new(4, 2);
        histogram.increase(1, coloring::Rgb::new(2.0, 1.0, 0.0));
        histogram.increase(6, coloring::Rgb::new(1.0, 1.0, 0.0));
        let image = plot(&histogram, Scaling::Lin, 1.0, 1.0);

        assert_eq!(image.dimensions(), (4, 2));
        assert_eq!(image.get_pixel(1, 0), &Rgb([255, 255, 0]));
        assert_eq!(image.get_pixel(2, 1), &Rgb([127, 255, 0]));
        assert_eq!(image.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn exposure_is_capped() {
        let mut histogram = Histogram::new(2, 1);
        histogram.increase(0, coloring::Rgb::new(1.0, 1.0, 1.0));
        histogram.increase(1, coloring::Rgb::new(4.0, 4.0, 4.0));
        let image = plot(&histogram, Scaling::Sqrt, 1.0, 10.0);
        assert_eq!(image.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(image.get_pixel(1, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn empty_histogram_plots_black() {
        let image = plot(&Histogram::new(3, 3), Scaling::Log, 1.0, 1.0);
        assert!(image.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn channel_plots_grey() {
        let mut channel = Channel::new(2, 2);
        channel.add(3, 0.5);
        let image = plot_channel(&channel, Scaling::Lin, 1.0);
        assert_eq!(image.get_pixel(1, 1), &Rgb([255, 255, 255]));
        assert_eq!(image.get_pixel(0, 1), &Rgb([0, 0, 0]));
    }
}
