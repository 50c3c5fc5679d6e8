// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Accumulation buffers for orbit weight.  A `Channel` is one dense
//! width × height plane of non-negative weights stored row by row; a
//! `Histogram` bundles the red, green and blue channels.  Weight is only
//! ever added, never taken away, until the buffers are cleared.

use itertools::izip;

use crate::coloring::Rgb;
use crate::errors::{BuddhaError, Result};
use crate::planes::Pixel;

/// One color channel of accumulated orbit weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    width: usize,
    height: usize,
    cells: Vec<f64>,
}

impl Channel {
    /// An empty channel for an image of `width` × `height`.
    pub fn new(width: usize, height: usize) -> Self {
        Channel {
            width,
            height,
            cells: vec![0.0; width * height],
        }
    }

    /// Width and height of the channel.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// The weights, row by row.
    pub fn cells(&self) -> &[f64] {
        &self.cells
    }

    /// The weight at a pixel.
    pub fn get(&self, pixel: Pixel) -> f64 {
        self.cells[pixel.1 * self.width + pixel.0]
    }

    /// Adds weight at a linear offset.  Weights that are zero, negative
    /// or not a finite number are ignored, so a channel never decreases
    /// and never turns into NaN.
    #[inline]
    pub fn add(&mut self, offset: usize, weight: f64) {
        if weight > 0.0 && weight.is_finite() {
            self.cells[offset] += weight;
        }
    }

    /// The highest value in the channel.  Used for color scaling.
    pub fn max(&self) -> f64 {
        self.cells.iter().cloned().fold(0.0, f64::max)
    }

    /// Resets every weight to zero.
    pub fn clear(&mut self) {
        for cell in self.cells.iter_mut() {
            *cell = 0.0;
        }
    }

    /// Adds `other` into this channel cell by cell.  Nothing is changed
    /// when the dimensions differ.
    pub fn merge(&mut self, other: &Channel) -> Result<()> {
        if self.dimensions() != other.dimensions() {
            return Err(BuddhaError::SizeMismatch(
                self.width,
                self.height,
                other.width,
                other.height,
            ));
        }
        for (cell, add) in self.cells.iter_mut().zip(other.cells.iter()) {
            *cell += add;
        }
        Ok(())
    }
}

/// The red, green and blue accumulation buffers of a render.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Red weight.
    pub r: Channel,
    /// Green weight.
    pub g: Channel,
    /// Blue weight.
    pub b: Channel,
}

impl Histogram {
    /// Three empty channels for an image of `width` × `height`.
    pub fn new(width: usize, height: usize) -> Self {
        Histogram {
            r: Channel::new(width, height),
            g: Channel::new(width, height),
            b: Channel::new(width, height),
        }
    }

    /// Width and height of the histogram.
    pub fn dimensions(&self) -> (usize, usize) {
        self.r.dimensions()
    }

    /// Adds a color's weight at a linear offset.  Zero components are
    /// skipped.
    #[inline]
    pub fn increase(&mut self, offset: usize, color: Rgb) {
        self.r.add(offset, color.r);
        self.g.add(offset, color.g);
        self.b.add(offset, color.b);
    }

    /// The highest value of each channel.
    pub fn max(&self) -> (f64, f64, f64) {
        (self.r.max(), self.g.max(), self.b.max())
    }

    /// True when no pixel in any channel received weight.
    pub fn is_black(&self) -> bool {
        izip!(self.r.cells(), self.g.cells(), self.b.cells())
            .all(|(r, g, b)| *r == 0.0 && *g == 0.0 && *b == 0.0)
    }

    /// Removes old histogram data.  Useful for interactive rendering.
    pub fn clear(&mut self) {
        self.r.clear();
        self.g.clear();
        self.b.clear();
    }

    /// Adds `other` into this histogram, channel by channel.  Fails with
    /// `SizeMismatch`, changing nothing, when the dimensions differ.
    pub fn merge(&mut self, other: &Histogram) -> Result<()> {
        if self.dimensions() != other.dimensions() {
            let (w, h) = self.dimensions();
            let (ow, oh) = other.dimensions();
            return Err(BuddhaError::SizeMismatch(w, h, ow, oh));
        }
        self.r.merge(&other.r)?;
        self.g.merge(&other.g)?;
        self.b.merge(&other.b)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(width: usize, height: usize, seed: f64) -> Histogram {
        let mut h = Histogram::new(width, height);
        for offset in 0..width * height {
            let v = seed * (offset as f64 + 1.0);
            h.increase(offset, Rgb::new(v, v / 2.0, v / 4.0));
        }
        h
    }

    #[test]
    fn new_histogram_is_black() {
        let h = Histogram::new(4, 3);
        assert!(h.is_black());
        assert_eq!(h.dimensions(), (4, 3));
        assert_eq!(h.r.cells().len(), 12);
    }

    #[test]
    fn increase_skips_zero_and_invalid_weights() {
        let mut h = Histogram::new(2, 2);
        h.increase(3, Rgb::new(0.0, 0.5, std::f64::NAN));
        assert_eq!(h.r.get(Pixel(1, 1)), 0.0);
        assert_eq!(h.g.get(Pixel(1, 1)), 0.5);
        assert_eq!(h.b.get(Pixel(1, 1)), 0.0);
        assert!(!h.is_black());
    }

    #[test]
    fn accumulation_is_monotonic() {
        let mut h = Histogram::new(3, 3);
        let mut previous = h.clone();
        let colors = [
            Rgb::new(1.0, 0.0, 0.0),
            Rgb::new(0.0, -1.0, 2.0),
            Rgb::new(0.25, 0.25, std::f64::INFINITY),
            Rgb::new(0.0, 0.0, 0.0),
        ];
        for step in 0..40 {
            h.increase((step * 7) % 9, colors[step % colors.len()]);
            for (now, before) in izip!(
                h.r.cells().iter().chain(h.g.cells()).chain(h.b.cells()),
                previous.r.cells().iter().chain(previous.g.cells()).chain(previous.b.cells())
            ) {
                assert!(now >= before);
            }
            previous = h.clone();
        }
    }

    #[test]
    fn merge_is_commutative() {
        let a = sample(5, 4, 0.5);
        let b = sample(5, 4, 1.5);

        let mut ab = a.clone();
        ab.merge(&b).unwrap();
        let mut ba = b.clone();
        ba.merge(&a).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.r.get(Pixel(0, 0)), 2.0);
    }

    #[test]
    fn merge_rejects_mismatched_sizes() {
        let mut a = sample(5, 4, 1.0);
        let b = sample(4, 5, 1.0);
        let (a0, b0) = (a.clone(), b.clone());
        match a.merge(&b) {
            Err(BuddhaError::SizeMismatch(5, 4, 4, 5)) => {}
            other => panic!("unexpected merge result: {:?}", other),
        }
        assert_eq!(a, a0);
        assert_eq!(b, b0);
    }

    #[test]
    fn clear_resets_to_black() {
        let mut h = sample(3, 3, 1.0);
        assert_eq!(h.max(), (9.0, 4.5, 2.25));
        h.clear();
        assert!(h.is_black());
        assert_eq!(h.max(), (0.0, 0.0, 0.0));
    }
}
