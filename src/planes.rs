// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PlaneMapper struct, which describes a relationship
//! between the four-dimensional space of `(z, c)` pairs visited by an
//! orbit and a rectangle on the integral plane with an origin at 0,0.
//!
//! The mapping happens in two steps.  A `Plane` first picks two of the
//! four real components of `(z, c)` and folds them into a single
//! complex number; the "classic" Buddhabrot uses `Zrzi`, the real and
//! imaginary parts of `z`.  The PlaneMapper then rotates, offsets and
//! zooms that complex number onto the pixel grid.
use std::fmt;
use std::str::FromStr;

use num::Complex;

use crate::errors::{BuddhaError, Result};

/// Describes the x, y of a pixel in the integral plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// Which two of the four real components of `(z, c)` become the
/// horizontal and vertical image axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Plane {
    /// Real and imaginary part of z.  The original Buddhabrot.
    Zrzi,
    /// Real part of z against the real part of c.
    Zrcr,
    /// Real part of z against the imaginary part of c.
    Zrci,
    /// Imaginary part of z against the real part of c.
    Zicr,
    /// Imaginary part of z against the imaginary part of c.
    Zici,
    /// Real and imaginary part of c.  Draws the Mandelbrot perimeter.
    Crci,
}

impl Plane {
    /// Every plane, in the order they are listed on the command line.
    pub const ALL: [Plane; 6] = [
        Plane::Zrzi,
        Plane::Zrcr,
        Plane::Zrci,
        Plane::Zicr,
        Plane::Zici,
        Plane::Crci,
    ];

    /// Folds `(z, c)` into the complex number whose real part becomes
    /// the x axis and whose imaginary part becomes the y axis.
    #[inline]
    pub fn project(self, z: Complex<f64>, c: Complex<f64>) -> Complex<f64> {
        match self {
            Plane::Zrzi => z,
            Plane::Zrcr => Complex::new(z.re, c.re),
            Plane::Zrci => Complex::new(z.re, c.im),
            Plane::Zicr => Complex::new(z.im, c.re),
            Plane::Zici => Complex::new(z.im, c.im),
            Plane::Crci => c,
        }
    }

    /// The selector name of the plane.
    pub fn name(self) -> &'static str {
        match self {
            Plane::Zrzi => "zrzi",
            Plane::Zrcr => "zrcr",
            Plane::Zrci => "zrci",
            Plane::Zicr => "zicr",
            Plane::Zici => "zici",
            Plane::Crci => "crci",
        }
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Plane {
    type Err = BuddhaError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.to_lowercase();
        Plane::ALL
            .iter()
            .find(|plane| plane.name() == wanted)
            .cloned()
            .ok_or_else(|| BuddhaError::UnknownSelector("plane", s.to_string()))
    }
}

/// Maps `(z, c)` pairs onto the integral cartesian plane of the
/// image.  Once built it is read-only and shared by every worker.
#[derive(Debug, Clone)]
pub struct PlaneMapper {
    /// Width and height of the integral plane.  The left-upper corner
    /// is assumed to be at 0,0.
    pub bounds: (usize, usize),
    plane: Plane,
    // Pixels per unit on each axis, zoom and aspect ratio folded in.
    grid_factors: (f64, f64),
    offset: Complex<f64>,
    // None when there is no rotation, so the identity mapping stays exact.
    rotor: Option<Complex<f64>>,
}

impl PlaneMapper {
    /// Constructor.  Takes the image dimensions, the plane selection,
    /// and the zoom, offset and rotation (in radians) of the view.
    pub fn new(
        width: usize,
        height: usize,
        plane: Plane,
        zoom: f64,
        offset: Complex<f64>,
        rotation: f64,
    ) -> Result<PlaneMapper> {
        if width == 0 || height == 0 {
            return Err(BuddhaError::InvalidConfig(format!(
                "image dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(BuddhaError::InvalidConfig(format!(
                "zoom must be a positive number, got {}",
                zoom
            )));
        }
        if !rotation.is_finite() {
            return Err(BuddhaError::InvalidConfig(format!(
                "rotation must be finite, got {}",
                rotation
            )));
        }

        // The classic view fits the radius-2 disc into the shorter
        // axis; the horizontal axis is compensated for the aspect ratio.
        let ratio = (width as f64) / (height as f64);
        let grid_factors = (
            zoom * (width as f64 / 4.0) * (1.0 / ratio),
            zoom * (height as f64 / 4.0),
        );

        let rotor = if rotation == 0.0 {
            None
        } else {
            Some(Complex::from_polar(&1.0, &rotation))
        };

        Ok(PlaneMapper {
            bounds: (width, height),
            plane,
            grid_factors,
            offset,
            rotor,
        })
    }

    /// The total number of points in the integral grid.  Used to
    /// calculate memory needs.
    pub fn len(&self) -> usize {
        self.bounds.0 * self.bounds.1
    }

    /// Describes that the integral plane is of a size.
    pub fn is_empty(&self) -> bool {
        self.bounds.0 == 0 || self.bounds.1 == 0
    }

    /// The plane this mapper folds `(z, c)` with.
    pub fn plane(&self) -> Plane {
        self.plane
    }

    /// The unclipped, fractional image coordinates of `(z, c)`.
    #[inline]
    pub fn project(&self, z: Complex<f64>, c: Complex<f64>) -> (f64, f64) {
        let mut p = self.plane.project(z, c);
        if let Some(rotor) = self.rotor {
            p = p * rotor;
        }
        (
            self.grid_factors.0 * (p.re + self.offset.re) + (self.bounds.0 as f64) / 2.0,
            self.grid_factors.1 * (p.im + self.offset.im) + (self.bounds.1 as f64) / 2.0,
        )
    }

    /// Given a point of an orbit and the orbit's c, map that as closely
    /// as possible to a pixel on the integral plane.  Points outside the
    /// image, and points that are not numbers at all, have no pixel.
    #[inline]
    pub fn point_to_pixel(&self, z: Complex<f64>, c: Complex<f64>) -> Option<Pixel> {
        let (x, y) = self.project(z, c);
        // NaN fails every comparison and is rejected here as well.
        if x >= 0.0 && x < self.bounds.0 as f64 && y >= 0.0 && y < self.bounds.1 as f64 {
            Some(Pixel(x as usize, y as usize))
        } else {
            None
        }
    }

    /// The linear offset of a pixel from the root of the image buffer
    /// in memory.
    #[inline]
    pub fn pixel_to_offset(&self, pixel: Pixel) -> usize {
        pixel.1 * self.bounds.0 + pixel.0
    }

    /// Since the Buddhabrot tracks the progress of a complex number as
    /// it orbits, we have to map the visited points back to the pixel
    /// plane.  This maps a point to pixel coordinates, then returns the
    /// linear offset from the root of the image buffer.
    #[inline]
    pub fn point_to_offset(&self, z: Complex<f64>, c: Complex<f64>) -> Option<usize> {
        self.point_to_pixel(z, c).map(|p| self.pixel_to_offset(p))
    }
}
