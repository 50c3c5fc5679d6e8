// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The complex functions whose orbits we trace.  Each map is its own
//! type implementing `OrbitMap`; `MapFunction` is the closed set of
//! them that a configuration can name, resolved once when the
//! configuration is read.

use std::fmt;
use std::str::FromStr;

use num::Complex;

use crate::errors::{BuddhaError, Result};

/// A function `(z, c, coefficient) -> z'` iterated to produce an orbit.
pub trait OrbitMap {
    /// One step of the orbit.
    fn apply(&self, z: Complex<f64>, c: Complex<f64>, coef: Complex<f64>) -> Complex<f64>;

    /// True only when the closed-form bulb shapes of the Mandelbrot set
    /// describe this map, so that `is_in_bulb` may be used to discard
    /// samples without iterating them.
    fn has_mandelbrot_bulbs(&self) -> bool {
        false
    }
}

/// The canonical `z² + c`.
#[derive(Copy, Clone, Debug)]
pub struct Quadratic;

impl OrbitMap for Quadratic {
    #[inline]
    fn apply(&self, z: Complex<f64>, c: Complex<f64>, _coef: Complex<f64>) -> Complex<f64> {
        z * z + c
    }

    fn has_mandelbrot_bulbs(&self) -> bool {
        true
    }
}

/// `k·z² + k·c`, where k is the configured coefficient.
#[derive(Copy, Clone, Debug)]
pub struct Coefficient;

impl OrbitMap for Coefficient {
    #[inline]
    fn apply(&self, z: Complex<f64>, c: Complex<f64>, coef: Complex<f64>) -> Complex<f64> {
        coef * z * z + coef * c
    }
}

/// The cubic multibrot `z³ + c`.
#[derive(Copy, Clone, Debug)]
pub struct Cubic;

impl OrbitMap for Cubic {
    #[inline]
    fn apply(&self, z: Complex<f64>, c: Complex<f64>, _coef: Complex<f64>) -> Complex<f64> {
        z * z * z + c
    }
}

/// The tricorn, `conj(z)² + c`.
#[derive(Copy, Clone, Debug)]
pub struct Tricorn;

impl OrbitMap for Tricorn {
    #[inline]
    fn apply(&self, z: Complex<f64>, c: Complex<f64>, _coef: Complex<f64>) -> Complex<f64> {
        let z = z.conj();
        z * z + c
    }
}

/// The burning ship, `(|Re z| + i|Im z|)² + c`.
#[derive(Copy, Clone, Debug)]
pub struct BurningShip;

impl OrbitMap for BurningShip {
    #[inline]
    fn apply(&self, z: Complex<f64>, c: Complex<f64>, _coef: Complex<f64>) -> Complex<f64> {
        let z = Complex::new(z.re.abs(), z.im.abs());
        z * z + c
    }
}

/// The map functions a configuration can select by name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MapFunction {
    /// See `Quadratic`.
    Quadratic,
    /// See `Coefficient`.
    Coefficient,
    /// See `Cubic`.
    Cubic,
    /// See `Tricorn`.
    Tricorn,
    /// See `BurningShip`.
    BurningShip,
}

impl MapFunction {
    /// Every map function.
    pub const ALL: [MapFunction; 5] = [
        MapFunction::Quadratic,
        MapFunction::Coefficient,
        MapFunction::Cubic,
        MapFunction::Tricorn,
        MapFunction::BurningShip,
    ];

    /// The selector name of the map.
    pub fn name(self) -> &'static str {
        match self {
            MapFunction::Quadratic => "quadratic",
            MapFunction::Coefficient => "coefficient",
            MapFunction::Cubic => "cubic",
            MapFunction::Tricorn => "tricorn",
            MapFunction::BurningShip => "burningship",
        }
    }
}

impl OrbitMap for MapFunction {
    #[inline]
    fn apply(&self, z: Complex<f64>, c: Complex<f64>, coef: Complex<f64>) -> Complex<f64> {
        match self {
            MapFunction::Quadratic => Quadratic.apply(z, c, coef),
            MapFunction::Coefficient => Coefficient.apply(z, c, coef),
            MapFunction::Cubic => Cubic.apply(z, c, coef),
            MapFunction::Tricorn => Tricorn.apply(z, c, coef),
            MapFunction::BurningShip => BurningShip.apply(z, c, coef),
        }
    }

    fn has_mandelbrot_bulbs(&self) -> bool {
        match self {
            MapFunction::Quadratic => Quadratic.has_mandelbrot_bulbs(),
            MapFunction::Coefficient => Coefficient.has_mandelbrot_bulbs(),
            MapFunction::Cubic => Cubic.has_mandelbrot_bulbs(),
            MapFunction::Tricorn => Tricorn.has_mandelbrot_bulbs(),
            MapFunction::BurningShip => BurningShip.has_mandelbrot_bulbs(),
        }
    }
}

impl fmt::Display for MapFunction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MapFunction {
    type Err = BuddhaError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.to_lowercase();
        MapFunction::ALL
            .iter()
            .find(|map| map.name() == wanted)
            .cloned()
            .ok_or_else(|| BuddhaError::UnknownSelector("map function", s.to_string()))
    }
}

/// True if c lies in the main cardioid, the period-2 bulb, or one of
/// the three larger satellite bulbs of the Mandelbrot set.  Points in
/// there never escape under `z² + c`, so they can be discarded without
/// iterating.  This says nothing about any other map.
pub fn is_in_bulb(c: Complex<f64>) -> bool {
    let (cr, ci) = (c.re, c.im);
    let ci2 = ci * ci;

    // Main cardioid.
    let q = (cr - 0.25) * (cr - 0.25) + ci2;
    if q * (q + (cr - 0.25)) < 0.25 * ci2 {
        return true;
    }
    // Period-2 bulb.
    if (cr + 1.0) * (cr + 1.0) + ci2 < 0.0625 {
        return true;
    }
    // The smaller bulb left of the period-2 bulb.
    if (cr + 1.309) * (cr + 1.309) + ci2 < 0.00345 {
        return true;
    }
    // The bulbs above and below the main cardioid.
    let side = (cr + 0.125) * (cr + 0.125);
    side + (ci - 0.744) * (ci - 0.744) < 0.0088 || side + (ci + 0.744) * (ci + 0.744) < 0.0088
}
