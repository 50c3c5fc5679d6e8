// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The orbit iterator.  Starting from `(z, c)` it applies the
//! configured map until the orbit escapes the bailout radius, falls
//! into a cycle, or runs out of iterations, and then lets the
//! registration policy decide whether the visited points are worth
//! plotting.
//!
//! Cycle detection uses exponential back-off: the current value is
//! remembered whenever the step counter reaches a power of two, and
//! every other step is compared against that snapshot.  An orbit that
//! becomes periodic with period p is therefore caught at most 2p steps
//! after the cycle first recurs, long before the iteration cap.

use std::fmt;
use std::str::FromStr;

use num::Complex;

use crate::errors::{BuddhaError, Result};
use crate::maps::{is_in_bulb, OrbitMap};

/// The points visited by one orbit, and the c that produced them.  A
/// worker owns exactly one of these and reuses it for every sample.
#[derive(Debug, Clone)]
pub struct Orbit {
    /// Storage for up to `iterations` visited points.  Only the prefix
    /// reported by the last successful `iterate` call is meaningful.
    pub points: Vec<Complex<f64>>,
    /// The c of the last iterated orbit.
    pub c: Complex<f64>,
    /// How many times the map was applied during the last call to
    /// `iterate`, whatever the outcome.
    pub steps: usize,
}

impl Orbit {
    /// A buffer able to hold an orbit of `iterations` points.
    pub fn new(iterations: usize) -> Self {
        Orbit {
            points: vec![Complex::new(0.0, 0.0); iterations],
            c: Complex::new(0.0, 0.0),
            steps: 0,
        }
    }
}

/// Which orbits get plotted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Registration {
    /// The Buddhabrot: orbits that escape before the iteration cap.
    Escape,
    /// The anti-Buddhabrot: orbits that stay bounded, either because a
    /// cycle was detected or because the iteration cap was reached.
    Converged,
    /// Everything, escaping or not.
    Primitive,
}

impl Registration {
    /// Every policy.
    pub const ALL: [Registration; 3] =
        [Registration::Escape, Registration::Converged, Registration::Primitive];

    /// The selector name of the policy.
    pub fn name(self) -> &'static str {
        match self {
            Registration::Escape => "escapes",
            Registration::Converged => "anti",
            Registration::Primitive => "primitive",
        }
    }

    /// Whether the bulb shortcut may reject samples under this policy.
    /// Primitive registers bounded orbits too, so it never skips them.
    fn uses_bulb_filter(self) -> bool {
        self != Registration::Primitive
    }

    /// The orbit fell into a cycle at step `i`.
    #[inline]
    fn on_cycle(self, i: usize) -> Option<usize> {
        match self {
            Registration::Escape => None,
            Registration::Converged | Registration::Primitive => Some(i),
        }
    }

    /// The orbit left the bailout radius at step `i`.
    #[inline]
    fn on_escape(self, i: usize) -> Option<usize> {
        match self {
            Registration::Escape | Registration::Primitive => Some(i),
            Registration::Converged => None,
        }
    }

    /// The orbit survived all `iterations` steps.
    #[inline]
    fn on_exhausted(self, iterations: usize) -> Option<usize> {
        match self {
            Registration::Escape => None,
            Registration::Converged | Registration::Primitive => Some(iterations),
        }
    }
}

impl fmt::Display for Registration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Registration {
    type Err = BuddhaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "escapes" | "escape" => Ok(Registration::Escape),
            "anti" | "converged" => Ok(Registration::Converged),
            "primitive" => Ok(Registration::Primitive),
            _ => Err(BuddhaError::UnknownSelector("register mode", s.to_string())),
        }
    }
}

/// The parts of a fractal configuration the iterator needs.
#[derive(Copy, Clone, Debug)]
pub struct Iteration<M> {
    /// The map to iterate.
    pub map: M,
    /// Coefficient passed to the map on every step.
    pub coefficient: Complex<f64>,
    /// Squared escape radius.
    pub bailout: f64,
    /// Iteration cap.
    pub iterations: usize,
    /// Which orbits are kept.
    pub registration: Registration,
    /// Allow the Mandelbrot bulb shortcut when the map supports it.
    pub bulb_filter: bool,
}

/// True when the step counter is a power of two and the current value
/// becomes the new reference; otherwise compares against the reference.
#[inline]
fn is_cycle(z: Complex<f64>, reference: &mut Complex<f64>, i: usize) -> bool {
    if i > 1 && i & (i - 1) == 0 {
        *reference = z;
        false
    } else {
        z == *reference
    }
}

#[inline]
fn is_outside(z: Complex<f64>, bailout: f64) -> bool {
    z.re * z.re + z.im * z.im >= bailout
}

impl<M: OrbitMap> Iteration<M> {
    /// Iterates `(z, c)` and returns the number of valid points stored
    /// at the front of `orbit.points`, or `None` if the registration
    /// policy rejects the orbit.
    pub fn iterate(&self, mut z: Complex<f64>, c: Complex<f64>, orbit: &mut Orbit) -> Option<usize> {
        orbit.c = c;
        orbit.steps = 0;

        if self.bulb_filter
            && self.registration.uses_bulb_filter()
            && self.map.has_mandelbrot_bulbs()
            && is_in_bulb(c)
        {
            return None;
        }

        let mut reference = Complex::new(0.0, 0.0);
        for i in 0..self.iterations {
            z = self.map.apply(z, c, self.coefficient);
            orbit.steps = i + 1;

            if is_cycle(z, &mut reference, i) {
                return self.registration.on_cycle(i);
            }
            if is_outside(z, self.bailout) {
                return self.registration.on_escape(i);
            }
            orbit.points[i] = z;
        }
        self.registration.on_exhausted(self.iterations)
    }
}
