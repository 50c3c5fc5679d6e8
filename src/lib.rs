#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Buddhabrot renderer
//!
//! The Buddhabrot (and the Nebulabrot) are variants of the Mandelbrot
//! set that explore "what's in the black heart" of the Mandelbrot.
//! Instead of coloring a point by how quickly it escapes, every point
//! an orbit visits is mapped to its nearest pixel, and that pixel is
//! incremented.  Plotting the orbits of the escaping points gives the
//! Buddhabrot; plotting the orbits of the points that stay bounded
//! gives the anti-buddhabrot; plotting everything gives the
//! primitive-brot.
//!
//! This crate samples random points in parallel, iterates them under
//! a choice of map functions, and accumulates the accepted orbits into
//! three color histograms, which [`plot`] then tone maps into an
//! image.
//!
//! ```no_run
//! use buddhabrot::{fill_histograms, plot, ColoringMode, Fractal, FractalConfig, Gradient, Palette, Rgb, Scaling};
//!
//! let mut frac = Fractal::new(FractalConfig::default()).unwrap();
//! let gradient = Gradient::uniform(
//!     vec![Rgb::new(0.0, 0.0, 1.0), Rgb::new(0.0, 1.0, 0.0), Rgb::new(1.0, 0.0, 0.0)],
//!     Rgb::BLACK,
//!     1024,
//! ).unwrap();
//! let palette = Palette::new(ColoringMode::Modulo, gradient, vec![]).unwrap();
//! let _ratio = fill_histograms(&mut frac, &palette, 4).unwrap();
//! let image = plot(&frac.histogram, Scaling::Exp, 0.1, 1.0);
//! image.save("buddhabrot.png").unwrap();
//! ```

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
extern crate crossbeam;
extern crate image;
extern crate itertools;
extern crate num;
extern crate rand;
extern crate rand_pcg;

pub mod buddha;
pub mod coloring;
pub mod errors;
pub mod fractal;
pub mod histogram;
pub mod maps;
pub mod orbit;
pub mod paths;
pub mod planes;
pub mod plot;
pub mod register;

pub use buddha::fill_histograms;
pub use coloring::{Coloring, ColoringMode, Gradient, Palette, Rgb};
pub use errors::{BuddhaError, Result};
pub use fractal::{Fractal, FractalConfig, SampleStats, StartPoint};
pub use histogram::{Channel, Histogram};
pub use maps::{MapFunction, OrbitMap};
pub use orbit::{Iteration, Orbit, Registration};
pub use planes::{Pixel, Plane, PlaneMapper};
pub use plot::{derived_factor, plot, plot_channel, Scaling};
