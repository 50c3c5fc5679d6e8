// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The render job: an immutable configuration plus the histograms the
//! sampling workers fill in.

use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;

use image::RgbImage;
use num::Complex;

use crate::coloring::{Coloring, ColoringMode};
use crate::errors::{BuddhaError, Result};
use crate::histogram::{Channel, Histogram};
use crate::maps::MapFunction;
use crate::orbit::{Iteration, Registration};
use crate::planes::{Plane, PlaneMapper};

/// Where an orbit starts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StartPoint {
    /// z₀ = 0, the Mandelbrot convention.
    Origin,
    /// z₀ = c.
    Parameter,
    /// z₀ drawn at random, independently of c.
    Random,
}

impl StartPoint {
    /// Every start point.
    pub const ALL: [StartPoint; 3] = [StartPoint::Origin, StartPoint::Parameter, StartPoint::Random];

    /// The selector name of the start point.
    pub fn name(self) -> &'static str {
        match self {
            StartPoint::Origin => "origin",
            StartPoint::Parameter => "parameter",
            StartPoint::Random => "random",
        }
    }
}

impl fmt::Display for StartPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StartPoint {
    type Err = BuddhaError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.to_lowercase();
        StartPoint::ALL
            .iter()
            .find(|start| start.name() == wanted)
            .cloned()
            .ok_or_else(|| BuddhaError::UnknownSelector("start point", s.to_string()))
    }
}

/// The settings of a render job.  Read-only once sampling starts.
#[derive(Debug, Clone)]
pub struct FractalConfig {
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// Iteration cap per orbit.
    pub iterations: usize,
    /// Squared escape radius.
    pub bailout: f64,
    /// Coefficient handed to the map function.
    pub coefficient: Complex<f64>,
    /// The map whose orbits are traced.
    pub map: MapFunction,
    /// Which components of `(z, c)` become the image axes.
    pub plane: Plane,
    /// Which orbits are plotted.
    pub registration: Registration,
    /// Magnification of the view.
    pub zoom: f64,
    /// Offset of the view, added before zooming.
    pub offset: Complex<f64>,
    /// Rotation of the view in radians.
    pub rotation: f64,
    /// Orbit attempts per pixel of the image.
    pub tries: f64,
    /// Base random seed; worker n uses `seed + n + 1`.
    pub seed: u64,
    /// The most pixels drawn per path segment or Bezier curve.
    pub path_points: usize,
    /// Degree of the Bezier curves in path mode; 1 draws straight lines.
    pub bezier_level: usize,
    /// Accepted orbits shorter than this are not registered.
    pub threshold: usize,
    /// Where orbits start.
    pub start: StartPoint,
    /// Skip c in the known Mandelbrot bulbs.  Only honoured for the
    /// quadratic map.
    pub bulb_filter: bool,
    /// Record an importance map of where long orbits were found.
    pub importance: bool,
}

impl Default for FractalConfig {
    fn default() -> Self {
        FractalConfig {
            width: 512,
            height: 512,
            iterations: 1000,
            bailout: 4.0,
            coefficient: Complex::new(1.0, 0.0),
            map: MapFunction::Quadratic,
            plane: Plane::Zrzi,
            registration: Registration::Escape,
            zoom: 1.0,
            offset: Complex::new(0.0, 0.0),
            rotation: 0.0,
            tries: 1.0,
            seed: 0,
            path_points: 100,
            bezier_level: 1,
            threshold: 0,
            start: StartPoint::Origin,
            bulb_filter: true,
            importance: false,
        }
    }
}

impl FractalConfig {
    /// The total number of orbit attempts: tries × width × height.
    pub fn total_tries(&self) -> u64 {
        (self.tries * (self.width * self.height) as f64).floor() as u64
    }

    /// The orbit iterator for this configuration.
    pub fn iteration(&self) -> Iteration<MapFunction> {
        Iteration {
            map: self.map,
            coefficient: self.coefficient,
            bailout: self.bailout,
            iterations: self.iterations,
            registration: self.registration,
            bulb_filter: self.bulb_filter,
        }
    }

    /// The pixel mapping for this configuration.
    pub fn mapper(&self) -> Result<PlaneMapper> {
        PlaneMapper::new(
            self.width,
            self.height,
            self.plane,
            self.zoom,
            self.offset,
            self.rotation,
        )
    }

    fn validate(&self) -> Result<()> {
        if !(self.bailout.is_finite() && self.bailout > 0.0) {
            return Err(BuddhaError::InvalidConfig(format!(
                "bailout must be a positive number, got {}",
                self.bailout
            )));
        }
        if !(self.tries.is_finite() && self.tries >= 0.0) {
            return Err(BuddhaError::InvalidConfig(format!(
                "tries must be a non-negative number, got {}",
                self.tries
            )));
        }
        if self.bezier_level == 0 {
            return Err(BuddhaError::InvalidConfig(
                "bezier level must be at least 1".to_string(),
            ));
        }
        if !(self.coefficient.re.is_finite() && self.coefficient.im.is_finite()) {
            return Err(BuddhaError::InvalidConfig(
                "coefficient must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for FractalConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Dimensions: {} x {}", self.width, self.height)?;
        writeln!(f, "Iterations: {}", self.iterations)?;
        writeln!(f, "Map:        {}", self.map)?;
        writeln!(f, "Plane:      {}", self.plane)?;
        writeln!(f, "Register:   {}", self.registration)?;
        writeln!(f, "Start:      {}", self.start)?;
        writeln!(f, "Coef:       {}", self.coefficient)?;
        writeln!(f, "Bail:       {}", self.bailout)?;
        writeln!(f, "Zoom:       {}", self.zoom)?;
        writeln!(f, "Offset:     {}", self.offset)?;
        writeln!(f, "Rotation:   {}", self.rotation)?;
        writeln!(f, "Seed:       {}", self.seed)?;
        writeln!(f, "Points:     {}", self.path_points)?;
        writeln!(f, "Threshold:  {}", self.threshold)?;
        write!(f, "Tries:      {}", self.tries)
    }
}

/// Counts gathered while sampling.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SampleStats {
    /// Orbits iterated, neighbourhood searches included.
    pub attempts: u64,
    /// Attempts that registered at least one pixel.
    pub orbits: u64,
    /// Pixels registered over all attempts.
    pub pixels: u64,
}

impl SampleStats {
    /// Registered orbits per attempt, in [0, 1].  Zero when nothing was
    /// attempted.
    pub fn orbit_ratio(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        self.orbits as f64 / self.attempts as f64
    }

    /// Registered pixels per attempt.  Zero when nothing was attempted.
    pub fn pixel_ratio(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        self.pixels as f64 / self.attempts as f64
    }
}

impl AddAssign for SampleStats {
    fn add_assign(&mut self, other: SampleStats) {
        self.attempts += other.attempts;
        self.orbits += other.orbits;
        self.pixels += other.pixels;
    }
}

/// A render job: the configuration and the histograms it produces.
#[derive(Debug, Clone)]
pub struct Fractal {
    config: FractalConfig,
    mapper: PlaneMapper,
    /// The accumulated orbit weight.
    pub histogram: Histogram,
    /// Where long orbits were found, when importance tracking is on.
    pub importance: Option<Channel>,
    reference: Option<RgbImage>,
    stats: SampleStats,
}

impl Fractal {
    /// Validates the configuration and allocates the histograms.
    pub fn new(config: FractalConfig) -> Result<Self> {
        config.validate()?;
        let mapper = config.mapper()?;
        let histogram = Histogram::new(config.width, config.height);
        let importance = if config.importance {
            Some(Channel::new(config.width, config.height))
        } else {
            None
        };
        Ok(Fractal {
            config,
            mapper,
            histogram,
            importance,
            reference: None,
            stats: SampleStats::default(),
        })
    }

    /// The job's configuration.
    pub fn config(&self) -> &FractalConfig {
        &self.config
    }

    /// The job's pixel mapping.
    pub fn mapper(&self) -> &PlaneMapper {
        &self.mapper
    }

    /// Sets the reference image used for image-trap coloring.
    pub fn set_reference(&mut self, reference: RgbImage) {
        self.reference = Some(reference);
    }

    /// The reference image, if one was set.
    pub fn reference(&self) -> Option<&RgbImage> {
        self.reference.as_ref()
    }

    /// What went into the histograms since they were last cleared.
    pub fn stats(&self) -> SampleStats {
        self.stats
    }

    pub(crate) fn record(&mut self, stats: SampleStats) {
        self.stats += stats;
    }

    /// Removes old histogram data.  Useful for interactive rendering.
    pub fn clear(&mut self) {
        self.stats = SampleStats::default();
        self.histogram.clear();
        if let Some(importance) = self.importance.as_mut() {
            importance.clear();
        }
    }

    /// Checks that `coloring` can be used with this job.
    pub(crate) fn check_coloring(&self, coloring: &dyn Coloring) -> Result<()> {
        if coloring.mode() == ColoringMode::Image && self.reference.is_none() {
            return Err(BuddhaError::MissingReference);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let frac = Fractal::new(FractalConfig::default()).unwrap();
        assert_eq!(frac.histogram.dimensions(), (512, 512));
        assert!(frac.importance.is_none());
    }

    #[test]
    fn total_tries_is_floored() {
        let config = FractalConfig {
            width: 10,
            height: 3,
            tries: 0.55,
            ..FractalConfig::default()
        };
        assert_eq!(config.total_tries(), 16);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let bad = [
            FractalConfig {
                width: 0,
                ..FractalConfig::default()
            },
            FractalConfig {
                bailout: -1.0,
                ..FractalConfig::default()
            },
            FractalConfig {
                tries: std::f64::NAN,
                ..FractalConfig::default()
            },
            FractalConfig {
                bezier_level: 0,
                ..FractalConfig::default()
            },
            FractalConfig {
                zoom: 0.0,
                ..FractalConfig::default()
            },
        ];
        for config in bad.iter() {
            assert!(Fractal::new(config.clone()).is_err(), "accepted {:?}", config);
        }
    }

    #[test]
    fn importance_channel_follows_the_flag() {
        let frac = Fractal::new(FractalConfig {
            width: 8,
            height: 4,
            importance: true,
            ..FractalConfig::default()
        })
        .unwrap();
        assert_eq!(frac.importance.map(|c| c.dimensions()), Some((8, 4)));
    }

    #[test]
    fn stats_ratios() {
        let empty = SampleStats::default();
        assert_eq!(empty.orbit_ratio(), 0.0);
        assert_eq!(empty.pixel_ratio(), 0.0);

        let mut stats = SampleStats {
            attempts: 8,
            orbits: 2,
            pixels: 40,
        };
        stats += SampleStats {
            attempts: 2,
            orbits: 3,
            pixels: 10,
        };
        assert_eq!(stats.orbit_ratio(), 0.5);
        assert_eq!(stats.pixel_ratio(), 5.0);
    }

    #[test]
    fn clear_forgets_the_stats() {
        let mut frac = Fractal::new(FractalConfig {
            width: 4,
            height: 4,
            ..FractalConfig::default()
        })
        .unwrap();
        frac.record(SampleStats {
            attempts: 3,
            orbits: 1,
            pixels: 1,
        });
        assert_eq!(frac.stats().attempts, 3);
        frac.clear();
        assert_eq!(frac.stats(), SampleStats::default());
    }

    #[test]
    fn start_points_parse_by_name() {
        assert_eq!("Random".parse::<StartPoint>().unwrap(), StartPoint::Random);
        assert!("middle".parse::<StartPoint>().is_err());
    }

    #[test]
    fn display_names_the_selectors() {
        let text = FractalConfig::default().to_string();
        assert!(text.contains("quadratic"));
        assert!(text.contains("zrzi"));
        assert!(text.contains("escapes"));
    }
}
