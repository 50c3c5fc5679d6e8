// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! High performance parallel sampling of the Buddhabrot and its
//! complex cousins.
//!
//! The sampling budget, tries × width × height, is split evenly
//! between a fixed number of workers.  Each worker owns a seeded random
//! generator, an orbit buffer and a private histogram; it draws random
//! points, iterates them, and registers the orbits the policy accepts.
//! When an orbit turns out to be long, the neighbourhood of its c is
//! searched as well, since rich orbits tend to cluster.  After all
//! workers are joined their histograms are summed in worker order, so
//! a given seed and worker count always produce the same image.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, RecvTimeoutError};
use num::Complex;
use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::coloring::Coloring;
use crate::errors::{BuddhaError, Result};
use crate::fractal::{Fractal, FractalConfig, SampleStats, StartPoint};
use crate::histogram::{Channel, Histogram};
use crate::maps::MapFunction;
use crate::orbit::{Iteration, Orbit};
use crate::planes::{Pixel, Plane, PlaneMapper};
use crate::register::Registrar;

/// Random points are drawn from the square [-2, 2] × [-2, 2].
pub const SAMPLE_EXTENT: f64 = 2.0;

// The neighbourhood search starts at 1e-15 and grows tenfold per ring
// up to 1e-3, the last ring below 1e-2.
const FIRST_STEP: f64 = 1e-15;
const RINGS: i32 = 13;

/// True if an attempt that registered `length` pixels counts as long:
/// length > max(20, threshold, iterations / 1e4).
pub fn is_long_orbit(length: u64, config: &FractalConfig) -> bool {
    let floor = 20f64
        .max(config.threshold as f64)
        .max(config.iterations as f64 / 1e4);
    length as f64 > floor
}

/// The outcome of a neighbourhood search.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Nearby {
    /// Candidates whose attempt was long.
    pub accepted: u64,
    /// Candidates attempted, the last one rejected included.
    pub examined: u64,
}

/// The eight compass neighbours of c at distance h.
fn compass(c: Complex<f64>, h: f64) -> [Complex<f64>; 8] {
    let (cr, ci) = (c.re, c.im);
    [
        Complex::new(cr + h, ci),
        Complex::new(cr - h, ci),
        Complex::new(cr, ci + h),
        Complex::new(cr, ci - h),
        Complex::new(cr + h, ci + h),
        Complex::new(cr - h, ci - h),
        Complex::new(cr + h, ci - h),
        Complex::new(cr - h, ci + h),
    ]
}

/// Samples points near a c which rendered a long orbit, in rings of
/// increasing distance.  `attempt` registers the orbit of a neighbour
/// and returns its length; the whole search stops at the first
/// neighbour whose length `is_long` rejects.  At most 13 rings of 8
/// neighbours are examined.
pub fn search_nearby<A, L>(c: Complex<f64>, is_long: L, mut attempt: A) -> Nearby
where
    A: FnMut(Complex<f64>) -> u64,
    L: Fn(u64) -> bool,
{
    let mut nearby = Nearby::default();
    for ring in 0..RINGS {
        let h = FIRST_STEP * 10f64.powi(ring);
        for &neighbour in compass(c, h).iter() {
            nearby.examined += 1;
            if !is_long(attempt(neighbour)) {
                return nearby;
            }
            nearby.accepted += 1;
        }
    }
    nearby
}

/// What a worker hands back when it is done.
struct Sample {
    histogram: Histogram,
    importance: Option<Channel>,
    stats: SampleStats,
    // Random c drawn, and long neighbours charged against the share.
    drawn: u64,
    refined: u64,
}

/// One sampling thread.  Everything mutable in here is owned by the
/// worker alone.
struct Worker<'a> {
    config: &'a FractalConfig,
    iteration: Iteration<MapFunction>,
    registrar: Registrar<'a>,
    importance_mapper: Option<&'a PlaneMapper>,
    rng: Pcg64,
    domain: Uniform<f64>,
    orbit: Orbit,
    scratch: Vec<Pixel>,
    histogram: Histogram,
    importance: Option<Channel>,
    stats: SampleStats,
}

impl<'a> Worker<'a> {
    fn new(
        config: &'a FractalConfig,
        registrar: Registrar<'a>,
        importance_mapper: Option<&'a PlaneMapper>,
        rng: Pcg64,
    ) -> Self {
        Worker {
            config,
            iteration: config.iteration(),
            registrar,
            importance_mapper,
            rng,
            domain: Uniform::new(-SAMPLE_EXTENT, SAMPLE_EXTENT),
            orbit: Orbit::new(config.iterations),
            scratch: Vec::with_capacity(config.path_points),
            histogram: Histogram::new(config.width, config.height),
            importance: importance_mapper.map(|_| Channel::new(config.width, config.height)),
            stats: SampleStats::default(),
        }
    }

    fn random_point(&mut self) -> Complex<f64> {
        Complex::new(self.domain.sample(&mut self.rng), self.domain.sample(&mut self.rng))
    }

    /// Tries `share` random points, plus whatever neighbourhood searches
    /// they trigger.  Accepted neighbours count against the share.
    fn run(mut self, share: u64, progress: &AtomicU64) -> Sample {
        let config = self.config;
        let (mut drawn, mut refined) = (0, 0);
        while drawn + refined < share {
            let c = self.random_point();
            drawn += 1;
            let z = match config.start {
                StartPoint::Origin => Complex::new(0.0, 0.0),
                StartPoint::Parameter => c,
                StartPoint::Random => self.random_point(),
            };

            let mut done = 1;
            let length = self.attempt(z, c);
            if is_long_orbit(length, config) {
                let nearby = search_nearby(
                    c,
                    |length| is_long_orbit(length, config),
                    |neighbour| self.attempt(z, neighbour),
                );
                done += nearby.accepted;
                refined += nearby.accepted;
            }
            progress.fetch_add(done, Ordering::Relaxed);
        }
        Sample {
            histogram: self.histogram,
            importance: self.importance,
            stats: self.stats,
            drawn,
            refined,
        }
    }

    /// Iterates `(z, c)` and registers the orbit if the policy accepts
    /// it and it is at least `threshold` long.  Returns the number of
    /// pixels registered inside the image.
    fn attempt(&mut self, z: Complex<f64>, c: Complex<f64>) -> u64 {
        let pixels = match self.iteration.iterate(z, c, &mut self.orbit) {
            Some(length) if length >= self.config.threshold => self.registrar.register(
                length,
                &self.orbit,
                &mut self.histogram,
                &mut self.scratch,
            ),
            _ => 0,
        };
        self.stats.attempts += 1;
        if pixels > 0 {
            self.stats.orbits += 1;
            self.stats.pixels += pixels;
        }
        self.note_importance(z, c, pixels);
        pixels
    }

    /// Records how much the sample at c contributed, on the c plane.
    fn note_importance(&mut self, z: Complex<f64>, c: Complex<f64>, pixels: u64) {
        if let (Some(mapper), Some(importance)) = (self.importance_mapper, self.importance.as_mut()) {
            if let Some(offset) = mapper.point_to_offset(z, c) {
                importance.add(offset, pixels as f64 / self.config.iterations as f64);
            }
        }
    }
}

/// Logs the number of completed tries once a second until `done` is
/// disconnected.
fn report_progress(progress: &AtomicU64, total: u64, done: Receiver<()>) {
    loop {
        match done.recv_timeout(Duration::from_secs(1)) {
            Err(RecvTimeoutError::Timeout) => {
                let n = progress.load(Ordering::Relaxed);
                let percent = if total == 0 {
                    100.0
                } else {
                    100.0 * n as f64 / total as f64
                };
                info!("{}/{} orbit tries ({:.1}%)", n, total, percent);
            }
            _ => return,
        }
    }
}

/// Creates `workers` threads which find orbits and store their points
/// in the fractal's histograms.  Returns the orbit ratio: the share of
/// orbit attempts, neighbourhood searches included, that registered at
/// least one pixel.  The full counts are added to `Fractal::stats`.
///
/// Fails before sampling if the coloring cannot be used with this job,
/// and after sampling if the histograms are still entirely black.  In
/// the latter case the (black) histograms are left in place.
pub fn fill_histograms(frac: &mut Fractal, coloring: &dyn Coloring, workers: usize) -> Result<f64> {
    if workers == 0 {
        return Err(BuddhaError::InvalidConfig(
            "at least one worker is required".to_string(),
        ));
    }
    frac.check_coloring(coloring)?;

    let config = frac.config().clone();
    let total = config.total_tries();
    let share = total / workers as u64;
    info!("Config\n{}", config);
    info!(
        "Sampling {} orbit tries with {} workers ({} each), coloring {}",
        total,
        workers,
        share,
        coloring.mode()
    );

    let importance_mapper = if config.importance {
        Some(PlaneMapper::new(
            config.width,
            config.height,
            Plane::Crci,
            config.zoom,
            config.offset,
            config.rotation,
        )?)
    } else {
        None
    };
    let registrar = Registrar {
        mapper: frac.mapper(),
        coloring,
        reference: frac.reference(),
        iterations: config.iterations,
        path_points: config.path_points,
        bezier_level: config.bezier_level,
    };

    let started = Instant::now();
    let progress = AtomicU64::new(0);
    let (done_tx, done_rx) = channel::bounded::<()>(0);

    let samples = crossbeam::scope(|spawner| {
        let progress = &progress;
        let config = &config;
        let importance_mapper = importance_mapper.as_ref();

        let reporter = spawner.spawn(move |_| report_progress(progress, total, done_rx));

        let handles: Vec<_> = (0..workers)
            .map(|n| {
                let rng = Pcg64::seed_from_u64(config.seed.wrapping_add(n as u64 + 1));
                spawner.spawn(move |_| {
                    debug!("worker {} starting", n);
                    Worker::new(config, registrar, importance_mapper, rng).run(share, progress)
                })
            })
            .collect();

        let samples = handles
            .into_iter()
            .enumerate()
            .map(|(n, handle)| handle.join().map_err(|_| BuddhaError::WorkerPanicked(n)))
            .collect::<Result<Vec<Sample>>>();

        drop(done_tx);
        if reporter.join().is_err() {
            warn!("progress reporter panicked");
        }
        samples
    })
    .map_err(|_| BuddhaError::WorkerPanicked(workers))??;

    let mut stats = SampleStats::default();
    for (n, sample) in samples.iter().enumerate() {
        frac.histogram.merge(&sample.histogram)?;
        if let (Some(importance), Some(found)) = (frac.importance.as_mut(), sample.importance.as_ref()) {
            importance.merge(found)?;
        }
        debug!(
            "worker {} drew {} points, {} long neighbours, {} attempts",
            n, sample.drawn, sample.refined, sample.stats.attempts
        );
        stats += sample.stats;
    }
    frac.record(stats);

    let ratio = stats.orbit_ratio();
    info!(
        "Registered {} orbits ({} pixels) in {} attempts, {:.2?}, orbit ratio {:.6}",
        stats.orbits,
        stats.pixels,
        stats.attempts,
        started.elapsed(),
        ratio
    );

    if frac.histogram.is_black() {
        return Err(BuddhaError::BlackRender);
    }
    Ok(ratio)
}
