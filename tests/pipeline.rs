// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate buddhabrot;
extern crate image;

use buddhabrot::{
    fill_histograms, BuddhaError, ColoringMode, Fractal, FractalConfig, Gradient, Histogram,
    MapFunction, Palette, Plane, Registration, Rgb,
};

fn palette(mode: ColoringMode) -> Palette {
    let colors = vec![
        Rgb::new(0.0, 0.0, 1.0),
        Rgb::new(0.0, 1.0, 0.0),
        Rgb::new(1.0, 0.0, 0.0),
    ];
    let gradient = Gradient::uniform(colors, Rgb::new(0.5, 0.5, 0.5), 512).unwrap();
    Palette::new(mode, gradient, vec![0.0, 0.3, 0.6]).unwrap()
}

fn small(seed: u64) -> FractalConfig {
    FractalConfig {
        width: 48,
        height: 48,
        iterations: 150,
        tries: 2.0,
        seed,
        ..FractalConfig::default()
    }
}

fn render(config: FractalConfig, mode: ColoringMode, workers: usize) -> (Fractal, f64) {
    let mut frac = Fractal::new(config).unwrap();
    let ratio = fill_histograms(&mut frac, &palette(mode), workers).unwrap();
    (frac, ratio)
}

fn same(a: &Histogram, b: &Histogram) -> bool {
    a.r.cells() == b.r.cells() && a.g.cells() == b.g.cells() && a.b.cells() == b.b.cells()
}

#[test]
fn escaping_orbits_end_to_end() {
    let config = FractalConfig {
        width: 64,
        height: 64,
        iterations: 200,
        bailout: 4.0,
        map: MapFunction::Quadratic,
        registration: Registration::Escape,
        tries: 5.0,
        seed: 42,
        ..FractalConfig::default()
    };
    let (frac, ratio) = render(config, ColoringMode::Modulo, 1);
    assert!(ratio > 0.0 && ratio < 1.0, "ratio {}", ratio);
    let (r, g, b) = frac.histogram.max();
    assert!(r > 0.0 || g > 0.0 || b > 0.0);
    assert!(frac.histogram.r.cells().iter().all(|&v| v >= 0.0 && v.is_finite()));
}

#[test]
fn same_seed_and_workers_render_identically() {
    let (first, first_ratio) = render(small(7), ColoringMode::OrbitLength, 3);
    let (second, second_ratio) = render(small(7), ColoringMode::OrbitLength, 3);
    assert!(same(&first.histogram, &second.histogram));
    assert_eq!(first_ratio, second_ratio);
}

#[test]
fn different_seeds_render_differently() {
    let (first, _) = render(small(1), ColoringMode::OrbitLength, 2);
    let (second, _) = render(small(2), ColoringMode::OrbitLength, 2);
    assert!(!same(&first.histogram, &second.histogram));
}

#[test]
fn clear_then_refill_repeats_the_render() {
    let (mut frac, ratio) = render(small(11), ColoringMode::Modulo, 2);
    let before = frac.histogram.clone();

    frac.clear();
    assert!(frac.histogram.is_black());

    let again = fill_histograms(&mut frac, &palette(ColoringMode::Modulo), 2).unwrap();
    assert_eq!(ratio, again);
    assert!(same(&before, &frac.histogram));
}

#[test]
fn merging_renders_is_commutative() {
    let (a, _) = render(small(3), ColoringMode::OrbitLength, 2);
    let (b, _) = render(small(4), ColoringMode::OrbitLength, 2);

    let mut ab = a.histogram.clone();
    ab.merge(&b.histogram).unwrap();
    let mut ba = b.histogram.clone();
    ba.merge(&a.histogram).unwrap();
    assert!(same(&ab, &ba));

    let (ra, _, _) = a.histogram.max();
    let (rab, _, _) = ab.max();
    assert!(rab >= ra);
}

#[test]
fn merging_different_sizes_fails() {
    let (a, _) = render(small(5), ColoringMode::Modulo, 1);
    let mut other = Histogram::new(32, 48);
    match other.merge(&a.histogram) {
        Err(BuddhaError::SizeMismatch(32, 48, 48, 48)) => {}
        res => panic!("unexpected merge result: {:?}", res),
    }
    assert!(other.is_black());
}

#[test]
fn anti_buddhabrot_registers_bounded_orbits() {
    let config = FractalConfig {
        registration: Registration::Converged,
        tries: 4.0,
        ..small(9)
    };
    let (frac, ratio) = render(config, ColoringMode::OrbitLength, 2);
    assert!(ratio > 0.0 && ratio < 1.0);
    assert!(!frac.histogram.is_black());
}

#[test]
fn every_coloring_mode_renders() {
    for &mode in &[
        ColoringMode::Modulo,
        ColoringMode::IterationCount,
        ColoringMode::OrbitLength,
        ColoringMode::VectorField,
        ColoringMode::Path,
    ] {
        let (frac, _) = render(small(13), mode, 2);
        assert!(!frac.histogram.is_black(), "{} rendered black", mode);
    }
}

#[test]
fn bezier_paths_render() {
    let config = FractalConfig {
        bezier_level: 3,
        path_points: 20,
        ..small(17)
    };
    let (frac, _) = render(config, ColoringMode::Path, 2);
    assert!(!frac.histogram.is_black());
}

#[test]
fn other_maps_and_planes_render() {
    let config = FractalConfig {
        map: MapFunction::BurningShip,
        plane: Plane::Zrcr,
        registration: Registration::Primitive,
        ..small(19)
    };
    let (frac, _) = render(config, ColoringMode::OrbitLength, 2);
    assert!(!frac.histogram.is_black());
}

#[test]
fn image_coloring_reads_the_reference() {
    let mut frac = Fractal::new(small(23)).unwrap();
    frac.set_reference(image::RgbImage::from_pixel(5, 5, image::Rgb([0, 255, 0])));
    fill_histograms(&mut frac, &palette(ColoringMode::Image), 2).unwrap();

    let (r, g, b) = frac.histogram.max();
    assert_eq!(r, 0.0);
    assert!(g > 0.0);
    assert_eq!(b, 0.0);
}

#[test]
fn primitive_orbit_ratio_stays_a_fraction() {
    let config = FractalConfig {
        width: 32,
        height: 32,
        iterations: 200,
        registration: Registration::Primitive,
        tries: 1.0,
        seed: 5,
        ..FractalConfig::default()
    };
    let (frac, ratio) = render(config, ColoringMode::OrbitLength, 1);
    let stats = frac.stats();
    assert!(ratio > 0.0 && ratio <= 1.0, "primitive ratio {}", ratio);
    assert!(stats.orbits <= stats.attempts);
    assert!(stats.pixel_ratio() >= ratio);
}
