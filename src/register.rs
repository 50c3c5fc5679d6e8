// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Writing an accepted orbit into the histogram.  The coloring mode
//! decides how: every point in one color, every point in its own
//! color, lines between the points, the angle between neighbouring
//! points, or colors taken from a reference image.  Every variant
//! returns the number of pixels it added weight to.

use image::RgbImage;
use num::Complex;

use crate::coloring::{reference_color, Coloring, ColoringMode, Rgb};
use crate::histogram::Histogram;
use crate::orbit::Orbit;
use crate::paths::{bezier, bresenham};
use crate::planes::{Pixel, PlaneMapper};

/// Everything needed to register orbits, borrowed from the fractal
/// job.  Shared read-only between workers.
#[derive(Clone, Copy)]
pub struct Registrar<'a> {
    /// Maps orbit points to pixels.
    pub mapper: &'a PlaneMapper,
    /// The coloring policy.
    pub coloring: &'a dyn Coloring,
    /// Reference image for image-trap coloring.
    pub reference: Option<&'a RgbImage>,
    /// The iteration cap, used to scale whole-orbit colors.
    pub iterations: usize,
    /// The most pixels drawn for one path segment or curve.
    pub path_points: usize,
    /// Degree of the Bezier curves in path mode; 1 draws straight lines.
    pub bezier_level: usize,
}

impl<'a> Registrar<'a> {
    /// Registers the first `length` points of `orbit` into `histogram`.
    /// `scratch` is a reusable buffer for rasterized lines.
    pub fn register(
        &self,
        length: usize,
        orbit: &Orbit,
        histogram: &mut Histogram,
        scratch: &mut Vec<Pixel>,
    ) -> u64 {
        let points = &orbit.points[..length];
        match self.coloring.mode() {
            ColoringMode::Modulo | ColoringMode::IterationCount => {
                self.register_orbit(points, orbit.c, histogram)
            }
            ColoringMode::OrbitLength => self.register_colored_orbit(points, orbit.c, histogram),
            ColoringMode::VectorField => self.register_field(points, orbit.c, histogram),
            ColoringMode::Path if self.bezier_level <= 1 => {
                self.register_linear(points, orbit.c, histogram, scratch)
            }
            ColoringMode::Path => self.register_bezier(points, orbit.c, histogram),
            ColoringMode::Image => self.register_image(points, orbit.c, histogram),
        }
    }

    #[inline]
    fn register_point(&self, z: Complex<f64>, c: Complex<f64>, color: Rgb, h: &mut Histogram) -> u64 {
        match self.mapper.point_to_offset(z, c) {
            Some(offset) => {
                h.increase(offset, color);
                1
            }
            None => 0,
        }
    }

    /// Every point in the color of the orbit's length.
    fn register_orbit(&self, points: &[Complex<f64>], c: Complex<f64>, h: &mut Histogram) -> u64 {
        let color = self.coloring.get(points.len(), self.iterations);
        points
            .iter()
            .map(|&z| self.register_point(z, c, color, h))
            .sum()
    }

    /// Every point in the color of its position along the orbit.
    fn register_colored_orbit(
        &self,
        points: &[Complex<f64>],
        c: Complex<f64>,
        h: &mut Histogram,
    ) -> u64 {
        let length = points.len();
        points
            .iter()
            .enumerate()
            .map(|(i, &z)| self.register_point(z, c, self.coloring.get(i, length), h))
            .sum()
    }

    /// Every point but the last, colored by the angle it makes with the
    /// point after it.
    fn register_field(&self, points: &[Complex<f64>], c: Complex<f64>, h: &mut Histogram) -> u64 {
        points
            .windows(2)
            .filter_map(|w| angle_color(self.coloring, w[0], w[1]).map(|color| (w[0], color)))
            .map(|(z, color)| self.register_point(z, c, color, h))
            .sum()
    }

    /// Colors the points from the reference image at their own pixel.
    fn register_image(&self, points: &[Complex<f64>], c: Complex<f64>, h: &mut Histogram) -> u64 {
        let reference = match self.reference {
            Some(reference) => reference,
            None => return 0,
        };
        let mut sum = 0;
        for &z in points {
            if let Some(pixel) = self.mapper.point_to_pixel(z, c) {
                let color = reference_color(reference, pixel);
                h.increase(self.mapper.pixel_to_offset(pixel), color);
                sum += 1;
            }
        }
        sum
    }

    /// Straight lines between consecutive points, in the color of the
    /// orbit's length.  Segments with an end outside the image are
    /// skipped.
    fn register_linear(
        &self,
        points: &[Complex<f64>],
        c: Complex<f64>,
        h: &mut Histogram,
        scratch: &mut Vec<Pixel>,
    ) -> u64 {
        let color = self.coloring.get(points.len(), self.iterations);
        let mut sum = 0;
        for w in points.windows(2) {
            let (a, b) = match (self.mapper.point_to_pixel(w[0], c), self.mapper.point_to_pixel(w[1], c)) {
                (Some(a), Some(b)) => (a, b),
                _ => continue,
            };
            bresenham(a, b, self.path_points, scratch);
            for &pixel in scratch.iter() {
                h.increase(self.mapper.pixel_to_offset(pixel), color);
            }
            sum += scratch.len() as u64;
        }
        sum
    }

    /// Bezier curves through runs of `bezier_level + 1` points.  Each
    /// curve is colored by the angle between its first and last point,
    /// and consecutive curves share their end points.
    fn register_bezier(&self, points: &[Complex<f64>], c: Complex<f64>, h: &mut Histogram) -> u64 {
        let level = self.bezier_level;
        let (width, height) = self.mapper.bounds;
        let mut control: Vec<(f64, f64)> = Vec::with_capacity(level + 1);
        let mut sum = 0;

        let mut i = 0;
        while i + level < points.len() {
            let window = &points[i..=i + level];
            i += level;

            control.clear();
            for &z in window {
                match self.mapper.point_to_pixel(z, c) {
                    Some(p) => control.push((p.0 as f64, p.1 as f64)),
                    None => break,
                }
            }
            if control.len() != window.len() {
                continue;
            }
            let color = match angle_color(self.coloring, window[0], window[level]) {
                Some(color) => color,
                None => continue,
            };

            for step in 0..self.path_points {
                let t = step as f64 / self.path_points as f64;
                let (x, y) = bezier(&control, t);
                let pixel = Pixel(x as usize, y as usize);
                if pixel.0 < width && pixel.1 < height {
                    h.increase(self.mapper.pixel_to_offset(pixel), color);
                    sum += 1;
                }
            }
        }
        sum
    }
}

/// The gradient color for the angle between two points, taken from
/// their dot product and normalized to [0, 1].  Points at the origin
/// have no angle and produce no color.
pub fn angle_color(coloring: &dyn Coloring, u: Complex<f64>, v: Complex<f64>) -> Option<Rgb> {
    let cos_alpha = (u.re * v.re + u.im * v.im) / (u.norm() * v.norm());
    if !cos_alpha.is_finite() {
        return None;
    }
    Some(coloring.lookup((1.0 + cos_alpha) / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coloring::{Gradient, Palette};
    use crate::planes::Plane;

    const RED: Rgb = Rgb {
        r: 1.0,
        g: 0.0,
        b: 0.0,
    };
    const BLUE: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 1.0,
    };

    fn palette(mode: ColoringMode) -> Palette {
        let gradient = Gradient::uniform(vec![RED, BLUE], Rgb::new(0.0, 1.0, 0.0), 100).unwrap();
        Palette::new(mode, gradient, vec![]).unwrap()
    }

    fn mapper() -> PlaneMapper {
        PlaneMapper::new(16, 16, Plane::Zrzi, 1.0, Complex::new(0.0, 0.0), 0.0).unwrap()
    }

    fn orbit_of(points: &[(f64, f64)]) -> Orbit {
        let mut orbit = Orbit::new(points.len());
        for (i, p) in points.iter().enumerate() {
            orbit.points[i] = Complex::new(p.0, p.1);
        }
        orbit
    }

    fn registrar<'a>(mapper: &'a PlaneMapper, coloring: &'a Palette) -> Registrar<'a> {
        Registrar {
            mapper,
            coloring,
            reference: None,
            iterations: 100,
            path_points: 64,
            bezier_level: 1,
        }
    }

    #[test]
    fn points_outside_the_image_are_dropped() {
        let (m, p) = (mapper(), palette(ColoringMode::OrbitLength));
        let r = registrar(&m, &p);
        let orbit = orbit_of(&[(0.0, 0.0), (5.0, 5.0), (0.5, 0.5), (std::f64::NAN, 0.0)]);
        let mut h = Histogram::new(16, 16);
        assert_eq!(r.register(4, &orbit, &mut h, &mut Vec::new()), 2);
        // First point at progress 0 is red, third at progress 1/2.
        assert_eq!(h.r.get(Pixel(8, 8)), 1.0);
        assert!(h.b.get(Pixel(10, 10)) > 0.0);
    }

    #[test]
    fn length_limits_the_registered_prefix() {
        let (m, p) = (mapper(), palette(ColoringMode::Modulo));
        let r = registrar(&m, &p);
        let orbit = orbit_of(&[(0.0, 0.0), (0.5, 0.5), (1.0, 1.0)]);
        let mut h = Histogram::new(16, 16);
        assert_eq!(r.register(2, &orbit, &mut h, &mut Vec::new()), 2);
        assert!(h.g.get(Pixel(12, 12)) == 0.0);
        // Short orbits get the base color under modulo coloring.
        assert_eq!(h.g.get(Pixel(8, 8)), 1.0);
    }

    #[test]
    fn path_mode_draws_lines() {
        let (m, p) = (mapper(), palette(ColoringMode::Path));
        let r = registrar(&m, &p);
        // Pixel (8, 8) to pixel (12, 8).
        let orbit = orbit_of(&[(0.0, 0.0), (1.0, 0.0)]);
        let mut h = Histogram::new(16, 16);
        assert_eq!(r.register(2, &orbit, &mut h, &mut Vec::new()), 5);
        for x in 8..=12 {
            assert!(h.g.get(Pixel(x, 8)) > 0.0 || h.r.get(Pixel(x, 8)) > 0.0);
        }
        assert!(h.r.get(Pixel(13, 8)) == 0.0 && h.g.get(Pixel(13, 8)) == 0.0);
    }

    #[test]
    fn bezier_paths_stay_inside() {
        let (m, p) = (mapper(), palette(ColoringMode::Path));
        let mut r = registrar(&m, &p);
        r.bezier_level = 2;
        r.path_points = 10;
        let orbit = orbit_of(&[(0.1, 0.1), (1.0, 0.5), (0.5, -1.0), (-1.0, -1.0), (-1.0, 1.0)]);
        let mut h = Histogram::new(16, 16);
        // Two curves of ten samples each.
        assert_eq!(r.register(5, &orbit, &mut h, &mut Vec::new()), 20);
    }

    #[test]
    fn vector_field_skips_the_origin() {
        let (m, p) = (mapper(), palette(ColoringMode::VectorField));
        let r = registrar(&m, &p);
        let orbit = orbit_of(&[(0.5, 0.0), (0.0, 0.0), (-0.5, 0.0), (0.5, 0.0)]);
        let mut h = Histogram::new(16, 16);
        // (0.5, 0) -> origin and origin -> (-0.5, 0) have no angle.
        assert_eq!(r.register(4, &orbit, &mut h, &mut Vec::new()), 1);
        // Opposite directions: cos = -1, the very start of the gradient.
        assert_eq!(h.r.get(Pixel(6, 8)), 1.0);
        assert!(h.cells_are_finite());
    }

    #[test]
    fn image_mode_reads_the_reference() {
        let (m, p) = (mapper(), palette(ColoringMode::Image));
        let mut reference = RgbImage::new(4, 4);
        reference.put_pixel(0, 0, image::Rgb([0, 255, 0]));
        let mut r = registrar(&m, &p);
        r.reference = Some(&reference);
        let orbit = orbit_of(&[(0.0, 0.0)]);
        let mut h = Histogram::new(16, 16);
        assert_eq!(r.register(1, &orbit, &mut h, &mut Vec::new()), 1);
        // Pixel (8, 8) wraps to (0, 0) of the 4x4 reference.
        assert_eq!(h.g.get(Pixel(8, 8)), 1.0);
        assert_eq!(h.r.get(Pixel(8, 8)), 0.0);
    }

    impl Histogram {
        fn cells_are_finite(&self) -> bool {
            self.r
                .cells()
                .iter()
                .chain(self.g.cells())
                .chain(self.b.cells())
                .all(|v| v.is_finite())
        }
    }
}
