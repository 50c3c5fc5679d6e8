// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Discrete rasterization of orbit paths: straight segments between
//! two pixels, and Bezier curves through a handful of control pixels.

use crate::planes::Pixel;

/// Collects into `points` the pixels on the line from `start` to `end`,
/// both ends included, stopping early after `limit` pixels.  `points`
/// is cleared first so the same buffer can be reused for every segment.
pub fn bresenham(start: Pixel, end: Pixel, limit: usize, points: &mut Vec<Pixel>) {
    points.clear();

    let (mut cx, mut cy) = (start.0 as isize, start.1 as isize);
    let (ex, ey) = (end.0 as isize, end.1 as isize);
    let dx = (ex - cx).abs();
    let dy = (ey - cy).abs();
    let sx = if cx < ex { 1 } else { -1 };
    let sy = if cy < ey { 1 } else { -1 };
    let mut err = dx - dy;

    while points.len() < limit {
        points.push(Pixel(cx as usize, cy as usize));
        if cx == ex && cy == ey {
            return;
        }
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            cx += sx;
        }
        if e2 < dx {
            err += dx;
            cy += sy;
        }
    }
}

/// n choose k, computed without factorials so it stays exact for the
/// small degrees used here.
fn choose(n: usize, k: usize) -> f64 {
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

/// The point at `t` in [0, 1] on the Bezier curve defined by the
/// control points.
pub fn bezier(control: &[(f64, f64)], t: f64) -> (f64, f64) {
    if control.is_empty() {
        return (0.0, 0.0);
    }
    let n = control.len() - 1;
    control
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(x, y), (i, p)| {
            let b = choose(n, i) * t.powi(i as i32) * (1.0 - t).powi((n - i) as i32);
            (x + b * p.0, y + b * p.1)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(start: Pixel, end: Pixel) -> Vec<Pixel> {
        let mut points = Vec::new();
        bresenham(start, end, 1000, &mut points);
        points
    }

    #[test]
    fn horizontal_line() {
        assert_eq!(
            line(Pixel(1, 2), Pixel(4, 2)),
            vec![Pixel(1, 2), Pixel(2, 2), Pixel(3, 2), Pixel(4, 2)]
        );
    }

    #[test]
    fn reversed_diagonal_line() {
        assert_eq!(
            line(Pixel(3, 3), Pixel(0, 0)),
            vec![Pixel(3, 3), Pixel(2, 2), Pixel(1, 1), Pixel(0, 0)]
        );
    }

    #[test]
    fn steep_line_covers_every_row() {
        let points = line(Pixel(0, 0), Pixel(2, 7));
        assert_eq!(points.len(), 8);
        assert_eq!(points[0], Pixel(0, 0));
        assert_eq!(points[7], Pixel(2, 7));
        for (row, p) in points.iter().enumerate() {
            assert_eq!(p.1, row);
        }
    }

    #[test]
    fn single_pixel_line() {
        assert_eq!(line(Pixel(5, 5), Pixel(5, 5)), vec![Pixel(5, 5)]);
    }

    #[test]
    fn limit_truncates_the_line() {
        let mut points = vec![Pixel(9, 9)];
        bresenham(Pixel(0, 0), Pixel(10, 0), 3, &mut points);
        assert_eq!(points, vec![Pixel(0, 0), Pixel(1, 0), Pixel(2, 0)]);
    }

    #[test]
    fn binomials() {
        assert_eq!(choose(4, 0), 1.0);
        assert_eq!(choose(4, 2), 6.0);
        assert_eq!(choose(5, 5), 1.0);
    }

    #[test]
    fn bezier_hits_its_endpoints_and_middle() {
        let control = [(0.0, 0.0), (2.0, 4.0), (4.0, 0.0)];
        assert_eq!(bezier(&control, 0.0), (0.0, 0.0));
        assert_eq!(bezier(&control, 1.0), (4.0, 0.0));
        assert_eq!(bezier(&control, 0.5), (2.0, 2.0));
    }
}
