//! Projective (four-point) warp used to lay the crawl back into the distance.

use crate::foundation::core::Point;
use crate::foundation::error::{CrawlError, CrawlResult};
use crate::raster::Raster;

const EPS: f64 = 1e-12;

/// 3x3 projective transform, row-major, normalized so the last coefficient is 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    m: [f64; 9],
}

impl Homography {
    pub fn identity() -> Self {
        Self {
            m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        }
    }

    /// Estimate the transform taking each `from[i]` onto `to[i]`.
    pub fn from_quads(from: &[Point; 4], to: &[Point; 4]) -> CrawlResult<Self> {
        // Unknowns: [h11 h12 h13 h21 h22 h23 h31 h32], h33 = 1.
        let mut a = [[0.0f64; 9]; 8];
        for i in 0..4 {
            let (x, y) = (from[i].x, from[i].y);
            let (u, v) = (to[i].x, to[i].y);
            a[2 * i] = [x, y, 1.0, 0.0, 0.0, 0.0, -x * u, -y * u, u];
            a[2 * i + 1] = [0.0, 0.0, 0.0, x, y, 1.0, -x * v, -y * v, v];
        }
        let h = solve_8x8(&mut a)?;
        Ok(Self {
            m: [h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0],
        })
    }

    /// Map `p`; `None` when `p` lies on the line sent to infinity.
    pub fn apply(&self, p: Point) -> Option<Point> {
        let m = &self.m;
        let w = m[6] * p.x + m[7] * p.y + m[8];
        if w.abs() < EPS {
            return None;
        }
        Some(Point::new(
            (m[0] * p.x + m[1] * p.y + m[2]) / w,
            (m[3] * p.x + m[4] * p.y + m[5]) / w,
        ))
    }
}

/// Gaussian elimination with partial pivoting on an augmented 8x9 system.
fn solve_8x8(a: &mut [[f64; 9]; 8]) -> CrawlResult<[f64; 8]> {
    for col in 0..8 {
        let pivot = (col..8)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < EPS {
            return Err(CrawlError::render(
                "degenerate quad: point correspondences do not define a projective transform",
            ));
        }
        a.swap(col, pivot);

        for row in (col + 1)..8 {
            let f = a[row][col] / a[col][col];
            if f == 0.0 {
                continue;
            }
            for k in col..9 {
                a[row][k] -= f * a[col][k];
            }
        }
    }

    let mut x = [0.0f64; 8];
    for row in (0..8).rev() {
        let mut acc = a[row][8];
        for k in (row + 1)..8 {
            acc -= a[row][k] * x[k];
        }
        x[row] = acc / a[row][row];
    }
    Ok(x)
}

/// Squeeze `src` into a trapezoid with its short base on top.
///
/// The source rectangle `(0,0) (X,0) (X,Y) (0,Y)` lands on
/// `(cx X, cy Y) ((1-cx) X, cy Y) (X,Y) (0,Y)`; the output keeps the source size and everything
/// outside the trapezoid is transparent. A source with no rows produces a transparent raster of
/// `empty_rows` rows.
pub fn trapezoid_warp(src: &Raster, cx: f64, cy: f64, empty_rows: u32) -> CrawlResult<Raster> {
    if src.height == 0 {
        return Ok(Raster::transparent(src.width, empty_rows));
    }
    if src.width == 0 {
        return Ok(Raster::transparent(0, src.height));
    }

    let xw = f64::from(src.width);
    let yh = f64::from(src.height);
    let rect = [
        Point::new(0.0, 0.0),
        Point::new(xw, 0.0),
        Point::new(xw, yh),
        Point::new(0.0, yh),
    ];
    let trapezoid = [
        Point::new(cx * xw, cy * yh),
        Point::new((1.0 - cx) * xw, cy * yh),
        Point::new(xw, yh),
        Point::new(0.0, yh),
    ];
    // Output pixels pull from the source, so estimate trapezoid -> rectangle.
    let inverse = Homography::from_quads(&trapezoid, &rect)?;

    let mut out = Raster::transparent(src.width, src.height);
    let first_row = ((cy * yh).floor() as i64 - 1).max(0) as u32;
    for row in first_row..src.height {
        for col in 0..src.width {
            let Some(p) = inverse.apply(Point::new(f64::from(col), f64::from(row))) else {
                continue;
            };
            let px = sample_bilinear(src, p.x, p.y);
            if px[3] == 0 {
                continue;
            }
            let i = ((row as usize) * (src.width as usize) + col as usize) * 4;
            out.data[i..i + 4].copy_from_slice(&px);
        }
    }
    Ok(out)
}

/// Bilinear sample at pixel-center coordinates; neighbors outside the raster are transparent.
fn sample_bilinear(src: &Raster, x: f64, y: f64) -> [u8; 4] {
    let w = f64::from(src.width);
    let h = f64::from(src.height);
    if !x.is_finite() || !y.is_finite() || x <= -1.0 || y <= -1.0 || x >= w || y >= h {
        return [0; 4];
    }

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = (x - x0) as f32;
    let fy = (y - y0) as f32;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let fetch = |xi: i64, yi: i64| -> [f32; 4] {
        if xi < 0 || yi < 0 || xi >= i64::from(src.width) || yi >= i64::from(src.height) {
            return [0.0; 4];
        }
        let i = ((yi as usize) * (src.width as usize) + xi as usize) * 4;
        [
            f32::from(src.data[i]),
            f32::from(src.data[i + 1]),
            f32::from(src.data[i + 2]),
            f32::from(src.data[i + 3]),
        ]
    };

    let p00 = fetch(x0, y0);
    let p10 = fetch(x0 + 1, y0);
    let p01 = fetch(x0, y0 + 1);
    let p11 = fetch(x0 + 1, y0 + 1);
    let w00 = (1.0 - fx) * (1.0 - fy);
    let w10 = fx * (1.0 - fy);
    let w01 = (1.0 - fx) * fy;
    let w11 = fx * fy;

    let mut out = [0u8; 4];
    for c in 0..4 {
        let v = p00[c] * w00 + p10[c] * w10 + p01[c] * w01 + p11[c] * w11;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn same_quads_give_identity() {
        let q = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(0.0, 5.0),
        ];
        let h = Homography::from_quads(&q, &q).unwrap();
        let p = Point::new(3.25, 1.5);
        assert!(close(h.apply(p).unwrap(), p));
        assert!(close(
            Homography::identity().apply(p).unwrap(),
            h.apply(p).unwrap()
        ));
    }

    #[test]
    fn corners_map_onto_target_quad() {
        let from = [
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 50.0),
            Point::new(0.0, 50.0),
        ];
        let to = [
            Point::new(20.0, 15.0),
            Point::new(80.0, 15.0),
            Point::new(100.0, 50.0),
            Point::new(0.0, 50.0),
        ];
        let h = Homography::from_quads(&from, &to).unwrap();
        for i in 0..4 {
            assert!(close(h.apply(from[i]).unwrap(), to[i]));
        }
    }

    #[test]
    fn collinear_points_are_rejected() {
        let line = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(3.0, 0.0),
        ];
        assert!(Homography::from_quads(&line, &line).is_err());
    }

    #[test]
    fn trapezoid_warp_clears_outside_and_keeps_inside() {
        let src = Raster::solid(100, 100, [0, 200, 200, 255]);
        let out = trapezoid_warp(&src, 0.2, 0.3, 7).unwrap();
        assert_eq!((out.width, out.height), (100, 100));

        // Above the short base.
        assert_eq!(out.pixel(50, 10), [0, 0, 0, 0]);
        // Left of the slanted edge (edge is at x ~= 14.3 on row 50).
        assert_eq!(out.pixel(5, 50), [0, 0, 0, 0]);
        // Well inside.
        assert_eq!(out.pixel(50, 50), [0, 200, 200, 255]);
        assert_eq!(out.pixel(50, 98), [0, 200, 200, 255]);
    }

    #[test]
    fn trapezoid_warp_of_empty_source_uses_requested_rows() {
        let out = trapezoid_warp(&Raster::transparent(12, 0), 0.2, 0.3, 7).unwrap();
        assert_eq!((out.width, out.height), (12, 7));
        assert!(out.data.iter().all(|&b| b == 0));
    }
}
