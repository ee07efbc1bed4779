//! Synthetic contours for tests and deployment smoke checks.

use nalgebra::{Point2, Vector2};

use crate::contour::Contour;

/// Rectangle outline in image coordinates (y down) with its long axis at
/// `long_axis_deg` in the y-up polar frame the classifier windows use
/// (0 pointing right, counter-clockwise positive). Each edge is sampled
/// `points_per_edge` times so the contour looks like real blob-extraction
/// output rather than four ideal corners.
pub fn tilted_rect_contour(
    center: (f64, f64),
    long: f64,
    short: f64,
    long_axis_deg: f64,
    points_per_edge: usize,
) -> Contour {
    let a = long_axis_deg.to_radians();
    let u = Vector2::new(a.cos(), -a.sin()) * (long / 2.0);
    let v = Vector2::new(a.sin(), a.cos()) * (short / 2.0);
    let c = Point2::new(center.0, center.1);
    let corners = [c - u - v, c + u - v, c + u + v, c - u + v];

    let samples = points_per_edge.max(1);
    let mut points = Vec::with_capacity(4 * samples);
    for i in 0..4 {
        let from = corners[i];
        let to = corners[(i + 1) % 4];
        for s in 0..samples {
            let t = s as f64 / samples as f64;
            points.push(from + (to - from) * t);
        }
    }
    Contour::new(points)
}

/// Triangular blob: fills half its bounding rectangle, so it always fails
/// a rectangularity check stricter than 0.5 no matter how it is tilted.
pub fn ragged_blob(center: (f64, f64), size: f64, tilt_deg: f64) -> Contour {
    let a = tilt_deg.to_radians();
    let u = Vector2::new(a.cos(), a.sin()) * size;
    let v = Vector2::new(-a.sin(), a.cos()) * (size / 2.0);
    let c = Point2::new(center.0, center.1);
    Contour::new(vec![c - u, c + u, c + v])
}
