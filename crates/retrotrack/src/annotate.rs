//! Diagnostic overlay for the operator stream.
//!
//! Draws, per frame: every raw contour (green), every accepted rectangle
//! (blue), the connecting line of every valid pair (red), and for the
//! selected pair a tilted-cross marker plus a thick full-height vertical
//! line through the aiming point (red). All drawing clips at the frame
//! borders.

use nalgebra::Point2;
use retrotrack_core::{ClassifiedShape, Contour, Selection, TargetPair};

use crate::frame::Frame;

pub const CONTOUR_COLOR: [u8; 3] = [0, 255, 0];
pub const SHAPE_COLOR: [u8; 3] = [0, 0, 255];
pub const TARGET_COLOR: [u8; 3] = [255, 0, 0];

const MARKER_HALF_SIZE: i64 = 6;
const AIM_LINE_HALF_WIDTH: i64 = 2;

/// Bresenham line between two pixel-space points.
pub fn draw_line(frame: &mut Frame, from: Point2<f64>, to: Point2<f64>, rgb: [u8; 3]) {
    let (mut x0, mut y0) = (from.x.round() as i64, from.y.round() as i64);
    let (x1, y1) = (to.x.round() as i64, to.y.round() as i64);

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        frame.put_pixel(x0, y0, rgb);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn draw_polyline_closed(frame: &mut Frame, points: &[Point2<f64>], rgb: [u8; 3]) {
    if points.len() < 2 {
        return;
    }
    for i in 0..points.len() {
        draw_line(frame, points[i], points[(i + 1) % points.len()], rgb);
    }
}

fn draw_tilted_cross(frame: &mut Frame, at: Point2<f64>, rgb: [u8; 3]) {
    let r = MARKER_HALF_SIZE as f64;
    draw_line(
        frame,
        Point2::new(at.x - r, at.y - r),
        Point2::new(at.x + r, at.y + r),
        rgb,
    );
    draw_line(
        frame,
        Point2::new(at.x - r, at.y + r),
        Point2::new(at.x + r, at.y - r),
        rgb,
    );
}

fn draw_aim_line(frame: &mut Frame, x: f64, rgb: [u8; 3]) {
    let bottom = frame.height.saturating_sub(1) as f64;
    for offset in -AIM_LINE_HALF_WIDTH..=AIM_LINE_HALF_WIDTH {
        let col = x + offset as f64;
        draw_line(
            frame,
            Point2::new(col, 0.0),
            Point2::new(col, bottom),
            rgb,
        );
    }
}

/// Draw the full diagnostic overlay for one frame.
pub fn annotate(
    frame: &mut Frame,
    contours: &[Contour],
    shapes: &[ClassifiedShape],
    pairs: &[TargetPair],
    selection: Option<&Selection>,
) {
    for contour in contours {
        draw_polyline_closed(frame, &contour.points, CONTOUR_COLOR);
    }

    for s in shapes {
        draw_polyline_closed(frame, &s.shape.corners(), SHAPE_COLOR);
    }

    for pair in pairs {
        draw_line(frame, pair.left.center, pair.right.center, TARGET_COLOR);
    }

    if let Some(sel) = selection {
        draw_tilted_cross(frame, sel.midpoint, TARGET_COLOR);
        draw_aim_line(frame, sel.midpoint.x, TARGET_COLOR);
    }
}
