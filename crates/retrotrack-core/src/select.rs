use nalgebra::Point2;

use crate::pairing::TargetPair;

/// The pair chosen for aiming plus the quantities derived from it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Selection {
    pub pair: TargetPair,
    /// Midpoint used for both the math and the overlay marker.
    pub midpoint: Point2<f64>,
    /// Horizontal offset from frame center, scaled into `[-1, 1]`.
    pub normalized_center: f64,
    /// `frame_width_px / pair_pixel_separation`; feeds the distance
    /// estimate and must come from the same pair as the midpoint.
    pub distance_ratio: f64,
}

/// Scale a midpoint x coordinate into `[-1, 1]` around frame center.
///
/// `0.0` means dead center and is a legitimate on-target value; "no
/// target" is expressed as `NaN`, never as a default number.
pub fn normalized_center(mid_x: f64, frame_width: f64) -> f64 {
    2.0 * (mid_x / frame_width - 0.5)
}

/// Pick the pair whose midpoint is horizontally closest to frame center.
///
/// The first pair encountered wins ties, so the left-to-right pair order
/// from the sweep makes the choice deterministic. Returns `None` when no
/// pairs exist.
pub fn select_target(pairs: &[TargetPair], frame_width: f64) -> Option<Selection> {
    let half_width = frame_width / 2.0;
    let mut best: Option<(f64, &TargetPair, Point2<f64>)> = None;
    for pair in pairs {
        let midpoint = pair.midpoint();
        let offset = (midpoint.x - half_width).abs();
        if best.as_ref().is_none_or(|(least, ..)| offset < *least) {
            best = Some((offset, pair, midpoint));
        }
    }

    let (_, pair, midpoint) = best?;
    Some(Selection {
        pair: *pair,
        midpoint,
        normalized_center: normalized_center(midpoint.x, frame_width),
        distance_ratio: frame_width / pair.pixel_separation(),
    })
}
