use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::shape::{CandidateShape, ClassifiedShape, Tilt};

/// Pairing engine parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingParams {
    /// Maximal deviation of the center-to-center line from horizontal.
    pub max_alignment_deg: f64,
}

impl Default for PairingParams {
    fn default() -> Self {
        Self {
            max_alignment_deg: 15.0,
        }
    }
}

/// A left-tilted and a right-tilted shape whose centers lie on a roughly
/// horizontal line, left of the two having the smaller center x.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetPair {
    pub left: CandidateShape,
    pub right: CandidateShape,
}

impl TargetPair {
    /// Midpoint of the two shape centers; the aiming point.
    pub fn midpoint(&self) -> Point2<f64> {
        nalgebra::center(&self.left.center, &self.right.center)
    }

    /// Center-to-center distance in pixels.
    pub fn pixel_separation(&self) -> f64 {
        nalgebra::distance(&self.left.center, &self.right.center)
    }
}

/// Pair left- and right-tilted shapes in a single left-to-right sweep.
///
/// Shapes are sorted ascending by center x. The sweep holds one pending
/// left slot: a later left shape overwrites an unpaired earlier one (most
/// recent wins, which doubles as rejection of duplicate glare blobs). A
/// right shape closes the pending slot only when the two centers pass the
/// horizontal-alignment check; a misaligned right shape is dropped and the
/// pending left stays armed.
pub fn pair_shapes(shapes: &[ClassifiedShape], params: &PairingParams) -> Vec<TargetPair> {
    let mut ordered: Vec<&ClassifiedShape> = shapes.iter().collect();
    ordered.sort_by(|a, b| {
        a.shape
            .center
            .x
            .partial_cmp(&b.shape.center.x)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut pairs = Vec::new();
    let mut pending_left: Option<&CandidateShape> = None;
    for s in ordered {
        match s.tilt {
            Tilt::Left => {
                pending_left = Some(&s.shape);
            }
            Tilt::Right => {
                if let Some(left) = pending_left {
                    if horizontally_aligned(left, &s.shape, params) {
                        pairs.push(TargetPair {
                            left: *left,
                            right: s.shape,
                        });
                        pending_left = None;
                    }
                }
            }
        }
    }
    pairs
}

/// Check that the center-to-center line deviates at most
/// `max_alignment_deg` from horizontal.
///
/// Coincident center x coordinates leave the line angle undefined; such a
/// pair is rejected rather than waved through.
fn horizontally_aligned(
    left: &CandidateShape,
    right: &CandidateShape,
    params: &PairingParams,
) -> bool {
    let dx = right.center.x - left.center.x;
    let dy = right.center.y - left.center.y;
    if dx.abs() < f64::EPSILON {
        debug!(
            "degenerate pair geometry at x={:.1}: alignment angle undefined",
            left.center.x
        );
        return false;
    }
    dy.atan2(dx).to_degrees().abs() <= params.max_alignment_deg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(x: f64, y: f64) -> CandidateShape {
        CandidateShape {
            center: Point2::new(x, y),
            width: 10.0,
            height: 4.0,
            raw_angle_deg: -75.5,
            adjusted_angle_deg: 75.5,
        }
    }

    fn left(x: f64, y: f64) -> ClassifiedShape {
        ClassifiedShape {
            shape: shape(x, y),
            tilt: Tilt::Left,
        }
    }

    fn right(x: f64, y: f64) -> ClassifiedShape {
        ClassifiedShape {
            shape: shape(x, y),
            tilt: Tilt::Right,
        }
    }

    #[test]
    fn pairs_adjacent_left_and_right() {
        let pairs = pair_shapes(
            &[left(10.0, 50.0), right(40.0, 52.0)],
            &PairingParams::default(),
        );
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].left.center.x, 10.0);
        assert_eq!(pairs[0].right.center.x, 40.0);
    }

    #[test]
    fn never_pairs_same_tilt() {
        let params = PairingParams::default();
        assert!(pair_shapes(&[left(10.0, 50.0), left(40.0, 50.0)], &params).is_empty());
        assert!(pair_shapes(&[right(10.0, 50.0), right(40.0, 50.0)], &params).is_empty());
    }

    #[test]
    fn leading_right_shape_is_ignored() {
        let pairs = pair_shapes(
            &[right(5.0, 50.0), left(20.0, 50.0), right(45.0, 50.0)],
            &PairingParams::default(),
        );
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].left.center.x, 20.0);
    }

    #[test]
    fn repeated_lefts_most_recent_wins() {
        let pairs = pair_shapes(
            &[left(10.0, 50.0), left(25.0, 50.0), right(40.0, 50.0)],
            &PairingParams::default(),
        );
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].left.center.x, 25.0);
    }

    #[test]
    fn misaligned_right_is_dropped_but_left_stays_armed() {
        // Second shape sits far below the first: ~45 degrees off horizontal.
        let pairs = pair_shapes(
            &[left(10.0, 50.0), right(40.0, 80.0), right(70.0, 52.0)],
            &PairingParams::default(),
        );
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].right.center.x, 70.0);
    }

    #[test]
    fn coincident_center_x_rejects_the_pair() {
        let pairs = pair_shapes(
            &[left(40.0, 50.0), right(40.0, 50.0)],
            &PairingParams::default(),
        );
        assert!(pairs.is_empty());
    }

    #[test]
    fn order_stability_under_input_shuffle() {
        let shapes = [
            left(10.0, 50.0),
            right(40.0, 50.0),
            left(70.0, 50.0),
            right(100.0, 50.0),
        ];
        let params = PairingParams::default();
        let expected = pair_shapes(&shapes, &params);
        assert_eq!(expected.len(), 2);

        let shuffled = [shapes[3], shapes[0], shapes[2], shapes[1]];
        assert_eq!(pair_shapes(&shuffled, &params), expected);
    }

    #[test]
    fn emits_multiple_pairs_left_to_right() {
        let pairs = pair_shapes(
            &[
                left(10.0, 50.0),
                right(30.0, 50.0),
                left(60.0, 50.0),
                right(90.0, 48.0),
            ],
            &PairingParams::default(),
        );
        assert_eq!(pairs.len(), 2);
        assert!(pairs[0].midpoint().x < pairs[1].midpoint().x);
    }
}
