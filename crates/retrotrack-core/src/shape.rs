use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::contour::{min_area_rect, Contour, RotatedRect};

/// Open angle interval in degrees; both bounds are exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AngleWindow {
    pub lo_deg: f64,
    pub hi_deg: f64,
}

impl AngleWindow {
    pub fn contains(&self, angle_deg: f64) -> bool {
        angle_deg > self.lo_deg && angle_deg < self.hi_deg
    }
}

/// Shape classifier parameters (rectangle-fit variant).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierParams {
    /// Minimal `min(area) / max(area)` ratio between the contour and its
    /// bounding rectangle for the contour to count as rectangular.
    pub min_rect_ratio: f64,

    /// Adjusted-angle window for a left-tilted target half.
    pub left_window: AngleWindow,

    /// Adjusted-angle window for a right-tilted target half. Disjoint from
    /// the left window.
    pub right_window: AngleWindow,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            min_rect_ratio: 0.85,
            left_window: AngleWindow {
                lo_deg: 55.7,
                hi_deg: 85.7,
            },
            right_window: AngleWindow {
                lo_deg: 94.3,
                hi_deg: 124.3,
            },
        }
    }
}

/// Oriented bounding-shape fit for one contour. Derived once, immutable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CandidateShape {
    pub center: Point2<f64>,
    pub width: f64,
    pub height: f64,
    pub raw_angle_deg: f64,
    pub adjusted_angle_deg: f64,
}

impl CandidateShape {
    pub fn from_rect(rect: &RotatedRect) -> Self {
        Self {
            center: rect.center,
            width: rect.width,
            height: rect.height,
            raw_angle_deg: rect.angle_deg,
            adjusted_angle_deg: adjusted_angle_deg(rect),
        }
    }

    /// Corner points of the fitted rectangle, for the overlay.
    pub fn corners(&self) -> [Point2<f64>; 4] {
        RotatedRect {
            center: self.center,
            width: self.width,
            height: self.height,
            angle_deg: self.raw_angle_deg,
        }
        .corners()
    }
}

/// Normalize the reported rectangle angle to a y-up polar angle in
/// `[0, 180)`, where 0 is parallel to the x axis pointing right.
///
/// The bounding-rectangle fit reports its angle relative to whichever side
/// it calls the width, so the same physical orientation can surface as two
/// different raw angles. Folding through the taller-than-wide case removes
/// that degeneracy.
pub fn adjusted_angle_deg(rect: &RotatedRect) -> f64 {
    if rect.width < rect.height {
        90.0 - rect.angle_deg
    } else {
        -rect.angle_deg
    }
}

/// Which way a classified target half leans.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tilt {
    Left,
    Right,
}

/// Outcome of classifying one adjusted angle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    Left,
    Right,
    Rejected,
}

/// A shape that survived classification.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassifiedShape {
    pub shape: CandidateShape,
    pub tilt: Tilt,
}

/// Rejects non-rectangular contours and tags survivors by tilt.
#[derive(Clone, Debug, Default)]
pub struct ShapeClassifier {
    params: ClassifierParams,
}

impl ShapeClassifier {
    pub fn new(params: ClassifierParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ClassifierParams {
        &self.params
    }

    /// Pure window test on an adjusted angle.
    pub fn classify_angle(&self, adjusted_angle_deg: f64) -> Classification {
        if self.params.left_window.contains(adjusted_angle_deg) {
            Classification::Left
        } else if self.params.right_window.contains(adjusted_angle_deg) {
            Classification::Right
        } else {
            Classification::Rejected
        }
    }

    /// Fit a rectangle to the contour and classify it.
    ///
    /// Returns `None` when the fit is degenerate, the contour is not
    /// rectangular enough, or the adjusted angle falls outside both tilt
    /// windows.
    pub fn classify_contour(&self, contour: &Contour) -> Option<ClassifiedShape> {
        let rect = min_area_rect(contour)?;

        let contour_area = contour.area();
        let rect_area = rect.area();
        let ratio = contour_area.min(rect_area) / contour_area.max(rect_area);
        if !(ratio >= self.params.min_rect_ratio) {
            debug!(
                "rejected contour: rectangularity {:.3} (contour {:.1}px², rect {:.1}px²)",
                ratio, contour_area, rect_area
            );
            return None;
        }

        let shape = CandidateShape::from_rect(&rect);
        let tilt = match self.classify_angle(shape.adjusted_angle_deg) {
            Classification::Left => Tilt::Left,
            Classification::Right => Tilt::Right,
            Classification::Rejected => {
                debug!(
                    "rejected contour: adjusted angle {:.1}° outside both tilt windows",
                    shape.adjusted_angle_deg
                );
                return None;
            }
        };

        Some(ClassifiedShape { shape, tilt })
    }
}
