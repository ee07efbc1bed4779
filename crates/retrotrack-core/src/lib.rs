//! Pure detection geometry for paired retro-reflective vision targets.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! capture frames, talk to a transport, or spawn threads; it turns polygon
//! contours (supplied by an external blob-extraction front end) into a
//! normalized aiming solution:
//!
//! 1. [`min_area_rect`] fits an oriented bounding rectangle to a contour.
//! 2. [`ShapeClassifier`] rejects non-rectangular blobs and tags survivors
//!    as left- or right-tilted target halves.
//! 3. [`pair_shapes`] pairs a left half with the next horizontally aligned
//!    right half in a single left-to-right sweep.
//! 4. [`select_target`] picks the pair closest to frame center and derives
//!    the normalized center offset and the pixel distance ratio.
//! 5. [`resolve`] converts those into a relative heading and a distance
//!    estimate given the camera field of view.
//!
//! "No target" is a value, not an error: the normalized center is `NaN` and
//! every derived quantity stays `NaN`. `0.0` always means "dead on target".

mod contour;
mod logger;
mod pairing;
mod select;
mod shape;

pub mod resolve;
pub mod synthetic;

pub use contour::{convex_hull, min_area_rect, Contour, RotatedRect};
pub use logger::init_with_level;
pub use pairing::{pair_shapes, PairingParams, TargetPair};
pub use select::{normalized_center, select_target, Selection};
pub use shape::{
    AngleWindow, CandidateShape, Classification, ClassifiedShape, ClassifierParams,
    ShapeClassifier, Tilt,
};
