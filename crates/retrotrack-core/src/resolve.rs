//! Heading and distance from a normalized aiming solution.
//!
//! Uses similar triangles on the known physical separation of the two
//! target halves:
//!
//! ```text
//! d = ratio * T / (2 * tan(fov / 2))
//! ```
//!
//! where `ratio = frame_width_px / pair_pixel_separation`, `T` is the
//! physical center-to-center spacing and `fov` the camera's horizontal
//! field of view. A `NaN` input stays `NaN`; callers must never replace it
//! with a default number.

/// Physical center-to-center spacing of the two target halves, in inches.
pub const TARGET_CENTER_SPACING: f64 = 11.267601903166459;

/// Relative heading in degrees: half the field of view at full deflection.
pub fn relative_heading_deg(normalized_center: f64, fov_deg: f64) -> f64 {
    normalized_center * fov_deg / 2.0
}

/// Distance to the selected pair, in the units of
/// [`TARGET_CENTER_SPACING`].
pub fn distance_to_target(distance_ratio: f64, fov_deg: f64) -> f64 {
    distance_ratio * TARGET_CENTER_SPACING / (2.0 * (fov_deg / 2.0).to_radians().tan())
}
