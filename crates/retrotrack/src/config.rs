//! Deployment configuration, read from a JSON file on the vision
//! coprocessor (conventionally `/boot/vision.json`).
//!
//! Every field has a default, so a missing or sparse file degrades to the
//! documented deployment values rather than failing the boot.

use std::fs;
use std::path::Path;

use log::warn;
use retrotrack_core::{ClassifierParams, PairingParams};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Horizontal field of view used when the camera entry does not carry one.
/// The common deployment lens is 150 degrees; one narrow variant uses 60.
pub const DEFAULT_FOV_DEG: f64 = 150.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not open '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("config error in '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level configuration for the targeting subsystem.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub camera: CameraConfig,
    pub link: LinkConfig,
    pub detector: DetectorConfig,
}

impl VisionConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Capture settings, passed through to the camera driver, plus the fields
/// this subsystem reads itself (dimensions and field of view).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub name: String,
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub fps: Option<u32>,
    /// Horizontal field of view in degrees; optional, deployment dependent.
    pub fov_deg: Option<f64>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            name: "camera0".to_owned(),
            path: "/dev/video0".to_owned(),
            width: 320,
            height: 240,
            fps: None,
            fov_deg: None,
        }
    }
}

impl CameraConfig {
    /// Configured field of view, or [`DEFAULT_FOV_DEG`] with a logged
    /// warning when absent or non-positive.
    pub fn fov_or_default(&self) -> f64 {
        match self.fov_deg {
            Some(fov) if fov > 0.0 => fov,
            Some(fov) => {
                warn!("ignoring non-positive FOV {fov}; using {DEFAULT_FOV_DEG} degrees");
                DEFAULT_FOV_DEG
            }
            None => {
                warn!("no camera FOV configured; using {DEFAULT_FOV_DEG} degrees");
                DEFAULT_FOV_DEG
            }
        }
    }
}

/// Transport-link supervision settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Key prefix the targeting records publish under.
    pub table: String,
    /// Key of the remote controller's periodic liveness value.
    pub heartbeat_key: String,
    /// Heartbeat age at which the link counts as lost.
    pub stale_after_ms: u64,
    /// Watchdog poll cadence.
    pub poll_interval_ms: u64,
    /// Wall-clock skew beyond which a local clock correction is attempted.
    pub max_clock_skew_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            table: "Vision".to_owned(),
            heartbeat_key: "heartbeat".to_owned(),
            stale_after_ms: 1000,
            poll_interval_ms: 1000,
            max_clock_skew_ms: 500,
        }
    }
}

/// Detection thresholds, forwarded to the core crate.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub classifier: ClassifierParams,
    pub pairing: PairingParams,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_yields_documented_defaults() {
        let cfg: VisionConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(cfg, VisionConfig::default());
        assert_eq!(cfg.camera.width, 320);
        assert_eq!(cfg.link.stale_after_ms, 1000);
        assert_eq!(cfg.link.max_clock_skew_ms, 500);
        assert_eq!(cfg.detector.classifier.min_rect_ratio, 0.85);
    }

    #[test]
    fn fov_falls_back_when_missing_or_invalid() {
        let mut camera = CameraConfig::default();
        assert_eq!(camera.fov_or_default(), DEFAULT_FOV_DEG);
        camera.fov_deg = Some(0.0);
        assert_eq!(camera.fov_or_default(), DEFAULT_FOV_DEG);
        camera.fov_deg = Some(60.0);
        assert_eq!(camera.fov_or_default(), 60.0);
    }

    #[test]
    fn reads_partial_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(
            file,
            r#"{{"camera": {{"fov_deg": 60, "width": 640, "height": 480}},
                "link": {{"stale_after_ms": 2000}}}}"#
        )
        .expect("write");

        let cfg = VisionConfig::from_path(file.path()).expect("load");
        assert_eq!(cfg.camera.fov_or_default(), 60.0);
        assert_eq!(cfg.camera.width, 640);
        assert_eq!(cfg.link.stale_after_ms, 2000);
        // Untouched sections keep their defaults.
        assert_eq!(cfg.link.poll_interval_ms, 1000);
        assert_eq!(cfg.detector.pairing.max_alignment_deg, 15.0);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = VisionConfig::from_path(Path::new("/nonexistent/vision.json"))
            .expect_err("should fail");
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, "{{not json").expect("write");
        let err = VisionConfig::from_path(file.path()).expect_err("should fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
