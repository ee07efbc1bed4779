//! Publication of the aiming solution over the keyed transport.
//!
//! The remote controller compensates for processing lag, so heading, age
//! and distance must arrive together: the three values go out as one
//! array write under [`keys::TARGET_INFORMATION`], followed by an explicit
//! flush to bypass the transport's batching interval. When no target was
//! found nothing numeric is published at all; `NaN` never crosses the
//! wire and the remote never sees a defaulted heading.

use log::{debug, warn};
use retrotrack_core::resolve;
use thiserror::Error;

use crate::frame::{Frame, VideoSink};
use crate::pipeline::{FrameConsumer, SharedTarget};

/// Keys the targeting record publishes under, within the configured table.
pub mod keys {
    pub const TARGET_ERROR: &str = "targetError";
    pub const TARGET_PROCESSING_TIME: &str = "targetProcessingTime";
    pub const TARGET_INFORMATION: &str = "targetInformation";
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("link not connected")]
    NotConnected,
    #[error("publish failed: {0}")]
    Publish(String),
    #[error("flush failed: {0}")]
    Flush(String),
    #[error("session reopen failed: {0}")]
    Reopen(String),
}

/// The keyed data-exchange collaborator, reduced to what this subsystem
/// needs: typed writes and an explicit flush.
pub trait Transport {
    fn set_f64(&mut self, key: &str, value: f64) -> Result<(), TransportError>;
    fn set_i64(&mut self, key: &str, value: i64) -> Result<(), TransportError>;
    fn set_f64_array(&mut self, key: &str, values: &[f64]) -> Result<(), TransportError>;
    fn flush(&mut self) -> Result<(), TransportError>;
}

/// Consumer side of the frame pipeline: publishes the latest result and
/// re-streams the annotated frame.
pub struct Publisher<T: Transport, V: VideoSink> {
    transport: T,
    video: V,
    fov_deg: f64,
}

impl<T: Transport, V: VideoSink> Publisher<T, V> {
    pub fn new(transport: T, video: V, fov_deg: f64) -> Self {
        Self {
            transport,
            video,
            fov_deg,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn video(&self) -> &V {
        &self.video
    }

    /// One atomic multi-field update plus flush. Wire order within the
    /// array is fixed: heading, age in milliseconds, distance.
    fn publish_target(
        &mut self,
        heading_deg: f64,
        age_ms: i64,
        distance: f64,
    ) -> Result<(), TransportError> {
        self.transport.set_f64(keys::TARGET_ERROR, heading_deg)?;
        self.transport.set_i64(keys::TARGET_PROCESSING_TIME, age_ms)?;
        self.transport.set_f64_array(
            keys::TARGET_INFORMATION,
            &[heading_deg, age_ms as f64, distance],
        )?;
        self.transport.flush()
    }
}

impl<T: Transport, V: VideoSink> FrameConsumer for Publisher<T, V> {
    fn on_frame(&mut self, latest: &SharedTarget, annotated: &Frame) {
        if let Some(info) = latest.latest() {
            let age_ms = info.frame_start.elapsed().as_millis() as i64;

            if info.normalized_center.is_nan() {
                debug!("no target this frame; numeric publish skipped");
            } else {
                let heading = resolve::relative_heading_deg(info.normalized_center, self.fov_deg);
                let distance = resolve::distance_to_target(info.distance_ratio, self.fov_deg);
                match self.publish_target(heading, age_ms, distance) {
                    Ok(()) => debug!(
                        "published heading {:.1} deg, distance {:.1}, age {} ms",
                        heading, distance, age_ms
                    ),
                    // Publication failures never stop the frame loop; the
                    // watchdog owns link recovery.
                    Err(err) => warn!("target publish failed: {err}"),
                }
            }
        }

        self.video.write_frame(annotated);
    }
}

/// In-memory transport for tests and smoke checks: records every write and
/// counts flushes.
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    pub values: std::collections::BTreeMap<String, LoopbackValue>,
    pub flushes: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LoopbackValue {
    F64(f64),
    I64(i64),
    F64Array(Vec<f64>),
}

impl Transport for LoopbackTransport {
    fn set_f64(&mut self, key: &str, value: f64) -> Result<(), TransportError> {
        self.values.insert(key.to_owned(), LoopbackValue::F64(value));
        Ok(())
    }

    fn set_i64(&mut self, key: &str, value: i64) -> Result<(), TransportError> {
        self.values.insert(key.to_owned(), LoopbackValue::I64(value));
        Ok(())
    }

    fn set_f64_array(&mut self, key: &str, values: &[f64]) -> Result<(), TransportError> {
        self.values
            .insert(key.to_owned(), LoopbackValue::F64Array(values.to_vec()));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.flushes += 1;
        Ok(())
    }
}
