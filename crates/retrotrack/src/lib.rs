//! On-board vision targeting runtime.
//!
//! Builds the real-time half of the targeting subsystem on top of
//! [`retrotrack_core`]: a frame-processing worker that runs
//! classify → pair → select once per captured frame, a latest-result cell
//! shared with a publisher that pushes one coherent
//! `{heading, age, distance}` record per frame over a keyed transport, an
//! annotated re-stream for the operators, and a watchdog that reopens the
//! transport session when the remote heartbeat goes stale.
//!
//! Collaborators that live outside this subsystem (camera capture, the
//! contour-extraction front end, the transport wire protocol, the video
//! encoder) enter through the traits in [`frame`], [`publish`] and
//! [`watchdog`].
//!
//! ## API map
//! - [`config`]: JSON deployment configuration.
//! - [`frame`]: RGB frame buffer and the capture/extraction/video seams.
//! - [`pipeline`]: per-frame worker loop and the shared latest result.
//! - [`annotate`]: diagnostic overlay drawn on every frame.
//! - [`publish`]: NaN-gated atomic publication plus flush.
//! - [`watchdog`]: link staleness recovery and clock-skew correction.

pub mod annotate;
pub mod config;
pub mod frame;
pub mod pipeline;
pub mod publish;
pub mod watchdog;

pub use config::{VisionConfig, DEFAULT_FOV_DEG};
pub use frame::{CaptureError, ContourExtractor, Frame, FrameSource, VideoSink};
pub use pipeline::{
    FrameConsumer, FrameOutcome, FramePipeline, PipelineError, SharedTarget, TargetInformation,
};
pub use publish::{Publisher, Transport, TransportError};
pub use watchdog::{
    ClockAdjuster, HeartbeatListener, HeartbeatState, LinkState, LinkWatchdog, SessionControl,
};
