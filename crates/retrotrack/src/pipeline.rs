//! Per-frame worker loop and the shared latest-result cell.
//!
//! The worker runs capture → classify → pair → select once per frame and
//! overwrites the single [`SharedTarget`] cell; there is no frame queue, so
//! a slow consumer sees only the newest result. The mutex around the cell
//! is held for copy-in/copy-out only, never across computation, drawing or
//! I/O. With the worker as the only writer and a monotonic clock behind
//! `frame_start`, a consumer can never observe a result older than the one
//! it consumed before.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use crossbeam::channel::{Receiver, TryRecvError};
use log::{debug, trace};
use retrotrack_core::{
    pair_shapes, select_target, ClassifiedShape, Contour, PairingParams, Selection,
    ShapeClassifier, TargetPair,
};
use thiserror::Error;

use crate::annotate;
use crate::config::DetectorConfig;
use crate::frame::{CaptureError, ContourExtractor, Frame, FrameSource};

/// One frame's aiming result. A value, recreated every frame; "no target"
/// is `NaN` in both numeric fields.
#[derive(Clone, Copy, Debug)]
pub struct TargetInformation {
    /// Horizontal offset of the selected pair in `[-1, 1]`, or `NaN`.
    pub normalized_center: f64,
    /// `frame_width_px / pair_pixel_separation`, or `NaN`.
    pub distance_ratio: f64,
    /// When processing of this frame started; drives the published age.
    pub frame_start: Instant,
}

impl TargetInformation {
    /// The "nothing detected" result for a frame started at `frame_start`.
    pub fn none_at(frame_start: Instant) -> Self {
        Self {
            normalized_center: f64::NAN,
            distance_ratio: f64::NAN,
            frame_start,
        }
    }
}

/// Latest-result cell shared between the worker and the consumer.
#[derive(Clone, Default)]
pub struct SharedTarget {
    cell: Arc<Mutex<Option<TargetInformation>>>,
}

impl SharedTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the latest result. Lock held for the copy only.
    pub fn store(&self, info: TargetInformation) {
        let mut guard = self.cell.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(info);
    }

    /// Copy out the latest result, `None` before the first frame.
    pub fn latest(&self) -> Option<TargetInformation> {
        let guard = self.cell.lock().unwrap_or_else(|e| e.into_inner());
        *guard
    }
}

/// Everything one frame produced, for annotation and diagnostics.
#[derive(Clone, Debug)]
pub struct FrameOutcome {
    pub contours: Vec<Contour>,
    pub shapes: Vec<ClassifiedShape>,
    pub pairs: Vec<TargetPair>,
    pub selection: Option<Selection>,
    pub info: TargetInformation,
}

impl FrameOutcome {
    pub fn annotate_onto(&self, frame: &mut Frame) {
        annotate::annotate(
            frame,
            &self.contours,
            &self.shapes,
            &self.pairs,
            self.selection.as_ref(),
        );
    }
}

/// Detection stages chained behind one `process` call.
pub struct FramePipeline<X: ContourExtractor> {
    extractor: X,
    classifier: ShapeClassifier,
    pairing: PairingParams,
}

impl<X: ContourExtractor> FramePipeline<X> {
    pub fn new(extractor: X, detector: DetectorConfig) -> Self {
        Self {
            extractor,
            classifier: ShapeClassifier::new(detector.classifier),
            pairing: detector.pairing,
        }
    }

    /// Run classify → pair → select on one frame.
    ///
    /// A frame without a valid pair is not an error; it yields the `NaN`
    /// result with the frame's own start timestamp.
    pub fn process(&mut self, frame: &Frame, frame_start: Instant) -> FrameOutcome {
        let contours = self.extractor.extract(frame);
        let shapes: Vec<ClassifiedShape> = contours
            .iter()
            .filter_map(|c| self.classifier.classify_contour(c))
            .collect();
        let pairs = pair_shapes(&shapes, &self.pairing);
        let selection = select_target(&pairs, frame.width as f64);

        let info = match &selection {
            Some(sel) => TargetInformation {
                normalized_center: sel.normalized_center,
                distance_ratio: sel.distance_ratio,
                frame_start,
            },
            None => TargetInformation::none_at(frame_start),
        };

        trace!(
            "frame: {} contours, {} shapes, {} pairs, selected: {}",
            contours.len(),
            shapes.len(),
            pairs.len(),
            selection.is_some()
        );

        FrameOutcome {
            contours,
            shapes,
            pairs,
            selection,
            info,
        }
    }
}

/// Consumer side of the pipeline, invoked once per completed frame with
/// the shared cell and the annotated frame. Reads of the cell happen under
/// its lock; everything else runs unlocked.
pub trait FrameConsumer {
    fn on_frame(&mut self, latest: &SharedTarget, annotated: &Frame);
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
}

/// Drive the pipeline until shutdown is signalled or capture fails.
///
/// Intended to run on a dedicated worker thread. Only [`CaptureError`]
/// escapes; detection never aborts a frame.
pub fn run<S, X, C>(
    source: &mut S,
    pipeline: &mut FramePipeline<X>,
    latest: &SharedTarget,
    consumer: &mut C,
    shutdown: &Receiver<()>,
) -> Result<(), PipelineError>
where
    S: FrameSource,
    X: ContourExtractor,
    C: FrameConsumer,
{
    loop {
        match shutdown.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => {
                debug!("frame loop shutting down");
                return Ok(());
            }
            Err(TryRecvError::Empty) => {}
        }

        let mut frame = source.next_frame()?;
        let frame_start = Instant::now();
        let outcome = pipeline.process(&frame, frame_start);

        latest.store(outcome.info);
        outcome.annotate_onto(&mut frame);
        consumer.on_frame(latest, &frame);
    }
}
