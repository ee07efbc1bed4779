//! RGB frame buffer and the collaborator seams around it.
//!
//! Capture, contour extraction and video output are external to this
//! subsystem; they plug in through [`FrameSource`], [`ContourExtractor`]
//! and [`VideoSink`].

use retrotrack_core::Contour;
use thiserror::Error;

/// Row-major RGB frame, 3 bytes per pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl Frame {
    /// All-black frame of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * 3],
        }
    }

    /// Write one pixel; coordinates outside the frame are ignored, which
    /// lets the overlay clip at the borders for free.
    #[inline]
    pub fn put_pixel(&mut self, x: i64, y: i64, rgb: [u8; 3]) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 3;
        self.data[idx..idx + 3].copy_from_slice(&rgb);
    }

    #[inline]
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * 3;
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }
}

/// Capture failure. The only error class that terminates the frame loop;
/// everything downstream of capture degrades to a "no target" result
/// instead.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera '{0}' disconnected")]
    Disconnected(String),
    #[error("frame capture failed: {0}")]
    Failed(String),
}

/// Successive raw frames from the camera driver.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Frame, CaptureError>;
}

/// The blob-extraction front end: one ordered contour set per frame, in
/// pixel coordinates. An empty set is a normal outcome, not a fault.
pub trait ContourExtractor {
    fn extract(&mut self, frame: &Frame) -> Vec<Contour>;
}

/// Consumes one annotated frame per input frame.
pub trait VideoSink {
    fn write_frame(&mut self, frame: &Frame);
}
