use crate::shared::detection::Detection;
use crate::shared::error::PipelineError;
use crate::shared::frame::Frame;

/// Finds ball candidates in a single frame.
///
/// Implementations run at whatever resolution the frame they are handed has;
/// returned coordinates are in that same resolution. Detections carry no
/// identity across frames; each call is independent.
pub trait BallDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, PipelineError>;
}
