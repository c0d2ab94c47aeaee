use std::path::Path;

use crate::shared::error::PipelineError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Encodes frames to an output container.
///
/// The writer must be opened with the dimensions of the frames that will
/// actually be written: the processed (possibly downscaled) size, never the
/// source size. Implementations reject mismatched frames with
/// [`PipelineError::DimensionMismatch`] rather than encode a corrupt file.
pub trait VideoWriter: Send {
    fn open(&mut self, path: &Path, metadata: &VideoMetadata) -> Result<(), PipelineError>;

    fn write(&mut self, frame: &Frame) -> Result<(), PipelineError>;

    /// Flushes the encoder and finalizes the container.
    fn close(&mut self) -> Result<(), PipelineError>;
}
