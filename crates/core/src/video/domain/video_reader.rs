use std::path::Path;

use crate::shared::error::PipelineError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Reads frames from a video source.
///
/// Implementations handle I/O details (codec, container format) while the
/// pipeline works with the abstract `Frame` and `VideoMetadata` types. A
/// reader holds its decoder handle from `open` until `close`.
pub trait VideoReader: Send {
    /// Opens a video file and returns its metadata.
    ///
    /// Fails with [`PipelineError::SourceUnreadable`] when the path cannot
    /// be opened or no decodable video stream exists.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, PipelineError>;

    /// Returns an iterator over frames in decode order.
    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, PipelineError>> + '_>;

    /// Releases the decoder handle. Idempotent.
    fn close(&mut self);
}
