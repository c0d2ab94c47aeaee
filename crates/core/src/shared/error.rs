use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the detection pipeline.
///
/// Every stage failure propagates here; the pipeline driver guarantees that
/// reader and writer handles are released (and a partially-written output
/// file removed) before one of these reaches the caller.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The input path cannot be opened, demuxed, or decoded.
    #[error("cannot read video source {path}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: ffmpeg_next::Error,
    },

    /// The output codec cannot be instantiated by the ffmpeg build.
    #[error("encoder '{codec}' is not available")]
    EncoderUnavailable {
        codec: String,
        #[source]
        source: ffmpeg_next::Error,
    },

    /// A frame handed to the writer does not match its configured size.
    /// Encoding such a frame would silently produce a corrupt file.
    #[error(
        "writer configured for {expected_width}x{expected_height} \
         but received a {actual_width}x{actual_height} frame"
    )]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// The source opened cleanly but yielded zero frames.
    #[error("source {path} contains no decodable frames")]
    EmptySource { path: PathBuf },

    /// Decode failure mid-stream.
    #[error("frame decode failed")]
    Decode(#[source] ffmpeg_next::Error),

    /// Encode or mux failure mid-stream.
    #[error("frame encode failed")]
    Encode(#[source] ffmpeg_next::Error),

    #[error("{0} used before open")]
    NotOpened(&'static str),

    /// The use case owns its reader/writer and can only run once.
    #[error("pipeline already executed")]
    AlreadyExecuted,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
