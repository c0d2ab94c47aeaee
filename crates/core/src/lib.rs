//! Color-based ball detection for video files.
//!
//! The pipeline reads a video, finds uniformly-colored round objects in each
//! frame (HSV thresholding → morphological cleanup → contour filtering), draws
//! a marker over every accepted detection, and re-encodes the annotated frames
//! to a web-playable WebM file.

pub mod annotate;
pub mod detect;
pub mod pipeline;
pub mod preprocess;
pub mod shared;
pub mod video;

use std::path::{Path, PathBuf};

use crate::detect::infrastructure::hsv_ball_detector::HsvBallDetector;
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::detect_ball_use_case::DetectBallUseCase;
use crate::pipeline::pipeline_logger::NullPipelineLogger;
use crate::shared::error::PipelineError;
use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;
use crate::video::infrastructure::ffmpeg_writer::FfmpegWriter;

/// Processes `input` into an annotated video next to `output_base`.
///
/// Convenience entry point for callers that don't need custom wiring. The
/// output extension is replaced with the pipeline's fixed container format;
/// the actual path written is returned.
pub fn process_video(
    input: &Path,
    output_base: &Path,
    config: PipelineConfig,
) -> Result<PathBuf, PipelineError> {
    let detector = HsvBallDetector::new(&config);
    let mut use_case = DetectBallUseCase::new(
        Box::new(FfmpegReader::new()),
        Box::new(FfmpegWriter::new()),
        Box::new(detector),
        config,
        Box::new(NullPipelineLogger),
    );
    use_case.execute(input, output_base)
}
