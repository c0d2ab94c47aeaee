use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::annotate::overlay::draw_detections;
use crate::detect::domain::ball_detector::BallDetector;
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::preprocess::gaussian::{blur_frame_with_kernel, gaussian_kernel_1d};
use crate::preprocess::resize::{resize_to_width, scaled_dimensions};
use crate::shared::constants::OUTPUT_EXTENSION;
use crate::shared::error::PipelineError;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

/// Orchestrates the detection pipeline over one video.
///
/// Per frame, strictly in order: optional downscale → blur a working copy →
/// detect on the blurred copy → annotate the (unblurred) processed frame →
/// encode. One frame fully traverses all stages before the next is read;
/// nothing is shared between frames.
///
/// The writer is always configured with the preprocessor's output
/// dimensions, never the source dimensions. The two differ whenever
/// downscaling is enabled, and conflating them is the classic way to
/// produce a corrupt output.
///
/// This is a single-use struct: `execute` consumes the owned components, so
/// calling it twice fails with [`PipelineError::AlreadyExecuted`]. Reader
/// and writer handles are released on every exit path, and a partial output
/// file never survives an error.
pub struct DetectBallUseCase {
    reader: Option<Box<dyn VideoReader>>,
    writer: Option<Box<dyn VideoWriter>>,
    detector: Option<Box<dyn BallDetector>>,
    config: PipelineConfig,
    logger: Box<dyn PipelineLogger>,
}

impl DetectBallUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        detector: Box<dyn BallDetector>,
        config: PipelineConfig,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader: Some(reader),
            writer: Some(writer),
            detector: Some(detector),
            config,
            logger,
        }
    }

    /// Runs the pipeline: `input` in, annotated video out.
    ///
    /// The output lands at `output_base` with its extension replaced by the
    /// pipeline's fixed container format; the actual path is returned. On
    /// error the caller gets no path and no leftover file.
    pub fn execute(
        &mut self,
        input: &Path,
        output_base: &Path,
    ) -> Result<PathBuf, PipelineError> {
        let mut reader = self.reader.take().ok_or(PipelineError::AlreadyExecuted)?;
        let mut writer = self.writer.take().ok_or(PipelineError::AlreadyExecuted)?;
        let mut detector = self.detector.take().ok_or(PipelineError::AlreadyExecuted)?;

        let metadata = match reader.open(input) {
            Ok(m) => m,
            Err(e) => {
                reader.close();
                return Err(e);
            }
        };

        let (proc_w, proc_h) =
            scaled_dimensions(metadata.width, metadata.height, self.config.target_width);
        let mut writer_meta = metadata.with_dimensions(proc_w, proc_h);
        if let Some(fps) = self.config.fps {
            writer_meta.fps = fps;
        }
        self.logger.info(&format!(
            "{}x{} @ {:.2} fps, processing at {proc_w}x{proc_h}",
            metadata.width, metadata.height, writer_meta.fps
        ));

        let output_path = output_base.with_extension(OUTPUT_EXTENSION);
        if let Err(e) = writer.open(&output_path, &writer_meta) {
            reader.close();
            let _ = writer.close();
            remove_partial(&output_path);
            return Err(e);
        }

        let run = run_frames(
            &mut *reader,
            &mut *writer,
            &mut *detector,
            &self.config,
            metadata.total_frames,
            &mut *self.logger,
        );
        reader.close();

        match run {
            Ok(0) => {
                let _ = writer.close();
                remove_partial(&output_path);
                Err(PipelineError::EmptySource {
                    path: input.to_path_buf(),
                })
            }
            Ok(frames) => {
                if let Err(e) = writer.close() {
                    remove_partial(&output_path);
                    return Err(e);
                }
                self.logger.info(&format!(
                    "wrote {frames} frame(s) to {}",
                    output_path.display()
                ));
                self.logger.summary();
                Ok(output_path)
            }
            Err(e) => {
                let _ = writer.close();
                remove_partial(&output_path);
                Err(e)
            }
        }
    }
}

/// The per-frame loop. Returns the number of frames written.
fn run_frames(
    reader: &mut dyn VideoReader,
    writer: &mut dyn VideoWriter,
    detector: &mut dyn BallDetector,
    config: &PipelineConfig,
    total_frames: usize,
    logger: &mut dyn PipelineLogger,
) -> Result<usize, PipelineError> {
    let blur_kernel = (config.blur_kernel > 1).then(|| gaussian_kernel_1d(config.blur_kernel));
    let mut blur_temp = Vec::new();
    let mut written = 0usize;

    for frame_result in reader.frames() {
        let frame = frame_result?;

        let start = Instant::now();
        let processed = resize_to_width(frame, config.target_width);
        let mut blurred = processed.clone();
        if let Some(kernel) = &blur_kernel {
            blur_frame_with_kernel(&mut blurred, kernel, &mut blur_temp);
        }
        logger.timing("preprocess", elapsed_ms(start));

        let start = Instant::now();
        let detections = detector.detect(&blurred)?;
        logger.timing("detect", elapsed_ms(start));

        let start = Instant::now();
        let mut annotated = processed;
        draw_detections(&mut annotated, &detections);
        logger.timing("annotate", elapsed_ms(start));

        let start = Instant::now();
        writer.write(&annotated)?;
        logger.timing("write", elapsed_ms(start));

        written += 1;
        logger.progress(written, total_frames);
    }

    Ok(written)
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// A failed or empty run must not leave a half-written file behind.
fn remove_partial(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            log::warn!("could not remove partial output {}: {e}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use crate::detect::infrastructure::hsv_ball_detector::HsvBallDetector;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::detection::Detection;
    use crate::shared::frame::Frame;
    use crate::shared::video_metadata::VideoMetadata;
    use crate::video::infrastructure::ffmpeg_reader::tests::create_test_video;
    use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;
    use crate::video::infrastructure::ffmpeg_writer::FfmpegWriter;

    // --- Stubs ---

    struct StubReader {
        frames: Vec<Frame>,
        width: u32,
        height: u32,
        closed: Arc<Mutex<bool>>,
    }

    impl StubReader {
        fn new(frames: Vec<Frame>, width: u32, height: u32) -> Self {
            Self {
                frames,
                width,
                height,
                closed: Arc::new(Mutex::new(false)),
            }
        }
    }

    impl VideoReader for StubReader {
        fn open(&mut self, path: &Path) -> Result<VideoMetadata, PipelineError> {
            Ok(VideoMetadata {
                width: self.width,
                height: self.height,
                fps: 30.0,
                total_frames: self.frames.len(),
                codec: String::new(),
                source_path: Some(path.to_path_buf()),
            })
        }

        fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, PipelineError>> + '_> {
            Box::new(self.frames.drain(..).map(Ok))
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    /// Yields one good frame, then a decode error.
    struct FailingReader {
        closed: Arc<Mutex<bool>>,
    }

    impl VideoReader for FailingReader {
        fn open(&mut self, path: &Path) -> Result<VideoMetadata, PipelineError> {
            Ok(VideoMetadata {
                width: 32,
                height: 24,
                fps: 30.0,
                total_frames: 2,
                codec: String::new(),
                source_path: Some(path.to_path_buf()),
            })
        }

        fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, PipelineError>> + '_> {
            Box::new(
                vec![
                    Ok(Frame::solid(32, 24, [0, 0, 0], 0)),
                    Err(PipelineError::Decode(ffmpeg_next::Error::InvalidData)),
                ]
                .into_iter(),
            )
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    #[derive(Clone, Default)]
    struct WriterLog {
        opened_with: Arc<Mutex<Option<(PathBuf, u32, u32, f64)>>>,
        written: Arc<Mutex<Vec<Frame>>>,
        closed: Arc<Mutex<bool>>,
    }

    struct StubWriter {
        log: WriterLog,
    }

    impl VideoWriter for StubWriter {
        fn open(&mut self, path: &Path, metadata: &VideoMetadata) -> Result<(), PipelineError> {
            *self.log.opened_with.lock().unwrap() = Some((
                path.to_path_buf(),
                metadata.width,
                metadata.height,
                metadata.fps,
            ));
            Ok(())
        }

        fn write(&mut self, frame: &Frame) -> Result<(), PipelineError> {
            self.log.written.lock().unwrap().push(frame.clone());
            Ok(())
        }

        fn close(&mut self) -> Result<(), PipelineError> {
            *self.log.closed.lock().unwrap() = true;
            Ok(())
        }
    }

    struct StubDetector {
        results: HashMap<usize, Vec<Detection>>,
    }

    impl BallDetector for StubDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, PipelineError> {
            Ok(self
                .results
                .get(&frame.index())
                .cloned()
                .unwrap_or_default())
        }
    }

    struct FailingDetector;

    impl BallDetector for FailingDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>, PipelineError> {
            Err(PipelineError::Decode(ffmpeg_next::Error::InvalidData))
        }
    }

    struct RecordingLogger {
        progress: Arc<Mutex<Vec<(usize, usize)>>>,
    }

    impl PipelineLogger for RecordingLogger {
        fn progress(&mut self, current: usize, total: usize) {
            self.progress.lock().unwrap().push((current, total));
        }
        fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
        fn info(&mut self, _message: &str) {}
    }

    // --- Helpers ---

    fn make_frames(count: usize, w: u32, h: u32) -> Vec<Frame> {
        (0..count)
            .map(|i| Frame::solid(w, h, [40, 40, 40], i))
            .collect()
    }

    fn no_scale_config() -> PipelineConfig {
        PipelineConfig {
            target_width: 0,
            ..Default::default()
        }
    }

    fn use_case(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        detector: Box<dyn BallDetector>,
        config: PipelineConfig,
    ) -> DetectBallUseCase {
        DetectBallUseCase::new(reader, writer, detector, config, Box::new(NullPipelineLogger))
    }

    fn empty_detector() -> Box<dyn BallDetector> {
        Box::new(StubDetector {
            results: HashMap::new(),
        })
    }

    // --- Tests ---

    #[test]
    fn test_processes_all_frames_and_returns_webm_path() {
        let log = WriterLog::default();
        let mut uc = use_case(
            Box::new(StubReader::new(make_frames(5, 64, 48), 64, 48)),
            Box::new(StubWriter { log: log.clone() }),
            empty_detector(),
            no_scale_config(),
        );

        let out = uc
            .execute(Path::new("/tmp/in.mp4"), Path::new("/tmp/out.mp4"))
            .unwrap();
        assert_eq!(out, PathBuf::from("/tmp/out.webm"));
        assert_eq!(log.written.lock().unwrap().len(), 5);
    }

    #[test]
    fn test_frames_written_in_order() {
        let log = WriterLog::default();
        let mut uc = use_case(
            Box::new(StubReader::new(make_frames(10, 64, 48), 64, 48)),
            Box::new(StubWriter { log: log.clone() }),
            empty_detector(),
            no_scale_config(),
        );

        uc.execute(Path::new("/tmp/in.mp4"), Path::new("/tmp/out"))
            .unwrap();

        let written = log.written.lock().unwrap();
        for (i, frame) in written.iter().enumerate() {
            assert_eq!(frame.index(), i);
        }
    }

    #[test]
    fn test_writer_gets_processed_dimensions_not_source() {
        let log = WriterLog::default();
        let mut uc = use_case(
            Box::new(StubReader::new(make_frames(2, 1920, 1080), 1920, 1080)),
            Box::new(StubWriter { log: log.clone() }),
            empty_detector(),
            PipelineConfig {
                target_width: 640,
                ..Default::default()
            },
        );

        uc.execute(Path::new("/tmp/in.mp4"), Path::new("/tmp/out"))
            .unwrap();

        let opened = log.opened_with.lock().unwrap();
        let (_, w, h, _) = opened.as_ref().unwrap();
        assert_eq!((*w, *h), (640, 360));
        for frame in log.written.lock().unwrap().iter() {
            assert_eq!((frame.width(), frame.height()), (640, 360));
        }
    }

    #[test]
    fn test_fps_override_reaches_the_writer() {
        let log = WriterLog::default();
        let mut uc = use_case(
            Box::new(StubReader::new(make_frames(1, 64, 48), 64, 48)),
            Box::new(StubWriter { log: log.clone() }),
            empty_detector(),
            PipelineConfig {
                target_width: 0,
                fps: Some(12.0),
                ..Default::default()
            },
        );

        uc.execute(Path::new("/tmp/in.mp4"), Path::new("/tmp/out"))
            .unwrap();

        let opened = log.opened_with.lock().unwrap();
        assert_eq!(opened.as_ref().unwrap().3, 12.0);
    }

    #[test]
    fn test_detections_are_drawn_on_written_frames() {
        let log = WriterLog::default();
        let mut results = HashMap::new();
        results.insert(
            0,
            vec![Detection {
                center: (32.0, 24.0),
                radius: 10.0,
                circularity: 0.9,
            }],
        );

        let mut uc = use_case(
            Box::new(StubReader::new(make_frames(1, 64, 48), 64, 48)),
            Box::new(StubWriter { log: log.clone() }),
            Box::new(StubDetector { results }),
            no_scale_config(),
        );

        uc.execute(Path::new("/tmp/in.mp4"), Path::new("/tmp/out"))
            .unwrap();

        let written = log.written.lock().unwrap();
        // East point of the circle outline carries the marker color
        assert_eq!(written[0].pixel(42, 24), crate::shared::constants::MARKER_COLOR);
    }

    #[test]
    fn test_empty_source_is_reported_distinctly() {
        let log = WriterLog::default();
        let mut uc = use_case(
            Box::new(StubReader::new(vec![], 64, 48)),
            Box::new(StubWriter { log: log.clone() }),
            empty_detector(),
            no_scale_config(),
        );

        let err = uc
            .execute(Path::new("/tmp/in.mp4"), Path::new("/tmp/out"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::EmptySource { .. }));
        assert!(*log.closed.lock().unwrap());
    }

    #[test]
    fn test_closes_reader_and_writer_on_success() {
        let reader = StubReader::new(make_frames(2, 64, 48), 64, 48);
        let reader_closed = reader.closed.clone();
        let log = WriterLog::default();

        let mut uc = use_case(
            Box::new(reader),
            Box::new(StubWriter { log: log.clone() }),
            empty_detector(),
            no_scale_config(),
        );
        uc.execute(Path::new("/tmp/in.mp4"), Path::new("/tmp/out"))
            .unwrap();

        assert!(*reader_closed.lock().unwrap());
        assert!(*log.closed.lock().unwrap());
    }

    #[test]
    fn test_closes_both_handles_on_detector_error() {
        let reader = StubReader::new(make_frames(3, 64, 48), 64, 48);
        let reader_closed = reader.closed.clone();
        let log = WriterLog::default();

        let mut uc = use_case(
            Box::new(reader),
            Box::new(StubWriter { log: log.clone() }),
            Box::new(FailingDetector),
            no_scale_config(),
        );

        let result = uc.execute(Path::new("/tmp/in.mp4"), Path::new("/tmp/out"));
        assert!(result.is_err());
        assert!(*reader_closed.lock().unwrap());
        assert!(*log.closed.lock().unwrap());
    }

    #[test]
    fn test_mid_stream_decode_error_propagates_and_releases() {
        let reader = FailingReader {
            closed: Arc::new(Mutex::new(false)),
        };
        let reader_closed = reader.closed.clone();
        let log = WriterLog::default();

        let mut uc = use_case(
            Box::new(reader),
            Box::new(StubWriter { log: log.clone() }),
            empty_detector(),
            no_scale_config(),
        );

        let err = uc
            .execute(Path::new("/tmp/in.mp4"), Path::new("/tmp/out"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Decode(_)));
        assert!(*reader_closed.lock().unwrap());
        assert!(*log.closed.lock().unwrap());
        // The good first frame was written before the failure
        assert_eq!(log.written.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_second_execute_fails() {
        let mut uc = use_case(
            Box::new(StubReader::new(make_frames(1, 64, 48), 64, 48)),
            Box::new(StubWriter {
                log: WriterLog::default(),
            }),
            empty_detector(),
            no_scale_config(),
        );

        uc.execute(Path::new("/tmp/in.mp4"), Path::new("/tmp/out"))
            .unwrap();
        let err = uc
            .execute(Path::new("/tmp/in.mp4"), Path::new("/tmp/out"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::AlreadyExecuted));
    }

    #[test]
    fn test_progress_reported_once_per_frame() {
        let progress = Arc::new(Mutex::new(Vec::new()));
        let mut uc = DetectBallUseCase::new(
            Box::new(StubReader::new(make_frames(4, 64, 48), 64, 48)),
            Box::new(StubWriter {
                log: WriterLog::default(),
            }),
            empty_detector(),
            no_scale_config(),
            Box::new(RecordingLogger {
                progress: progress.clone(),
            }),
        );

        uc.execute(Path::new("/tmp/in.mp4"), Path::new("/tmp/out"))
            .unwrap();

        let progress = progress.lock().unwrap();
        assert_eq!(*progress, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    }

    // --- End-to-end against real ffmpeg I/O ---

    fn real_use_case(config: PipelineConfig) -> DetectBallUseCase {
        let detector = HsvBallDetector::new(&config);
        DetectBallUseCase::new(
            Box::new(FfmpegReader::new()),
            Box::new(FfmpegWriter::new()),
            Box::new(detector),
            config,
            Box::new(NullPipelineLogger),
        )
    }

    #[test]
    fn test_end_to_end_preserves_frame_count() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.mp4");
        create_test_video(&input, 6, 160, 120, 30.0);

        let output_base = dir.path().join("annotated.mp4");
        let out = real_use_case(PipelineConfig::default())
            .execute(&input, &output_base)
            .unwrap();

        assert_eq!(out, dir.path().join("annotated.webm"));

        let mut reader = FfmpegReader::new();
        let meta = reader.open(&out).unwrap();
        // 160px source is below the 640px cap: processed at source size
        assert_eq!((meta.width, meta.height), (160, 120));
        assert_eq!(reader.frames().filter(|f| f.is_ok()).count(), 6);
    }

    #[test]
    fn test_end_to_end_downscales_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.mp4");
        create_test_video(&input, 2, 320, 240, 30.0);

        let out = real_use_case(PipelineConfig {
            target_width: 160,
            ..Default::default()
        })
        .execute(&input, &dir.path().join("small"))
        .unwrap();

        let mut reader = FfmpegReader::new();
        let meta = reader.open(&out).unwrap();
        assert_eq!((meta.width, meta.height), (160, 120));
    }

    #[test]
    fn test_nonexistent_input_leaves_no_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("does-not-exist.mp4");
        let output_base = dir.path().join("out.mp4");

        let err = real_use_case(PipelineConfig::default())
            .execute(&input, &output_base)
            .unwrap_err();

        assert!(matches!(err, PipelineError::SourceUnreadable { .. }));
        assert!(!output_base.with_extension("webm").exists());
        assert!(!output_base.exists());
    }
}
