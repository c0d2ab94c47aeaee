use std::path::Path;

use crate::shared::error::PipelineError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::VideoWriter;

/// Encodes video frames via ffmpeg-next as VP8 in a WebM container.
///
/// VP8/WebM is the pipeline's fixed output format: every mainstream browser
/// plays it natively. The writer validates each frame's dimensions against
/// the size it was opened with; a mismatch would otherwise encode into a
/// silently broken file.
pub struct FfmpegWriter {
    octx: Option<ffmpeg_next::format::context::Output>,
    encoder: Option<ffmpeg_next::codec::encoder::video::Encoder>,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    width: u32,
    height: u32,
    fps: f64,
    frame_count: usize,
}

const VIDEO_STREAM_INDEX: usize = 0;

// Safety: FfmpegWriter is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegWriter {}

impl FfmpegWriter {
    pub fn new() -> Self {
        Self {
            octx: None,
            encoder: None,
            scaler: None,
            width: 0,
            height: 0,
            fps: 0.0,
            frame_count: 0,
        }
    }

    /// Frames written since `open`.
    pub fn frames_written(&self) -> usize {
        self.frame_count
    }

    fn fps_i(&self) -> i32 {
        let fps = self.fps.round() as i32;
        if fps <= 0 {
            30
        } else {
            fps
        }
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoWriter for FfmpegWriter {
    fn open(&mut self, path: &Path, metadata: &VideoMetadata) -> Result<(), PipelineError> {
        ffmpeg_next::init().map_err(PipelineError::Encode)?;

        self.width = metadata.width;
        self.height = metadata.height;
        self.fps = metadata.fps;

        let mut octx = ffmpeg_next::format::output(path).map_err(PipelineError::Encode)?;

        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::VP8).ok_or(
            PipelineError::EncoderUnavailable {
                codec: "vp8".to_string(),
                source: ffmpeg_next::Error::EncoderNotFound,
            },
        )?;

        let mut ost = octx
            .add_stream(Some(codec))
            .map_err(PipelineError::Encode)?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(PipelineError::Encode)?;

        encoder_ctx.set_width(metadata.width);
        encoder_ctx.set_height(metadata.height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);

        let fps_i = self.fps_i();
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fps_i));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps_i, 1)));

        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx
            .open_with(ffmpeg_next::Dictionary::new())
            .map_err(|source| PipelineError::EncoderUnavailable {
                codec: "vp8".to_string(),
                source,
            })?;
        ost.set_parameters(&encoder);

        octx.write_header().map_err(PipelineError::Encode)?;

        let scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            metadata.width,
            metadata.height,
            ffmpeg_next::format::Pixel::YUV420P,
            metadata.width,
            metadata.height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(PipelineError::Encode)?;

        self.octx = Some(octx);
        self.encoder = Some(encoder);
        self.scaler = Some(scaler);
        self.frame_count = 0;

        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), PipelineError> {
        let fps_i = self.fps_i();
        let (Some(encoder), Some(scaler), Some(octx)) = (
            self.encoder.as_mut(),
            self.scaler.as_mut(),
            self.octx.as_mut(),
        ) else {
            return Err(PipelineError::NotOpened("FfmpegWriter"));
        };

        if frame.width() != self.width || frame.height() != self.height {
            return Err(PipelineError::DimensionMismatch {
                expected_width: self.width,
                expected_height: self.height,
                actual_width: frame.width(),
                actual_height: frame.height(),
            });
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            self.width,
            self.height,
        );

        let stride = rgb_frame.stride(0);
        let data = rgb_frame.data_mut(0);
        let src = frame.data();
        let row_bytes = self.width as usize * 3;

        // Copy pixel data, respecting stride
        for row in 0..self.height as usize {
            let src_start = row * row_bytes;
            let dst_start = row * stride;
            data[dst_start..dst_start + row_bytes]
                .copy_from_slice(&src[src_start..src_start + row_bytes]);
        }

        let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&rgb_frame, &mut yuv_frame).map_err(PipelineError::Encode)?;
        yuv_frame.set_pts(Some(self.frame_count as i64));

        encoder.send_frame(&yuv_frame).map_err(PipelineError::Encode)?;

        let ost_time_base = octx
            .stream(VIDEO_STREAM_INDEX)
            .map(|s| s.time_base())
            .unwrap_or(ffmpeg_next::Rational(1, fps_i));

        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(VIDEO_STREAM_INDEX);
            encoded.rescale_ts(ffmpeg_next::Rational(1, fps_i), ost_time_base);
            encoded
                .write_interleaved(octx)
                .map_err(PipelineError::Encode)?;
        }

        self.frame_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), PipelineError> {
        let fps_i = self.fps_i();
        if let (Some(encoder), Some(octx)) = (self.encoder.as_mut(), self.octx.as_mut()) {
            let ost_time_base = octx
                .stream(VIDEO_STREAM_INDEX)
                .map(|s| s.time_base())
                .unwrap_or(ffmpeg_next::Rational(1, fps_i));

            // Flush the encoder, then finalize the container
            encoder.send_eof().map_err(PipelineError::Encode)?;
            let mut encoded = ffmpeg_next::Packet::empty();
            while encoder.receive_packet(&mut encoded).is_ok() {
                encoded.set_stream(VIDEO_STREAM_INDEX);
                encoded.rescale_ts(ffmpeg_next::Rational(1, fps_i), ost_time_base);
                encoded
                    .write_interleaved(octx)
                    .map_err(PipelineError::Encode)?;
            }

            octx.write_trailer().map_err(PipelineError::Encode)?;
        }

        self.octx = None;
        self.encoder = None;
        self.scaler = None;

        Ok(())
    }
}
