use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::shared::frame::Frame;

/// Dimensions after the aspect-ratio-preserving downscale to `target_width`.
///
/// `target_width` of 0 disables scaling, as does a target at or above the
/// source width (the pipeline never upscales).
pub fn scaled_dimensions(src_width: u32, src_height: u32, target_width: u32) -> (u32, u32) {
    if target_width == 0 || target_width >= src_width {
        return (src_width, src_height);
    }
    let target_height =
        (target_width as f64 * src_height as f64 / src_width as f64).round() as u32;
    (target_width, target_height.max(1))
}

/// Downscales a frame to `target_width`, preserving aspect ratio.
///
/// Returns the frame unchanged when [`scaled_dimensions`] is a no-op.
/// Bilinear (triangle) filtering, matching the decoder's scaler quality.
pub fn resize_to_width(frame: Frame, target_width: u32) -> Frame {
    let (w, h) = scaled_dimensions(frame.width(), frame.height(), target_width);
    if (w, h) == (frame.width(), frame.height()) {
        return frame;
    }

    let index = frame.index();
    let (src_w, src_h) = (frame.width(), frame.height());
    let image = RgbImage::from_raw(src_w, src_h, frame.data().to_vec())
        .expect("Frame buffer length matches its dimensions");
    let resized = imageops::resize(&image, w, h, FilterType::Triangle);
    Frame::new(resized.into_raw(), w, h, index)
}
