use crate::shared::frame::{Frame, CHANNELS};

/// Precompute a 1D Gaussian kernel of the given size.
///
/// `kernel_size` must be odd and >= 1. Sigma is derived as `kernel_size / 6.0`
/// (matching OpenCV's sigma=0 convention).
pub fn gaussian_kernel_1d(kernel_size: usize) -> Vec<f32> {
    debug_assert!(kernel_size >= 1 && kernel_size % 2 == 1);
    let sigma = kernel_size as f64 / 6.0;
    let half = (kernel_size / 2) as f64;
    let mut kernel_f64: Vec<f64> = (0..kernel_size)
        .map(|i| {
            let x = i as f64 - half;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = kernel_f64.iter().sum();
    for v in &mut kernel_f64 {
        *v /= sum;
    }
    kernel_f64.iter().map(|&v| v as f32).collect()
}

/// Blurs a whole frame with a pre-computed kernel, reusing `temp`.
///
/// The segmenter runs this on a copy of each frame before thresholding, so
/// sensor noise does not punch holes in the color mask. The kernel is
/// computed once per run and reused across frames.
pub fn blur_frame_with_kernel(frame: &mut Frame, kernel: &[f32], temp: &mut Vec<f32>) {
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    separable_blur(frame.data_mut(), width, height, kernel, temp);
}

/// Convenience wrapper that allocates its own kernel and temp buffer.
pub fn blur_frame(frame: &mut Frame, kernel_size: usize) {
    if kernel_size <= 1 {
        return;
    }
    let kernel = gaussian_kernel_1d(kernel_size);
    let mut temp = Vec::new();
    blur_frame_with_kernel(frame, &kernel, &mut temp);
}

fn separable_blur(data: &mut [u8], width: usize, height: usize, kernel: &[f32], temp: &mut Vec<f32>) {
    let kernel_size = kernel.len();
    if kernel_size <= 1 || width == 0 || height == 0 {
        return;
    }
    let half = kernel_size / 2;

    let needed = width * height * CHANNELS;
    temp.resize(needed, 0.0);

    // Horizontal pass: data → temp
    for y in 0..height {
        for x in 0..width {
            for c in 0..CHANNELS {
                let mut sum = 0.0f32;
                for (k, &w) in kernel.iter().enumerate() {
                    let sx = (x as isize + k as isize - half as isize)
                        .max(0)
                        .min((width - 1) as isize) as usize;
                    sum += data[(y * width + sx) * CHANNELS + c] as f32 * w;
                }
                temp[(y * width + x) * CHANNELS + c] = sum;
            }
        }
    }

    // Vertical pass: temp → data
    for y in 0..height {
        for x in 0..width {
            for c in 0..CHANNELS {
                let mut sum = 0.0f32;
                for (k, &w) in kernel.iter().enumerate() {
                    let sy = (y as isize + k as isize - half as isize)
                        .max(0)
                        .min((height - 1) as isize) as usize;
                    sum += temp[(sy * width + x) * CHANNELS + c] * w;
                }
                data[(y * width + x) * CHANNELS + c] = sum.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}
