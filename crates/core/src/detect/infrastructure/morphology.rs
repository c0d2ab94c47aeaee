//! Binary morphology over [`Mask`] with odd square structuring elements.
//!
//! Out-of-bounds neighbors are ignored, so a blob touching the frame edge is
//! not eaten by erosion there (the OpenCV replicate-extreme border rule).

use crate::shared::mask::{Mask, OFF, ON};

/// A pixel turns on if any neighbor under the kernel is on.
pub fn dilate(mask: &Mask, kernel_size: usize) -> Mask {
    morph(mask, kernel_size, false)
}

/// A pixel stays on only if every in-bounds neighbor under the kernel is on.
pub fn erode(mask: &Mask, kernel_size: usize) -> Mask {
    morph(mask, kernel_size, true)
}

pub fn erode_n(mask: &Mask, kernel_size: usize, iterations: usize) -> Mask {
    let mut out = mask.clone();
    for _ in 0..iterations {
        out = erode(&out, kernel_size);
    }
    out
}

/// Morphological closing: `iterations` dilations followed by the same number
/// of erosions. Merges nearby fragments and fills small holes without
/// changing the overall blob size.
pub fn close(mask: &Mask, kernel_size: usize, iterations: usize) -> Mask {
    let mut out = mask.clone();
    for _ in 0..iterations {
        out = dilate(&out, kernel_size);
    }
    for _ in 0..iterations {
        out = erode(&out, kernel_size);
    }
    out
}

fn morph(mask: &Mask, kernel_size: usize, all: bool) -> Mask {
    debug_assert!(kernel_size >= 1 && kernel_size % 2 == 1);
    let width = mask.width() as isize;
    let height = mask.height() as isize;
    let half = (kernel_size / 2) as isize;

    let mut out = Mask::empty(mask.width(), mask.height());
    for y in 0..height {
        for x in 0..width {
            let mut hit = all;
            'kernel: for ky in -half..=half {
                for kx in -half..=half {
                    let (nx, ny) = (x + kx, y + ky);
                    if nx < 0 || ny < 0 || nx >= width || ny >= height {
                        continue;
                    }
                    let on = mask.get(nx as u32, ny as u32);
                    if all && !on {
                        hit = false;
                        break 'kernel;
                    }
                    if !all && on {
                        hit = true;
                        break 'kernel;
                    }
                }
            }
            out.data_mut()[(y * width + x) as usize] = if hit { ON } else { OFF };
        }
    }
    out
}
