use serde::{Deserialize, Serialize};

use crate::shared::constants::{
    DEFAULT_HUE_MAX, DEFAULT_HUE_MIN, DEFAULT_SAT_MAX, DEFAULT_SAT_MIN, DEFAULT_VAL_MAX,
    DEFAULT_VAL_MIN,
};
use crate::shared::frame::Frame;
use crate::shared::mask::Mask;

/// Inclusive HSV acceptance band.
///
/// Hue uses the OpenCV 8-bit convention: degrees halved, so the valid range
/// is [0, 180). Saturation and value are plain 0-255. This is the single
/// most important tunable in the pipeline: it decides what "the ball's
/// color" means.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub hue_min: u8,
    pub hue_max: u8,
    pub sat_min: u8,
    pub sat_max: u8,
    pub val_min: u8,
    pub val_max: u8,
}

impl Default for HsvRange {
    /// The pink/magenta band the pipeline was calibrated for.
    fn default() -> Self {
        Self {
            hue_min: DEFAULT_HUE_MIN,
            hue_max: DEFAULT_HUE_MAX,
            sat_min: DEFAULT_SAT_MIN,
            sat_max: DEFAULT_SAT_MAX,
            val_min: DEFAULT_VAL_MIN,
            val_max: DEFAULT_VAL_MAX,
        }
    }
}

impl HsvRange {
    pub fn contains(&self, h: u8, s: u8, v: u8) -> bool {
        (self.hue_min..=self.hue_max).contains(&h)
            && (self.sat_min..=self.sat_max).contains(&s)
            && (self.val_min..=self.val_max).contains(&v)
    }

    /// Bands must be ordered and hue must stay below 180.
    pub fn is_valid(&self) -> bool {
        self.hue_min <= self.hue_max
            && self.hue_max < 180
            && self.sat_min <= self.sat_max
            && self.val_min <= self.val_max
    }
}

/// Converts one RGB pixel to HSV in the OpenCV 8-bit scale:
/// H in [0, 180), S and V in [0, 255].
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (rf, gf, bf) = (r as f64, g as f64, b as f64);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let v = max;
    let s = if max == 0.0 { 0.0 } else { 255.0 * delta / max };

    let h_deg = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / delta
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    let h_deg = if h_deg < 0.0 { h_deg + 360.0 } else { h_deg };

    let h = ((h_deg / 2.0).round() as u16 % 180) as u8;
    (h, s.round() as u8, v.round() as u8)
}

/// Thresholds a frame against `range`, producing the binary mask the rest of
/// the detector operates on.
pub fn segment(frame: &Frame, range: &HsvRange) -> Mask {
    let mut data = Vec::with_capacity((frame.width() * frame.height()) as usize);
    for px in frame.data().chunks_exact(3) {
        let (h, s, v) = rgb_to_hsv(px[0], px[1], px[2]);
        data.push(if range.contains(h, s, v) {
            crate::shared::mask::ON
        } else {
            crate::shared::mask::OFF
        });
    }
    Mask::new(data, frame.width(), frame.height())
}
