//! Documented defaults for every pipeline tunable.
//!
//! These are the values the pipeline was calibrated with (a pink/magenta
//! ball under indoor lighting); all of them are overridable through
//! [`crate::pipeline::config::PipelineConfig`].

/// Processing width cap when downscaling is enabled.
pub const DEFAULT_TARGET_WIDTH: u32 = 640;

/// Hue band, OpenCV convention (H in [0, 180)). 130–175 covers pink/magenta.
pub const DEFAULT_HUE_MIN: u8 = 130;
pub const DEFAULT_HUE_MAX: u8 = 175;

/// Saturation band; the low cut rejects washed-out near-grays.
pub const DEFAULT_SAT_MIN: u8 = 50;
pub const DEFAULT_SAT_MAX: u8 = 255;

/// Value band; the low cut rejects shadows.
pub const DEFAULT_VAL_MIN: u8 = 50;
pub const DEFAULT_VAL_MAX: u8 = 255;

/// Contours below this polygon area (px², at processing resolution) are
/// noise specks.
pub const DEFAULT_MIN_AREA: f64 = 100.0;

/// Circularity acceptance threshold; 1.0 is a perfect circle.
pub const DEFAULT_MIN_CIRCULARITY: f64 = 0.8;

/// Gaussian blur kernel applied before segmentation. Must be odd.
pub const DEFAULT_BLUR_KERNEL: usize = 11;

/// Structuring element for morphological closing. Must be odd.
pub const DEFAULT_CLOSE_KERNEL: usize = 5;
pub const DEFAULT_CLOSE_ITERATIONS: usize = 2;

/// The post-closing erosion always uses a 3x3 element.
pub const ERODE_KERNEL: usize = 3;
pub const DEFAULT_ERODE_ITERATIONS: usize = 1;

/// Marker color for circle outlines and labels (RGB green).
pub const MARKER_COLOR: [u8; 3] = [0, 255, 0];

/// Output is always VP8 in a WebM container, regardless of the extension the
/// caller asked for.
pub const OUTPUT_EXTENSION: &str = "webm";
