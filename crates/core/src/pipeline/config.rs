use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detect::infrastructure::hsv::HsvRange;
use crate::shared::constants::{
    DEFAULT_BLUR_KERNEL, DEFAULT_CLOSE_ITERATIONS, DEFAULT_CLOSE_KERNEL, DEFAULT_ERODE_ITERATIONS,
    DEFAULT_MIN_AREA, DEFAULT_MIN_CIRCULARITY, DEFAULT_TARGET_WIDTH,
};

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("hsv range is not ordered or hue exceeds 179")]
    InvalidHsvRange,
    #[error("{name} kernel must be a positive odd integer, got {value}")]
    InvalidKernel { name: &'static str, value: usize },
    #[error("min_circularity must be in (0, 1], got {0}")]
    InvalidCircularity(f64),
    #[error("min_area must be a non-negative finite number, got {0}")]
    InvalidArea(f64),
    #[error("fps override must be positive, got {0}")]
    InvalidFps(f64),
}

/// Every tunable of the pipeline, with the defaults the detector was
/// calibrated with. Historically these lived as literals scattered across
/// three diverging copies of the processing code; they are consolidated here
/// and passed in explicitly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Processing width cap; 0 disables downscaling and the pipeline runs at
    /// source resolution. Detection quality is unaffected either way; this
    /// trades memory and throughput only.
    pub target_width: u32,

    /// The color band that defines the target object.
    pub hsv: HsvRange,

    /// Contours with a smaller traced-polygon area (px², processing
    /// resolution) are discarded as noise.
    pub min_area: f64,

    /// Acceptance threshold for the 4πA/P² shape score. Lower values admit
    /// rougher shapes; higher values admit only near-perfect circles.
    pub min_circularity: f64,

    /// Gaussian kernel applied before segmentation. Odd.
    pub blur_kernel: usize,

    /// Structuring element for morphological closing. Odd.
    pub close_kernel: usize,
    pub close_iterations: usize,

    /// Post-closing erosion passes (3x3 element).
    pub erode_iterations: usize,

    /// Output frame rate; `None` inherits the source rate.
    pub fps: Option<f64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_width: DEFAULT_TARGET_WIDTH,
            hsv: HsvRange::default(),
            min_area: DEFAULT_MIN_AREA,
            min_circularity: DEFAULT_MIN_CIRCULARITY,
            blur_kernel: DEFAULT_BLUR_KERNEL,
            close_kernel: DEFAULT_CLOSE_KERNEL,
            close_iterations: DEFAULT_CLOSE_ITERATIONS,
            erode_iterations: DEFAULT_ERODE_ITERATIONS,
            fps: None,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.hsv.is_valid() {
            return Err(ConfigError::InvalidHsvRange);
        }
        for (name, value) in [("blur", self.blur_kernel), ("close", self.close_kernel)] {
            if value == 0 || value % 2 == 0 {
                return Err(ConfigError::InvalidKernel { name, value });
            }
        }
        if !(self.min_circularity > 0.0 && self.min_circularity <= 1.0) {
            return Err(ConfigError::InvalidCircularity(self.min_circularity));
        }
        if !self.min_area.is_finite() || self.min_area < 0.0 {
            return Err(ConfigError::InvalidArea(self.min_area));
        }
        if let Some(fps) = self.fps {
            if !(fps > 0.0) {
                return Err(ConfigError::InvalidFps(fps));
            }
        }
        Ok(())
    }
}
