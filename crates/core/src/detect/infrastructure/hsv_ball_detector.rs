use crate::detect::domain::ball_detector::BallDetector;
use crate::detect::infrastructure::contour::{find_external_contours, min_enclosing_circle};
use crate::detect::infrastructure::hsv::{segment, HsvRange};
use crate::detect::infrastructure::morphology::{close, erode_n};
use crate::pipeline::config::PipelineConfig;
use crate::shared::constants::ERODE_KERNEL;
use crate::shared::detection::{circularity, Detection};
use crate::shared::error::PipelineError;
use crate::shared::frame::Frame;
use crate::shared::mask::Mask;

/// Callback observing the cleaned mask of each frame, for debug dumps.
pub type MaskProbe = Box<dyn FnMut(usize, &Mask) + Send>;

/// Finds uniformly-colored round objects by color segmentation.
///
/// Per frame: threshold against the HSV band, close + erode the mask, trace
/// external contours, then keep every contour that is large enough and round
/// enough. The frame handed in is expected to be pre-blurred; the detector
/// itself never smooths.
pub struct HsvBallDetector {
    range: HsvRange,
    min_area: f64,
    min_circularity: f64,
    close_kernel: usize,
    close_iterations: usize,
    erode_iterations: usize,
    mask_probe: Option<MaskProbe>,
}

impl HsvBallDetector {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            range: config.hsv,
            min_area: config.min_area,
            min_circularity: config.min_circularity,
            close_kernel: config.close_kernel,
            close_iterations: config.close_iterations,
            erode_iterations: config.erode_iterations,
            mask_probe: None,
        }
    }

    /// Installs an observer that receives `(frame index, cleaned mask)`.
    pub fn with_mask_probe(mut self, probe: MaskProbe) -> Self {
        self.mask_probe = Some(probe);
        self
    }

    fn cleaned_mask(&self, frame: &Frame) -> Mask {
        let mask = segment(frame, &self.range);
        let mask = close(&mask, self.close_kernel, self.close_iterations);
        erode_n(&mask, ERODE_KERNEL, self.erode_iterations)
    }
}

impl BallDetector for HsvBallDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, PipelineError> {
        let mask = self.cleaned_mask(frame);
        if let Some(probe) = self.mask_probe.as_mut() {
            probe(frame.index(), &mask);
        }

        let mut detections = Vec::new();
        for contour in find_external_contours(&mask) {
            let area = contour.area();
            if area < self.min_area {
                continue;
            }
            let perimeter = contour.perimeter();
            if perimeter == 0.0 {
                continue;
            }
            let score = circularity(area, perimeter);
            if score < self.min_circularity {
                continue;
            }
            let (center, radius) = min_enclosing_circle(&contour.points);
            detections.push(Detection {
                center,
                radius,
                circularity: score,
            });
        }

        log::debug!(
            "frame {}: {} in-band px, {} detection(s)",
            frame.index(),
            mask.count_on(),
            detections.len()
        );
        Ok(detections)
    }
}
