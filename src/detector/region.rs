//! Neural region proposals.
//!
//! The detection network sees a bicubic-resized copy of the image normalized to
//! [0, 1] and emits rows of `(class, score, x0, y0, x1, y1)` with normalized
//! coordinates. Accepted rows become axis-aligned quads in the frame of the
//! image that was passed in.

use crate::inference::{Model, Tensor};
use crate::models::{GrayImage, Quad};
use crate::utils::resize::resize_bicubic;

/// Network input area the default scale policy aims for (400 x 400)
pub const TARGET_AREA: f32 = 400.0 * 400.0;

/// Rows with a score at or below this are ignored
pub const MIN_SCORE: f32 = 1e-5;

/// Class id of QR symbols in the detector output
pub const QR_CLASS: f32 = 1.0;

/// Values per detection row
const ROW_LEN: usize = 6;

/// Scale applied to the image before detection.
///
/// `override_factor` wins when set; otherwise the scale brings the area close
/// to [`TARGET_AREA`] without ever upscaling.
pub fn detection_scale(width: usize, height: usize, override_factor: Option<f32>) -> f32 {
    match override_factor {
        Some(f) => f,
        None => {
            let area = (width * height) as f32;
            if area <= 0.0 {
                return 1.0;
            }
            (TARGET_AREA / area).sqrt().min(1.0)
        }
    }
}

/// Network input size for an image, at least 1 x 1
pub fn detection_size(width: usize, height: usize, override_factor: Option<f32>) -> (usize, usize) {
    let scale = detection_scale(width, height, override_factor);
    let w = ((width as f32 * scale) as usize).max(1);
    let h = ((height as f32 * scale) as usize).max(1);
    (w, h)
}

/// Convert raw detector output into quads in a `width` x `height` frame
pub fn parse_detections(output: &Tensor, width: usize, height: usize) -> Vec<Quad> {
    let max_x = width.saturating_sub(1) as f32;
    let max_y = height.saturating_sub(1) as f32;
    output
        .data
        .chunks_exact(ROW_LEN)
        .filter(|row| row[0] == QR_CLASS && row[1] > MIN_SCORE)
        .map(|row| {
            let x0 = (row[2] * width as f32).clamp(0.0, max_x);
            let y0 = (row[3] * height as f32).clamp(0.0, max_y);
            let x1 = (row[4] * width as f32).clamp(0.0, max_x);
            let y1 = (row[5] * height as f32).clamp(0.0, max_y);
            Quad::from_corners(x0, y0, x1, y1)
        })
        .collect()
}

/// Candidate region proposer
pub struct RegionDetector {
    model: Option<Box<dyn Model>>,
}

impl std::fmt::Debug for RegionDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionDetector")
            .field("model", &self.model.is_some())
            .finish()
    }
}

impl RegionDetector {
    /// Detector backed by `model`; `None` proposes the whole image
    pub fn new(model: Option<Box<dyn Model>>) -> Self {
        Self { model }
    }

    /// Detector without a network
    pub fn fallback() -> Self {
        Self { model: None }
    }

    /// Whether a network is loaded
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Propose candidate quads for `img`, running the network at
    /// `target_width` x `target_height`.
    ///
    /// Without a network, or when inference fails, the whole image is the
    /// single candidate.
    pub fn detect(&mut self, img: &GrayImage, target_width: usize, target_height: usize) -> Vec<Quad> {
        let Some(model) = self.model.as_mut() else {
            return vec![Quad::full_image(img.width(), img.height())];
        };

        let resized = resize_bicubic(img, target_width.max(1), target_height.max(1));
        let input = Tensor::from_gray(&resized, 1.0 / 255.0);
        match model.infer(&input) {
            Ok(output) => {
                let quads = parse_detections(&output, img.width(), img.height());
                log::debug!(
                    "detector proposed {} candidates at {}x{}",
                    quads.len(),
                    target_width,
                    target_height
                );
                quads
            }
            Err(err) => {
                log::warn!("region detection failed, using full image: {err}");
                vec![Quad::full_image(img.width(), img.height())]
            }
        }
    }
}
