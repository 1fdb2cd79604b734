//! deepqr - QR code localization and decoding
//!
//! A learned region detector proposes candidate regions, each region is
//! cropped, optionally super-resolved, adaptively binarized and decoded, and
//! the results are deduplicated across scales. Without models the whole image
//! is treated as one candidate and upscaling is bicubic.

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Opaque-handle request/response runtime
pub mod api;
/// Detector configuration and environment overrides
pub mod config;
/// Symbol decoding from bit matrices
pub mod decoder;
/// Region proposals, cropping and deduplication
pub mod detector;
/// Error taxonomy and boundary error codes
pub mod error;
/// Tensor-in, tensor-out inference capability
pub mod inference;
/// Core data structures (GrayImage, BitMatrix, Quad, ResultSet, etc.)
pub mod models;
/// Per-image orchestration
pub mod pipeline;
/// Thread-safe keyed resource registry
pub mod registry;
/// Scale selection and resampling
pub mod scale;
/// Dataset helpers for the CLI
pub mod tools;
/// Utility functions (grayscale, binarization, resampling, codecs)
pub mod utils;

pub use api::{Handle, QrRuntime};
pub use config::DetectorConfig;
pub use error::{ErrorCode, QrError, Result};
pub use models::{BitMatrix, DecodeRecord, GrayImage, Point, Quad, ResultSet};
pub use utils::grayscale::PixelFormat;

use std::path::Path;

use decoder::{RqrrDecoder, SymbolDecoder};
use detector::RegionDetector;
use inference::{InferenceBackend, Model};
use pipeline::Pipeline;
use scale::SuperScale;
use utils::codec::{decode_image_bytes, decode_image_path};
use utils::grayscale::to_grayscale;

/// Model name used for the region detection network
pub const DETECT_MODEL_NAME: &str = "detect";
/// Model name used for the super-resolution network
pub const SR_MODEL_NAME: &str = "sr";

/// Detect and decode QR codes in a grayscale image without neural models
pub fn detect(image: &GrayImage) -> ResultSet {
    Detector::new().detect_and_decode(image)
}

/// A configured detection pipeline with its loaded models.
///
/// Calls take `&mut self`: one detector runs one image at a time. Share a
/// detector between threads behind a `Mutex`, or create one per thread.
#[derive(Debug)]
pub struct Detector {
    pipeline: Pipeline,
    config: DetectorConfig,
}

impl Detector {
    /// Detector without neural models and with default settings
    pub fn new() -> Self {
        Self::from_models(None, None, DetectorConfig::default())
    }

    /// Detector around already-loaded models
    pub fn from_models(
        detect: Option<Box<dyn Model>>,
        sr: Option<Box<dyn Model>>,
        config: DetectorConfig,
    ) -> Self {
        let mut super_scale = SuperScale::new(sr);
        super_scale.set_use_sr(config.use_super_resolution);
        super_scale.set_sr_max_size(config.sr_max_size);

        let mut pipeline = Pipeline::new(
            RegionDetector::new(detect),
            super_scale,
            Box::new(RqrrDecoder::new()),
            config.crop,
        );
        pipeline.set_scale_factor(config.scale_factor());
        Self { pipeline, config }
    }

    /// Load model weights through `backend`.
    ///
    /// Every model whose weights are given must load, otherwise construction
    /// fails with [`QrError::ModelLoad`].
    pub fn with_models(
        backend: &dyn InferenceBackend,
        detect_weights: Option<&[u8]>,
        sr_weights: Option<&[u8]>,
        config: DetectorConfig,
    ) -> Result<Self> {
        let detect = detect_weights
            .map(|bytes| backend.load_weights(DETECT_MODEL_NAME, bytes))
            .transpose()?;
        let sr = sr_weights
            .map(|bytes| backend.load_weights(SR_MODEL_NAME, bytes))
            .transpose()?;
        log::debug!(
            "detector created (detect model: {}, sr model: {})",
            detect.is_some(),
            sr.is_some()
        );
        Ok(Self::from_models(detect, sr, config))
    }

    /// Load the model files named in `config` through `backend`
    pub fn from_config(backend: &dyn InferenceBackend, config: DetectorConfig) -> Result<Self> {
        let detect = config
            .detect_model
            .as_deref()
            .map(|p| read_weights(DETECT_MODEL_NAME, p))
            .transpose()?;
        let sr = config
            .sr_model
            .as_deref()
            .map(|p| read_weights(SR_MODEL_NAME, p))
            .transpose()?;
        Self::with_models(backend, detect.as_deref(), sr.as_deref(), config)
    }

    /// Replace the symbol decoder
    pub fn with_decoder(mut self, decoder: Box<dyn SymbolDecoder>) -> Self {
        self.pipeline.set_decoder(decoder);
        self
    }

    /// Active configuration
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Override the detector input scale; values outside (0, 1] restore the
    /// default area-based policy
    pub fn set_scale_factor(&mut self, factor: f32) {
        self.config.set_scale_factor(factor);
        self.pipeline.set_scale_factor(self.config.scale_factor());
    }

    /// Current detector input scale override
    pub fn scale_factor(&self) -> Option<f32> {
        self.config.scale_factor()
    }

    /// Find and decode all symbols in a grayscale image
    pub fn detect_and_decode(&mut self, image: &GrayImage) -> ResultSet {
        self.pipeline.run(image)
    }

    /// Decode an encoded image (PNG, JPEG, ...) and search it
    pub fn detect_and_decode_bytes(&mut self, data: &[u8]) -> Result<ResultSet> {
        let image = decode_image_bytes(data)?;
        Ok(self.detect_and_decode(&image))
    }

    /// Read and decode an image file and search it
    pub fn detect_and_decode_path<P: AsRef<Path>>(&mut self, path: P) -> Result<ResultSet> {
        let image = decode_image_path(path)?;
        Ok(self.detect_and_decode(&image))
    }

    /// Convert interleaved pixels to grayscale and search them
    pub fn detect_and_decode_pixels(
        &mut self,
        pixels: &[u8],
        format: PixelFormat,
        width: usize,
        height: usize,
        stride: Option<usize>,
    ) -> Result<ResultSet> {
        let image = to_grayscale(pixels, format, width, height, stride)?;
        Ok(self.detect_and_decode(&image))
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

fn read_weights(name: &str, path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|err| QrError::ModelLoad {
        model: name.to_string(),
        reason: format!("{}: {err}", path.display()),
    })
}
