//! Detector configuration.
//!
//! Defaults reproduce the tuned values of the detection pipeline; every knob
//! can be overridden from the environment with [`DetectorConfig::from_env`].

use std::path::PathBuf;

use crate::detector::align::CropPolicy;

/// Default edge length threshold (sqrt of area) below which the neural
/// super-resolution model is tried for 2x upscales
pub const DEFAULT_SR_MAX_SIZE: u32 = 160;

/// Runtime configuration of a [`crate::Detector`]
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    scale_factor: Option<f32>,
    /// Try the neural super-resolution model for 2x upscales
    pub use_super_resolution: bool,
    /// Neural upscale is only attempted when `sqrt(w * h) < sr_max_size`
    pub sr_max_size: u32,
    /// Padding applied around detector candidates before decoding
    pub crop: CropPolicy,
    /// Weights file for the region detection model
    pub detect_model: Option<PathBuf>,
    /// Weights file for the super-resolution model
    pub sr_model: Option<PathBuf>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            scale_factor: None,
            use_super_resolution: true,
            sr_max_size: DEFAULT_SR_MAX_SIZE,
            crop: CropPolicy::default(),
            detect_model: None,
            sr_model: None,
        }
    }
}

impl DetectorConfig {
    /// Defaults overlaid with `QR_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with values from `lookup`; unparseable values are ignored
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(factor) = parse_var::<f32, _>(&lookup, "QR_SCALE_FACTOR") {
            config.set_scale_factor(factor);
        }
        if let Some(flag) = parse_var::<u8, _>(&lookup, "QR_USE_SR") {
            config.use_super_resolution = flag != 0;
        }
        if let Some(size) = parse_var::<u32, _>(&lookup, "QR_SR_MAX_SIZE") {
            config.sr_max_size = size;
        }
        if let Some(path) = lookup("QR_DETECT_MODEL").filter(|v| !v.trim().is_empty()) {
            config.detect_model = Some(PathBuf::from(path.trim()));
        }
        if let Some(path) = lookup("QR_SR_MODEL").filter(|v| !v.trim().is_empty()) {
            config.sr_model = Some(PathBuf::from(path.trim()));
        }
        config
    }

    /// Override the detector input scale. Values outside (0, 1] reset to the
    /// default area-based policy.
    pub fn set_scale_factor(&mut self, factor: f32) {
        self.scale_factor = (factor > 0.0 && factor <= 1.0).then_some(factor);
    }

    /// Builder-style [`Self::set_scale_factor`]
    pub fn with_scale_factor(mut self, factor: f32) -> Self {
        self.set_scale_factor(factor);
        self
    }

    /// Current override, `None` when the default policy applies
    pub fn scale_factor(&self) -> Option<f32> {
        self.scale_factor
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(name).and_then(|v| v.trim().parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_scale_factor_normalization() {
        let mut config = DetectorConfig::default();
        config.set_scale_factor(0.5);
        assert_eq!(config.scale_factor(), Some(0.5));
        config.set_scale_factor(1.0);
        assert_eq!(config.scale_factor(), Some(1.0));
        config.set_scale_factor(1.5);
        assert_eq!(config.scale_factor(), None);
        config.set_scale_factor(0.0);
        assert_eq!(config.scale_factor(), None);
        config.set_scale_factor(-2.0);
        assert_eq!(config.scale_factor(), None);
        config.set_scale_factor(f32::NAN);
        assert_eq!(config.scale_factor(), None);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("QR_SCALE_FACTOR", "0.25"),
            ("QR_USE_SR", "0"),
            ("QR_SR_MAX_SIZE", " 200 "),
            ("QR_DETECT_MODEL", "/models/detect.onnx"),
        ]
        .into_iter()
        .collect();
        let config = DetectorConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.scale_factor(), Some(0.25));
        assert!(!config.use_super_resolution);
        assert_eq!(config.sr_max_size, 200);
        assert_eq!(config.detect_model, Some(PathBuf::from("/models/detect.onnx")));
        assert_eq!(config.sr_model, None);
    }

    #[test]
    fn test_from_lookup_ignores_garbage() {
        let config = DetectorConfig::from_lookup(|k| match k {
            "QR_SR_MAX_SIZE" => Some("lots".to_string()),
            "QR_SCALE_FACTOR" => Some("7".to_string()),
            _ => None,
        });
        assert_eq!(config, DetectorConfig::default());
    }
}
