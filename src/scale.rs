//! Scale selection and resampling of cropped candidates.
use std::borrow::Cow;

use crate::config::DEFAULT_SR_MAX_SIZE;
use crate::error::{QrError, Result};
use crate::inference::{Model, Tensor};
use crate::models::GrayImage;
use crate::utils::resize::{resize_bicubic, resize_bilinear};

/// Scales to try for a crop of `width` x `height`, in order
pub fn scale_list(width: usize, height: usize) -> &'static [f32] {
    if width < 320 || height < 320 {
        &[1.0, 2.0, 0.5]
    } else if width < 640 && height < 640 {
        &[1.0, 0.5]
    } else {
        &[0.5, 1.0]
    }
}

/// Resampler with an optional super-resolution network for 2x upscales
pub struct SuperScale {
    model: Option<Box<dyn Model>>,
    use_sr: bool,
    sr_max_size: u32,
}

impl std::fmt::Debug for SuperScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuperScale")
            .field("model", &self.model.is_some())
            .field("use_sr", &self.use_sr)
            .field("sr_max_size", &self.sr_max_size)
            .finish()
    }
}

impl Default for SuperScale {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SuperScale {
    /// Resampler using `model` for 2x when set
    pub fn new(model: Option<Box<dyn Model>>) -> Self {
        Self {
            model,
            use_sr: true,
            sr_max_size: DEFAULT_SR_MAX_SIZE,
        }
    }

    /// Enable or disable the network path
    pub fn set_use_sr(&mut self, use_sr: bool) {
        self.use_sr = use_sr;
    }

    /// Network is only used when `sqrt(w * h)` is below this
    pub fn set_sr_max_size(&mut self, size: u32) {
        self.sr_max_size = size;
    }

    /// Whether a super-resolution network is loaded
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Resample `img` by `scale`.
    ///
    /// 1.0 borrows the input, values below 1.0 downsample bilinearly, 2.0 tries
    /// the network and otherwise upsamples bicubically to exactly twice the size.
    pub fn enhance<'a>(&mut self, img: &'a GrayImage, scale: f32) -> Cow<'a, GrayImage> {
        if scale == 1.0 {
            return Cow::Borrowed(img);
        }
        let (width, height) = (img.width(), img.height());
        let target_w = (width as f32 * scale) as usize;
        let target_h = (height as f32 * scale) as usize;

        if scale < 1.0 {
            return Cow::Owned(resize_bilinear(img, target_w, target_h));
        }

        if scale == 2.0 && self.sr_eligible(width, height) {
            match self.super_resolve(img) {
                Ok(out) => return Cow::Owned(out),
                Err(err) => log::warn!("super-resolution failed, using bicubic: {err}"),
            }
        }
        Cow::Owned(resize_bicubic(img, target_w, target_h))
    }

    fn sr_eligible(&self, width: usize, height: usize) -> bool {
        let edge = ((width * height) as f64).sqrt() as u32;
        self.use_sr && edge < self.sr_max_size && self.model.is_some()
    }

    fn super_resolve(&mut self, img: &GrayImage) -> Result<GrayImage> {
        let model = self.model.as_mut().ok_or_else(|| QrError::Inference {
            model: "sr".into(),
            context: "no model loaded".into(),
        })?;
        let output = model.infer(&Tensor::from_gray(img, 1.0 / 255.0))?;
        let (out_h, out_w) = output.spatial_dims().ok_or_else(|| QrError::Inference {
            model: "sr".into(),
            context: format!("output shape {:?} has no spatial axes", output.shape),
        })?;
        if out_w == 0 || out_h == 0 || output.data.len() < out_w * out_h {
            return Err(QrError::Inference {
                model: "sr".into(),
                context: format!("unusable output shape {:?}", output.shape),
            });
        }

        let pixels = output.data[..out_w * out_h]
            .iter()
            .map(|&v| (v * 255.0).clamp(0.0, 255.0) as u8)
            .collect();
        log::trace!(
            "super-resolved {}x{} -> {}x{}",
            img.width(),
            img.height(),
            out_w,
            out_h
        );
        GrayImage::from_raw(out_w, out_h, pixels)
    }
}
