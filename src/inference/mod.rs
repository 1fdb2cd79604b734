//! Black-box neural inference capability.
//!
//! The pipeline only ever feeds a [`Tensor`] to a loaded [`Model`] and reads a
//! [`Tensor`] back. Backends turn weight bytes into models; the ONNX Runtime
//! backend is available behind the `onnx` feature.

#[cfg(feature = "onnx")]
pub mod onnx;

use crate::error::{QrError, Result};
use crate::models::GrayImage;

/// Dense f32 tensor in row-major order.
///
/// Image tensors use the NCHW layout with a single batch and channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    /// Dimension sizes, outermost first
    pub shape: Vec<usize>,
    /// Row-major values
    pub data: Vec<f32>,
}

impl Tensor {
    /// Wrap `data` with `shape`; fails if the element counts disagree
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(QrError::InvalidArgument(format!(
                "tensor shape {shape:?} needs {expected} values, got {}",
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// `[1, 1, h, w]` tensor holding `pixel * scale` for every pixel
    pub fn from_gray(img: &GrayImage, scale: f32) -> Self {
        let mut data = Vec::with_capacity(img.width() * img.height());
        for y in 0..img.height() {
            data.extend(img.row(y).iter().map(|&v| v as f32 * scale));
        }
        Self {
            shape: vec![1, 1, img.height(), img.width()],
            data,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the tensor holds no values
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sizes of the two innermost dimensions as `(height, width)`
    pub fn spatial_dims(&self) -> Option<(usize, usize)> {
        match self.shape.as_slice() {
            [.., h, w] => Some((*h, *w)),
            _ => None,
        }
    }
}

/// A loaded network.
///
/// `infer` takes `&mut self` because engines keep per-session scratch state;
/// one model must not run two forward passes at once.
pub trait Model: Send {
    /// Run one forward pass
    fn infer(&mut self, input: &Tensor) -> Result<Tensor>;
}

/// Turns serialized weights into runnable models
pub trait InferenceBackend: Send + Sync {
    /// Load `bytes` as the model called `name` (the name is used in errors and logs)
    fn load_weights(&self, name: &str, bytes: &[u8]) -> Result<Box<dyn Model>>;
}

impl<F> Model for F
where
    F: FnMut(&Tensor) -> Result<Tensor> + Send,
{
    fn infer(&mut self, input: &Tensor) -> Result<Tensor> {
        self(input)
    }
}
