//! ONNX Runtime backend.
use ort::session::Session;
use ort::value::Tensor as OrtTensor;

use super::{InferenceBackend, Model, Tensor};
use crate::error::{QrError, Result};

/// Loads ONNX graphs into single-threaded ONNX Runtime sessions
#[derive(Debug, Default, Clone, Copy)]
pub struct OnnxBackend;

impl OnnxBackend {
    /// Create the backend
    pub fn new() -> Self {
        Self
    }
}

struct OnnxModel {
    name: String,
    session: Session,
}

impl InferenceBackend for OnnxBackend {
    fn load_weights(&self, name: &str, bytes: &[u8]) -> Result<Box<dyn Model>> {
        let load_err = |reason: String| QrError::ModelLoad {
            model: name.to_string(),
            reason,
        };
        let session = Session::builder()
            .map_err(|e| load_err(e.to_string()))?
            .with_intra_threads(1)
            .map_err(|e| load_err(e.to_string()))?
            .commit_from_memory(bytes)
            .map_err(|e| load_err(e.to_string()))?;
        log::debug!("loaded onnx model '{name}' ({} bytes)", bytes.len());
        Ok(Box::new(OnnxModel {
            name: name.to_string(),
            session,
        }))
    }
}

fn inference_error(model: &str, context: impl std::fmt::Display) -> QrError {
    QrError::Inference {
        model: model.to_string(),
        context: context.to_string(),
    }
}

impl Model for OnnxModel {
    fn infer(&mut self, input: &Tensor) -> Result<Tensor> {
        let name = self.name.as_str();
        let shape: Vec<i64> = input.shape.iter().map(|&d| d as i64).collect();
        let value = OrtTensor::from_array((shape, input.data.clone()))
            .map_err(|e| inference_error(name, e))?;

        let outputs = self
            .session
            .run(ort::inputs![value])
            .map_err(|e| inference_error(name, e))?;
        let (out_shape, out_data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| inference_error(name, e))?;

        let shape: Vec<usize> = out_shape.iter().map(|&d| d.max(0) as usize).collect();
        Tensor::new(shape, out_data.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_weights_fail_to_load() {
        let err = OnnxBackend::new()
            .load_weights("detect", b"not an onnx graph")
            .err()
            .expect("garbage must not load");
        assert!(matches!(err, QrError::ModelLoad { ref model, .. } if model == "detect"));
    }

    #[test]
    fn test_inference_error_names_model() {
        let err = inference_error("sr", "bad output");
        assert_eq!(err.to_string(), "inference failed in model 'sr': bad output");
    }
}
