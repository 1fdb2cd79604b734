//! Handle-based request/response runtime.
//!
//! Detectors and result sets live in registries and are addressed by opaque
//! [`Handle`]s. Text and point accessors follow a two-phase protocol: call
//! without a buffer to learn the required size, then call again with a buffer
//! at least that large. An undersized buffer is rejected before anything is
//! written to it.

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use crate::config::DetectorConfig;
use crate::error::{QrError, Result};
use crate::inference::InferenceBackend;
use crate::models::{DecodeRecord, ResultSet};
use crate::registry::HandleRegistry;
use crate::utils::grayscale::PixelFormat;
use crate::Detector;

/// Floats written per result by [`QrRuntime::result_points`]
pub const POINTS_LEN: usize = 8;

/// Opaque resource key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u64);

impl Handle {
    /// Raw key, for passing across a foreign boundary
    pub fn as_raw(&self) -> u64 {
        self.0
    }

    /// Rebuild a handle from a raw key
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

/// Owner of every detector and result set created through it
#[derive(Debug, Default)]
pub struct QrRuntime {
    detectors: HandleRegistry<Mutex<Detector>>,
    results: HandleRegistry<ResultSet>,
}

impl QrRuntime {
    /// Empty runtime
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector without neural models
    pub fn create_detector(&self) -> Handle {
        self.register_detector(Detector::new())
    }

    /// Create a detector whose models are loaded from the files named in
    /// `config` through `backend`
    pub fn create_detector_with(
        &self,
        backend: &dyn InferenceBackend,
        config: DetectorConfig,
    ) -> Result<Handle> {
        let detector = Detector::from_config(backend, config)?;
        Ok(self.register_detector(detector))
    }

    /// Register an already constructed detector
    pub fn register_detector(&self, detector: Detector) -> Handle {
        Handle(self.detectors.insert(Mutex::new(detector)))
    }

    /// Release a detector
    pub fn release_detector(&self, handle: Handle) -> Result<()> {
        if self.detectors.remove(handle.0) {
            Ok(())
        } else {
            Err(QrError::InvalidHandle)
        }
    }

    /// Search encoded image bytes; returns a result-set handle
    pub fn detect_and_decode_data(&self, detector: Handle, data: &[u8]) -> Result<Handle> {
        if data.is_empty() {
            return Err(QrError::InvalidArgument("image data is empty".into()));
        }
        self.run(detector, |d| d.detect_and_decode_bytes(data))
    }

    /// Search an image file; returns a result-set handle
    pub fn detect_and_decode_path<P: AsRef<Path>>(&self, detector: Handle, path: P) -> Result<Handle> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(QrError::InvalidArgument("path is empty".into()));
        }
        self.run(detector, |d| d.detect_and_decode_path(path))
    }

    /// Search raw interleaved pixels; returns a result-set handle
    pub fn detect_and_decode_pixels(
        &self,
        detector: Handle,
        pixels: &[u8],
        format: PixelFormat,
        width: usize,
        height: usize,
        stride: Option<usize>,
    ) -> Result<Handle> {
        if pixels.is_empty() || width == 0 || height == 0 {
            return Err(QrError::InvalidArgument(format!(
                "empty pixel input ({} bytes, {width}x{height})",
                pixels.len()
            )));
        }
        self.run(detector, |d| {
            d.detect_and_decode_pixels(pixels, format, width, height, stride)
        })
    }

    fn run<F>(&self, detector: Handle, search: F) -> Result<Handle>
    where
        F: FnOnce(&mut Detector) -> Result<ResultSet>,
    {
        let detector = self.detectors.get(detector.0).ok_or(QrError::InvalidHandle)?;
        let results = {
            let mut guard = detector.lock().unwrap_or_else(PoisonError::into_inner);
            search(&mut *guard)?
        };
        Ok(Handle(self.results.insert(results)))
    }

    /// Release a result set
    pub fn release_result(&self, handle: Handle) -> Result<()> {
        if self.results.remove(handle.0) {
            Ok(())
        } else {
            Err(QrError::InvalidHandle)
        }
    }

    /// Number of records in a result set
    pub fn result_size(&self, handle: Handle) -> Result<usize> {
        Ok(self.result_set(handle)?.len())
    }

    /// Payload bytes of record `index`, exactly as decoded.
    ///
    /// Returns the required size (payload length plus a NUL terminator). With a
    /// buffer of at least that size the payload and terminator are copied in.
    pub fn result_text(&self, handle: Handle, index: usize, buffer: Option<&mut [u8]>) -> Result<usize> {
        let set = self.result_set(handle)?;
        let payload = record(&set, index)?.data.as_slice();
        let required = payload.len() + 1;
        if let Some(buffer) = buffer {
            if buffer.len() < required {
                return Err(QrError::BufferTooSmall { required });
            }
            buffer[..payload.len()].copy_from_slice(payload);
            buffer[payload.len()] = 0;
        }
        Ok(required)
    }

    /// Corner points of record `index` as `[x0, y0, .., x3, y3]`; the
    /// required size is always [`POINTS_LEN`]
    pub fn result_points(&self, handle: Handle, index: usize, buffer: Option<&mut [f32]>) -> Result<usize> {
        let set = self.result_set(handle)?;
        let flat = record(&set, index)?.quad.to_flat();
        if let Some(buffer) = buffer {
            if buffer.len() < POINTS_LEN {
                return Err(QrError::BufferTooSmall { required: POINTS_LEN });
            }
            buffer[..POINTS_LEN].copy_from_slice(&flat);
        }
        Ok(POINTS_LEN)
    }

    /// Shared view of a whole result set
    pub fn result_set(&self, handle: Handle) -> Result<std::sync::Arc<ResultSet>> {
        self.results.get(handle.0).ok_or(QrError::InvalidHandle)
    }

    /// Live detector count
    pub fn detector_count(&self) -> usize {
        self.detectors.len()
    }

    /// Live result set count
    pub fn result_count(&self) -> usize {
        self.results.len()
    }
}

fn record(set: &ResultSet, index: usize) -> Result<&DecodeRecord> {
    set.get(index).ok_or(QrError::InvalidIndex {
        index,
        len: set.len(),
    })
}
