//! Error types for the detection pipeline and its boundary layer.
//!
//! Only boundary problems (handles, indices, buffers, arguments) and images that
//! cannot be parsed at all ever reach a caller. Everything that goes wrong inside
//! the detect/enhance/binarize/decode loop is absorbed as "no decode".

use thiserror::Error;

/// Errors surfaced by the detector and the handle runtime.
#[derive(Debug, Error)]
pub enum QrError {
    /// Unknown or already released handle
    #[error("invalid handle")]
    InvalidHandle,

    /// Result index out of range
    #[error("index {index} out of range for {len} results")]
    InvalidIndex {
        /// Requested index
        index: usize,
        /// Number of results available
        len: usize,
    },

    /// Output buffer is too small; nothing was written
    #[error("buffer too small, {required} elements required")]
    BufferTooSmall {
        /// Size the caller must provide
        required: usize,
    },

    /// Input bytes could not be parsed as a raster image
    #[error("image decode failed: {0}")]
    DecodeFailed(String),

    /// Null, empty or inconsistent input
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Allocation failure while preparing pixel buffers
    #[error("out of memory")]
    OutOfMemory,

    /// Model weights were rejected by the inference backend
    #[error("failed to load model '{model}': {reason}")]
    ModelLoad {
        /// Model name
        model: String,
        /// Backend message
        reason: String,
    },

    /// Forward pass failed or produced an unusable tensor
    #[error("inference failed in model '{model}': {context}")]
    Inference {
        /// Model name
        model: String,
        /// What went wrong
        context: String,
    },
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, QrError>;

/// Stable integer codes of the request/response contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    /// Success
    Ok = 0,
    /// Invalid handle
    InvalidHandle = -1,
    /// Invalid index
    InvalidIndex = -2,
    /// Buffer too small
    BufferTooSmall = -3,
    /// Image decode failed
    DecodeFailed = -4,
    /// Invalid argument
    InvalidArgument = -5,
    /// Out of memory
    OutOfMemory = -6,
}

impl QrError {
    /// Boundary error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            QrError::InvalidHandle => ErrorCode::InvalidHandle,
            QrError::InvalidIndex { .. } => ErrorCode::InvalidIndex,
            QrError::BufferTooSmall { .. } => ErrorCode::BufferTooSmall,
            QrError::DecodeFailed(_) => ErrorCode::DecodeFailed,
            QrError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            QrError::OutOfMemory => ErrorCode::OutOfMemory,
            QrError::ModelLoad { .. } | QrError::Inference { .. } => ErrorCode::DecodeFailed,
        }
    }
}

impl From<image::ImageError> for QrError {
    fn from(err: image::ImageError) -> Self {
        QrError::DecodeFailed(err.to_string())
    }
}

impl From<std::collections::TryReserveError> for QrError {
    fn from(_: std::collections::TryReserveError) -> Self {
        QrError::OutOfMemory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(QrError::InvalidHandle.code() as i32, -1);
        assert_eq!(QrError::InvalidIndex { index: 3, len: 1 }.code() as i32, -2);
        assert_eq!(QrError::BufferTooSmall { required: 6 }.code() as i32, -3);
        assert_eq!(QrError::DecodeFailed("x".into()).code() as i32, -4);
        assert_eq!(QrError::InvalidArgument("x".into()).code() as i32, -5);
        assert_eq!(QrError::OutOfMemory.code() as i32, -6);
        assert_eq!(ErrorCode::Ok as i32, 0);
    }

    #[test]
    fn test_display() {
        let err = QrError::BufferTooSmall { required: 6 };
        assert_eq!(err.to_string(), "buffer too small, 6 elements required");
    }
}
