//! Image processing helpers
//!
//! This module provides the classical building blocks of the pipeline:
//! - Binarization (global histogram and adaptive Gaussian mean)
//! - Grayscale conversion from interleaved pixel formats
//! - Resampling (bicubic and bilinear)
//! - Encoded image decoding

pub mod binarization;
pub mod codec;
pub mod grayscale;
pub mod resize;
