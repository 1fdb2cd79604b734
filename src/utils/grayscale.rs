//! Pixel format conversion to single-channel luminance
//! Y = 0.299*R + 0.587*G + 0.114*B
//! Uses fast integer arithmetic: Y = (76*R + 150*G + 29*B) >> 8
use rayon::prelude::*;

use crate::error::{QrError, Result};
use crate::models::GrayImage;

/// Coefficients for grayscale conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Memory layout of interleaved input pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Single channel gray
    Gray,
    /// 3 channels RGB
    Rgb,
    /// 3 channels BGR
    Bgr,
    /// 4 channels RGBA
    Rgba,
    /// 4 channels BGRA
    Bgra,
    /// 4 channels ARGB
    Argb,
    /// 4 channels ABGR
    Abgr,
}

impl PixelFormat {
    /// Bytes occupied by one pixel
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Gray => 1,
            PixelFormat::Rgb | PixelFormat::Bgr => 3,
            PixelFormat::Rgba | PixelFormat::Bgra | PixelFormat::Argb | PixelFormat::Abgr => 4,
        }
    }

    /// Byte offsets of the (R, G, B) channels inside one pixel
    fn rgb_offsets(&self) -> (usize, usize, usize) {
        match self {
            PixelFormat::Gray => (0, 0, 0),
            PixelFormat::Rgb | PixelFormat::Rgba => (0, 1, 2),
            PixelFormat::Bgr | PixelFormat::Bgra => (2, 1, 0),
            PixelFormat::Argb => (1, 2, 3),
            PixelFormat::Abgr => (3, 2, 1),
        }
    }
}

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let lum = (COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8;
    lum.min(255) as u8
}

/// Convert interleaved pixels to a packed grayscale image.
///
/// `stride` is the distance in bytes between rows; `None` or `Some(0)` means
/// `width * bytes_per_pixel`. Rows are converted in parallel.
pub fn to_grayscale(
    pixels: &[u8],
    format: PixelFormat,
    width: usize,
    height: usize,
    stride: Option<usize>,
) -> Result<GrayImage> {
    if width == 0 || height == 0 {
        return Err(QrError::InvalidArgument(format!(
            "image size {width}x{height} is empty"
        )));
    }
    let overflow = || QrError::InvalidArgument(format!("image size {width}x{height} overflows"));
    let bpp = format.bytes_per_pixel();
    let row_bytes = width.checked_mul(bpp).ok_or_else(overflow)?;
    let stride = match stride {
        Some(s) if s > 0 => s,
        _ => row_bytes,
    };
    if stride < row_bytes {
        return Err(QrError::InvalidArgument(format!(
            "stride {stride} is smaller than row size {row_bytes}"
        )));
    }
    let needed = stride
        .checked_mul(height - 1)
        .and_then(|n| n.checked_add(row_bytes))
        .ok_or_else(overflow)?;
    if pixels.len() < needed {
        return Err(QrError::InvalidArgument(format!(
            "pixel buffer has {} bytes, {needed} required",
            pixels.len()
        )));
    }

    // Bounded by `needed`, which fits in the input buffer
    let mut gray: Vec<u8> = Vec::new();
    gray.try_reserve_exact(width * height)?;
    gray.resize(width * height, 0);

    let (ro, go, bo) = format.rgb_offsets();
    gray.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        let src = &pixels[y * stride..y * stride + row_bytes];
        if format == PixelFormat::Gray {
            row.copy_from_slice(src);
            return;
        }
        for (x, out) in row.iter_mut().enumerate() {
            let px = &src[x * bpp..x * bpp + bpp];
            *out = luma(px[ro], px[go], px[bo]);
        }
    });

    GrayImage::from_raw(width, height, gray)
}
