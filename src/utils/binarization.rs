//! Grayscale to bit matrix conversion.
//!
//! Two variants: a global histogram (Otsu) threshold for small regions and a
//! local adaptive threshold against a Gaussian-weighted mean for everything else.
//! Output convention: true = dark module.

use rayon::prelude::*;

use crate::models::{BitMatrix, GrayImage};

/// Smallest width and height handled by the adaptive variant
pub const ADAPTIVE_MIN_SIZE: usize = 25;

/// Pixels brighter than `local mean - ADAPTIVE_BIAS` are light
pub const ADAPTIVE_BIAS: f64 = 10.0;

/// Binarization strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binarizer {
    /// Single threshold from the image histogram
    GlobalHistogram,
    /// Per-pixel threshold from a Gaussian local mean
    AdaptiveThresholdMean,
}

impl Binarizer {
    /// Variant used for a region of the given size
    pub fn select(width: usize, height: usize) -> Self {
        if width < ADAPTIVE_MIN_SIZE || height < ADAPTIVE_MIN_SIZE {
            Binarizer::GlobalHistogram
        } else {
            Binarizer::AdaptiveThresholdMean
        }
    }

    /// Binarize `img`. The adaptive variant falls back to the global one when
    /// no usable block size exists for the image width.
    pub fn binarize(&self, img: &GrayImage) -> BitMatrix {
        match self {
            Binarizer::GlobalHistogram => global_histogram_binarize(img),
            Binarizer::AdaptiveThresholdMean => adaptive_threshold_mean_binarize(img)
                .unwrap_or_else(|| {
                    log::trace!(
                        "adaptive block size unavailable for width {}, using global threshold",
                        img.width()
                    );
                    global_histogram_binarize(img)
                }),
        }
    }
}

/// Binarize with the variant chosen by [`Binarizer::select`]
pub fn binarize(img: &GrayImage) -> BitMatrix {
    Binarizer::select(img.width(), img.height()).binarize(img)
}

/// Convert grayscale image to binary using Otsu's thresholding method
pub fn global_histogram_binarize(img: &GrayImage) -> BitMatrix {
    let threshold = calculate_otsu_threshold(img);
    threshold_binarize(img, threshold)
}

/// Calculate Otsu's optimal threshold
fn calculate_otsu_threshold(img: &GrayImage) -> u8 {
    // Build histogram
    let mut histogram = [0u32; 256];
    for y in 0..img.height() {
        for &pixel in img.row(y) {
            histogram[pixel as usize] += 1;
        }
    }

    let total_pixels = (img.width() * img.height()) as f64;
    let mut max_variance = 0.0;
    let mut optimal_threshold = 128u8;

    for threshold in 0..=255u32 {
        let mut class1_pixels = 0u64;
        let mut class1_sum = 0u64;
        let mut class2_pixels = 0u64;
        let mut class2_sum = 0u64;

        for (intensity, &count) in histogram.iter().enumerate() {
            let count = count as u64;
            if (intensity as u32) < threshold {
                class1_pixels += count;
                class1_sum += count * intensity as u64;
            } else {
                class2_pixels += count;
                class2_sum += count * intensity as u64;
            }
        }

        if class1_pixels == 0 || class2_pixels == 0 {
            continue;
        }

        let class1_mean = class1_sum as f64 / class1_pixels as f64;
        let class2_mean = class2_sum as f64 / class2_pixels as f64;

        let weight1 = class1_pixels as f64 / total_pixels;
        let weight2 = class2_pixels as f64 / total_pixels;

        let variance = weight1 * weight2 * (class1_mean - class2_mean).powi(2);

        if variance > max_variance {
            max_variance = variance;
            optimal_threshold = threshold as u8;
        }
    }

    optimal_threshold
}

/// Simple global threshold binarization (pixels below `threshold` are dark)
pub fn threshold_binarize(img: &GrayImage, threshold: u8) -> BitMatrix {
    let mut binary = BitMatrix::new(img.width(), img.height());
    for y in 0..img.height() {
        for (x, &v) in img.row(y).iter().enumerate() {
            binary.set(x, y, v < threshold);
        }
    }
    binary
}

/// Odd Gaussian block size for an image `width` pixels wide: `width / 10`,
/// stepped down to odd. `None` unless the result is odd and greater than one.
pub fn adaptive_block_size(width: usize) -> Option<usize> {
    let bs = width / 10;
    let bs = if bs % 2 == 0 { bs.checked_sub(1)? } else { bs };
    (bs % 2 == 1 && bs > 1).then_some(bs)
}

/// Normalized 1D Gaussian kernel of `size` taps
pub fn gaussian_kernel(size: usize) -> Vec<f64> {
    let sigma = (0.3 * (((size as f64 - 1.0) / 2.0) - 1.0) + 0.8).max(0.1);
    let center = (size / 2) as f64;
    let mut kernel: Vec<f64> = (0..size)
        .map(|x| (-0.5 * ((x as f64 - center) / sigma).powi(2)).exp())
        .collect();
    let sum: f64 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}

/// Separable Gaussian blur with edge replication, horizontal then vertical
fn gaussian_blur(src: &[f64], width: usize, height: usize, kernel: &[f64]) -> Vec<f64> {
    let pad = kernel.len() as isize / 2;
    let clamp = |v: isize, len: usize| v.clamp(0, len as isize - 1) as usize;

    let mut horizontal = vec![0.0f64; width * height];
    horizontal
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, out)| {
            let row = &src[y * width..(y + 1) * width];
            for (x, o) in out.iter_mut().enumerate() {
                let mut acc = 0.0;
                for (k, w) in kernel.iter().enumerate() {
                    acc += row[clamp(x as isize + k as isize - pad, width)] * w;
                }
                *o = acc;
            }
        });

    let mut blurred = vec![0.0f64; width * height];
    blurred
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, out)| {
            for (k, w) in kernel.iter().enumerate() {
                let sy = clamp(y as isize + k as isize - pad, height);
                let row = &horizontal[sy * width..(sy + 1) * width];
                for (o, v) in out.iter_mut().zip(row) {
                    *o += v * w;
                }
            }
        });

    blurred
}

/// Adaptive threshold against a Gaussian local mean.
///
/// Returns `None` for regions smaller than [`ADAPTIVE_MIN_SIZE`] or when no
/// valid block size exists. The working buffer is staged bottom-up and written
/// back top-down, so the returned matrix has the same row order as `img`.
pub fn adaptive_threshold_mean_binarize(img: &GrayImage) -> Option<BitMatrix> {
    let (width, height) = (img.width(), img.height());
    if width < ADAPTIVE_MIN_SIZE || height < ADAPTIVE_MIN_SIZE {
        return None;
    }
    let block_size = adaptive_block_size(width)?;
    let kernel = gaussian_kernel(block_size);

    let mut staged = vec![0.0f64; width * height];
    for (j, row) in staged.chunks_mut(width).enumerate() {
        for (dst, &v) in row.iter_mut().zip(img.row(height - 1 - j)) {
            *dst = v as f64;
        }
    }

    let mean = gaussian_blur(&staged, width, height, &kernel);

    let mut matrix = BitMatrix::new(width, height);
    for y in 0..height {
        let j = height - 1 - y;
        for x in 0..width {
            let idx = j * width + x;
            let light = staged[idx] > mean[idx] - ADAPTIVE_BIAS;
            matrix.set(x, y, !light);
        }
    }
    Some(matrix)
}
