//! Dataset and inspection helpers used by `qrtool`.
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::models::{BitMatrix, GrayImage, ResultSet};
use crate::utils::codec::decode_image_path;
use crate::utils::resize::resize_bilinear;

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "bmp"];

/// Longest side images are shrunk to before detection, from `QR_MAX_DIM`.
///
/// Unset, unparseable or `0` means no limit.
pub fn max_dim_from_env() -> Option<usize> {
    env::var("QR_MAX_DIM")
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&v| v > 0)
}

/// Dataset root from `QR_DATASET_ROOT`, defaulting to `benches/images`
pub fn dataset_root_from_env() -> PathBuf {
    env::var("QR_DATASET_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("benches/images"))
}

/// Image limit from `QR_BENCH_LIMIT`; unset or `0` means the whole dataset
pub fn bench_limit_from_env() -> Option<usize> {
    env::var("QR_BENCH_LIMIT")
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&v| v > 0)
}

/// Load an image as grayscale, shrinking it so its longest side is at most `max_dim`
pub fn load_gray<P: AsRef<Path>>(path: P, max_dim: Option<usize>) -> Result<GrayImage> {
    let img = decode_image_path(path)?;
    Ok(shrink_to(img, max_dim))
}

fn shrink_to(img: GrayImage, max_dim: Option<usize>) -> GrayImage {
    let Some(max_dim) = max_dim else {
        return img;
    };
    let longest = img.width().max(img.height());
    if longest <= max_dim {
        return img;
    }
    let ratio = max_dim as f64 / longest as f64;
    let w = ((img.width() as f64 * ratio) as usize).max(1);
    let h = ((img.height() as f64 * ratio) as usize).max(1);
    resize_bilinear(&img, w, h)
}

/// Render a bit matrix as an 8-bit image (dark modules black)
pub fn binary_preview(binary: &BitMatrix) -> image::GrayImage {
    let data = binary.to_luma();
    image::GrayImage::from_fn(binary.width() as u32, binary.height() as u32, |x, y| {
        image::Luma([data[y as usize * binary.width() + x as usize]])
    })
}

/// Fraction of set (dark) cells in a bit matrix
pub fn dark_ratio(binary: &BitMatrix) -> f64 {
    let total = binary.width() * binary.height();
    if total == 0 {
        0.0
    } else {
        binary.count_set() as f64 / total as f64
    }
}

/// Count the symbols listed in a label file next to a dataset image.
///
/// Two layouts are understood: a `SETS` header followed by one line of 8
/// coordinates per symbol, or bare corner lines of 2 coordinates, 4 per
/// symbol. Unreadable files count as zero.
pub fn expected_symbol_count<P: AsRef<Path>>(label: P) -> usize {
    let Ok(content) = fs::read_to_string(label) else {
        return 0;
    };

    let numeric_tokens = |line: &str| -> Option<usize> {
        let mut count = 0usize;
        for token in line.split_whitespace() {
            token.parse::<f64>().ok()?;
            count += 1;
        }
        (count > 0).then_some(count)
    };

    let mut saw_sets = false;
    let mut quad_lines = 0usize;
    let mut corner_lines = 0usize;
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.eq_ignore_ascii_case("SETS") {
            saw_sets = true;
            quad_lines = 0;
            continue;
        }
        match numeric_tokens(line) {
            Some(n) if n >= 8 => quad_lines += 1,
            Some(2) if !saw_sets => corner_lines += 1,
            _ => {}
        }
    }

    if saw_sets || quad_lines > 0 {
        quad_lines
    } else {
        corner_lines / 4
    }
}

/// Image files under `root` (recursively), sorted, at most `limit`
pub fn dataset_images<P: AsRef<Path>>(root: P, limit: Option<usize>) -> Vec<PathBuf> {
    let mut stack = vec![root.as_ref().to_path_buf()];
    let mut images = Vec::new();

    while let Some(dir) = stack.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path
                .extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
            {
                images.push(path);
            }
        }
    }

    images.sort();
    if let Some(limit) = limit {
        images.truncate(limit);
    }
    images
}

/// Running totals of a dataset run
#[derive(Debug, Clone, Default)]
pub struct BenchSummary {
    /// Images searched
    pub images: usize,
    /// Images with at least one decoded symbol
    pub hits: usize,
    /// Images with a label file
    pub labeled: usize,
    /// Labeled images where at least one symbol was decoded
    pub labeled_hits: usize,
    /// Symbols decoded over all images
    pub symbols: usize,
    /// Time spent in detection
    pub elapsed: Duration,
}

impl BenchSummary {
    /// Add one image's outcome; `expected` is the labeled symbol count, if any
    pub fn record(&mut self, results: &ResultSet, expected: Option<usize>, elapsed: Duration) {
        self.images += 1;
        self.symbols += results.len();
        self.elapsed += elapsed;
        let hit = !results.is_empty();
        if hit {
            self.hits += 1;
        }
        if expected.is_some_and(|n| n > 0) {
            self.labeled += 1;
            if hit {
                self.labeled_hits += 1;
            }
        }
    }

    /// Share of labeled images with a decode, in percent
    pub fn reading_rate(&self) -> Option<f64> {
        (self.labeled > 0).then(|| self.labeled_hits as f64 * 100.0 / self.labeled as f64)
    }

    /// Mean detection time per image
    pub fn mean_time(&self) -> Duration {
        if self.images == 0 {
            Duration::ZERO
        } else {
            self.elapsed / self.images as u32
        }
    }
}
