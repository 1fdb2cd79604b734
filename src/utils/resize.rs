//! Classical resampling of grayscale images.
use image::imageops::{self, FilterType};

use crate::models::GrayImage;

/// Bicubic (Catmull-Rom) resize to exactly `width` x `height`
pub fn resize_bicubic(src: &GrayImage, width: usize, height: usize) -> GrayImage {
    resize_with(src, width, height, FilterType::CatmullRom)
}

/// Bilinear resize to exactly `width` x `height`
pub fn resize_bilinear(src: &GrayImage, width: usize, height: usize) -> GrayImage {
    resize_with(src, width, height, FilterType::Triangle)
}

fn resize_with(src: &GrayImage, width: usize, height: usize, filter: FilterType) -> GrayImage {
    if width == src.width() && height == src.height() {
        return src.clone();
    }
    if width == 0 || height == 0 || src.is_empty() {
        return GrayImage::new(width, height);
    }
    let buffer = src.to_buffer();
    let resized = imageops::resize(&buffer, width as u32, height as u32, filter);
    GrayImage::from_buffer(resized)
}
