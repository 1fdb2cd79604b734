//! Encoded raster input (PNG, JPEG, BMP, GIF, ...) to grayscale.
use std::path::Path;

use crate::error::{QrError, Result};
use crate::models::GrayImage;

/// Decode an in-memory encoded image into grayscale
pub fn decode_image_bytes(data: &[u8]) -> Result<GrayImage> {
    if data.is_empty() {
        return Err(QrError::InvalidArgument("image data is empty".into()));
    }
    let img = image::load_from_memory(data)?;
    Ok(GrayImage::from_buffer(img.to_luma8()))
}

/// Read and decode an image file into grayscale.
///
/// Unreadable files are reported as [`QrError::DecodeFailed`], the same as
/// files whose content is not a raster image.
pub fn decode_image_path<P: AsRef<Path>>(path: P) -> Result<GrayImage> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|err| QrError::DecodeFailed(format!("{}: {err}", path.display())))?;
    if bytes.is_empty() {
        return Err(QrError::DecodeFailed(format!("{}: empty file", path.display())));
    }
    decode_image_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_png(img: &image::GrayImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageOutputFormat::Png)
            .expect("png encode");
        out.into_inner()
    }

    #[test]
    fn test_decode_png_bytes() {
        let src = image::GrayImage::from_fn(5, 3, |x, y| image::Luma([(x * 10 + y) as u8]));
        let decoded = decode_image_bytes(&encode_png(&src)).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (5, 3));
        assert_eq!(decoded.get(4, 2), 42);
    }

    #[test]
    fn test_garbage_is_decode_failed() {
        let err = decode_image_bytes(b"definitely not a png").unwrap_err();
        assert!(matches!(err, QrError::DecodeFailed(_)));
    }

    #[test]
    fn test_empty_is_invalid_argument() {
        assert!(matches!(
            decode_image_bytes(&[]),
            Err(QrError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = decode_image_path("/nonexistent/deepqr/missing.png").unwrap_err();
        assert!(matches!(err, QrError::DecodeFailed(_)));
    }
}
