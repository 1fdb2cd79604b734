#![allow(dead_code)]

use deepqr::GrayImage;
use qrcode::{Color, QrCode};

/// Pixels per module used by the synthetic scenes
pub const MODULE_PX: usize = 4;

/// Paint `payload` as a crisp symbol with its top-left module at (x, y).
/// Returns the symbol's edge length in pixels.
pub fn paint_symbol(img: &mut GrayImage, payload: impl AsRef<[u8]>, x: usize, y: usize) -> usize {
    let code = QrCode::new(payload.as_ref()).expect("encodable payload");
    let modules = code.width();
    let colors = code.to_colors();
    for my in 0..modules {
        for mx in 0..modules {
            if colors[my * modules + mx] != Color::Dark {
                continue;
            }
            for dy in 0..MODULE_PX {
                for dx in 0..MODULE_PX {
                    img.set(x + mx * MODULE_PX + dx, y + my * MODULE_PX + dy, 0);
                }
            }
        }
    }
    modules * MODULE_PX
}

/// White `width` x `height` image with one symbol at (x, y); returns the image
/// and the symbol edge length
pub fn scene(
    width: usize,
    height: usize,
    payload: impl AsRef<[u8]>,
    x: usize,
    y: usize,
) -> (GrayImage, usize) {
    let mut img = GrayImage::filled(width, height, 255);
    let size = paint_symbol(&mut img, payload, x, y);
    (img, size)
}

/// Encode a grayscale image as PNG bytes
pub fn encode_png(img: &GrayImage) -> Vec<u8> {
    let mut out = std::io::Cursor::new(Vec::new());
    img.to_buffer()
        .write_to(&mut out, image::ImageOutputFormat::Png)
        .expect("png encode");
    out.into_inner()
}

/// Interleave a grayscale image into BGRA pixels with `pad` extra bytes per row
pub fn to_bgra(img: &GrayImage, pad: usize) -> (Vec<u8>, usize) {
    let stride = img.width() * 4 + pad;
    let mut out = vec![0u8; stride * img.height()];
    for y in 0..img.height() {
        for x in 0..img.width() {
            let v = img.get(x, y);
            let i = y * stride + x * 4;
            out[i..i + 4].copy_from_slice(&[v, v, v, 255]);
        }
    }
    (out, stride)
}

/// Assert `actual` is within `tol` pixels of `expected` on both axes
pub fn assert_near(actual: deepqr::Point, expected: (f32, f32), tol: f32) {
    assert!(
        (actual.x - expected.0).abs() <= tol && (actual.y - expected.1).abs() <= tol,
        "corner {actual:?} not within {tol}px of {expected:?}"
    );
}
