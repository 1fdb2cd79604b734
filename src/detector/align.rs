//! Candidate cropping and the inverse mapping back to the source frame.
use crate::models::{GrayImage, Point, Quad};

/// Padding added around a candidate before it is cropped
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropPolicy {
    /// Horizontal padding as a fraction of the candidate width
    pub width_frac: f32,
    /// Vertical padding as a fraction of the candidate height
    pub height_frac: f32,
    /// Lower bound for both paddings, in pixels
    pub min_padding: f32,
}

impl Default for CropPolicy {
    fn default() -> Self {
        Self {
            width_frac: 0.1,
            height_frac: 0.1,
            min_padding: 15.0,
        }
    }
}

/// Crops one candidate and remembers how to undo it.
///
/// One instance per candidate. The crop origin is written by [`Aligner::crop`]
/// and read by [`Aligner::warp_back`].
#[derive(Debug, Clone, Default)]
pub struct Aligner {
    crop_x: usize,
    crop_y: usize,
    rotate90: bool,
}

impl Aligner {
    /// Aligner without rotation
    pub fn new() -> Self {
        Self::default()
    }

    /// Transpose crops so rotated symbols read upright
    pub fn set_rotate90(&mut self, rotate90: bool) {
        self.rotate90 = rotate90;
    }

    /// Whether crops are transposed
    pub fn is_rotated(&self) -> bool {
        self.rotate90
    }

    /// Origin of the last crop in the source frame
    pub fn offset(&self) -> (usize, usize) {
        (self.crop_x, self.crop_y)
    }

    /// Crop `img` around the diagonal spanned by corners 0 and 2 of `quad`.
    ///
    /// The output always lies inside `img` and has even width and height
    /// (possibly zero for degenerate candidates).
    pub fn crop(&mut self, img: &GrayImage, quad: &Quad, policy: &CropPolicy) -> GrayImage {
        let (img_w, img_h) = (img.width() as i64, img.height() as i64);
        if img_w == 0 || img_h == 0 {
            self.crop_x = 0;
            self.crop_y = 0;
            return GrayImage::new(0, 0);
        }

        let x0 = quad.points[0].x as i64;
        let y0 = quad.points[0].y as i64;
        let x2 = quad.points[2].x as i64;
        let y2 = quad.points[2].y as i64;

        let width = x2 - x0 + 1;
        let height = y2 - y0 + 1;
        let pad_x = (policy.width_frac * width as f32).max(policy.min_padding) as i64;
        let pad_y = (policy.height_frac * height as f32).max(policy.min_padding) as i64;

        let origin_x = (x0 - pad_x).clamp(0, img_w - 1);
        let origin_y = (y0 - pad_y).clamp(0, img_h - 1);
        let end_x = (x2 + pad_x).min(img_w - 1);
        let end_y = (y2 + pad_y).min(img_h - 1);

        let crop_w = ((end_x - origin_x + 1).max(0) & !1) as usize;
        let crop_h = ((end_y - origin_y + 1).max(0) & !1) as usize;

        self.crop_x = origin_x as usize;
        self.crop_y = origin_y as usize;

        let region = img.crop(self.crop_x, self.crop_y, crop_w, crop_h);
        if self.rotate90 {
            region.transpose()
        } else {
            region
        }
    }

    /// Map a point from the cropped (post-transpose) frame to the source frame
    pub fn warp_back_point(&self, p: &Point) -> Point {
        let p = if self.rotate90 { p.transposed() } else { *p };
        p.translate(self.crop_x as f32, self.crop_y as f32)
    }

    /// Map all corners of `quad` back to the source frame
    pub fn warp_back(&self, quad: &Quad) -> Quad {
        quad.map(|p| self.warp_back_point(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn gradient(width: usize, height: usize) -> GrayImage {
        let mut img = GrayImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                img.set(x, y, ((x * 7 + y * 13) % 256) as u8);
            }
        }
        img
    }

    #[test]
    fn test_crop_with_padding() {
        let img = gradient(400, 300);
        let quad = Quad::from_corners(100.0, 100.0, 299.0, 199.0);
        let mut aligner = Aligner::new();
        let region = aligner.crop(&img, &quad, &CropPolicy::default());

        // 200x100 candidate: padding 20 horizontally, 15 (min) vertically
        assert_eq!(aligner.offset(), (80, 85));
        assert_eq!((region.width(), region.height()), (240, 130));
        assert_eq!(region.get(0, 0), img.get(80, 85));
        assert_eq!(region.get(10, 20), img.get(90, 105));
    }

    #[test]
    fn test_crop_is_even_and_inside_image() {
        let policy = CropPolicy::default();
        let sizes = [(21usize, 21usize), (64, 33), (333, 101), (1, 1), (400, 400)];
        let quads = [
            Quad::from_corners(0.0, 0.0, 10.0, 10.0),
            Quad::from_corners(-50.0, -20.0, 5000.0, 7000.0),
            Quad::from_corners(17.3, 3.9, 18.1, 4.2),
            Quad::from_corners(900.0, 900.0, 950.0, 990.0),
            Quad::from_corners(30.0, 30.0, 5.0, 5.0),
            Quad::full_image(333, 101),
        ];
        for &(w, h) in &sizes {
            let img = gradient(w, h);
            for quad in &quads {
                let mut aligner = Aligner::new();
                let region = aligner.crop(&img, quad, &policy);
                let (ox, oy) = aligner.offset();
                assert_eq!(region.width() % 2, 0);
                assert_eq!(region.height() % 2, 0);
                assert!(ox + region.width() <= w, "{w}x{h} {quad:?}");
                assert!(oy + region.height() <= h, "{w}x{h} {quad:?}");
            }
        }
    }

    #[test]
    fn test_warp_back_recovers_corners() {
        let img = gradient(500, 500);
        let quad = Quad::from_corners(120.0, 140.0, 260.0, 300.0);
        let mut aligner = Aligner::new();
        aligner.crop(&img, &quad, &CropPolicy::default());
        let (ox, oy) = aligner.offset();

        let local = quad.map(|p| p.translate(-(ox as f32), -(oy as f32)));
        let restored = aligner.warp_back(&local);
        for (a, b) in restored.points.iter().zip(quad.points.iter()) {
            assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-4);
            assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_rotated_crop_and_warp_back() {
        let img = gradient(200, 200);
        let quad = Quad::from_corners(50.0, 60.0, 109.0, 89.0);
        let mut aligner = Aligner::new();
        aligner.set_rotate90(true);
        let region = aligner.crop(&img, &quad, &CropPolicy::default());
        let (ox, oy) = aligner.offset();
        assert_eq!((ox, oy), (35, 45));

        // Transposed: region(x, y) == source(ox + y, oy + x)
        assert_eq!(region.get(3, 7), img.get(ox + 7, oy + 3));
        let back = aligner.warp_back_point(&Point::new(3.0, 7.0));
        assert_eq!(back, Point::new((ox + 7) as f32, (oy + 3) as f32));
    }
}
