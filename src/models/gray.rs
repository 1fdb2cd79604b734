use crate::error::{QrError, Result};

/// Single-channel 8-bit image with an explicit row stride.
///
/// Every pipeline stage works on this type; color input is converted at the
/// boundary by [`crate::utils::grayscale::to_grayscale`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayImage {
    width: usize,
    height: usize,
    stride: usize,
    data: Vec<u8>,
}

impl GrayImage {
    /// Create a black image of the given size
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0)
    }

    /// Create an image where every pixel has value `value`
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            stride: width,
            data: vec![value; width * height],
        }
    }

    /// Wrap a tightly packed buffer (`stride == width`)
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        Self::from_raw_with_stride(width, height, width, data)
    }

    /// Wrap a buffer whose rows are `stride` bytes apart
    pub fn from_raw_with_stride(
        width: usize,
        height: usize,
        stride: usize,
        data: Vec<u8>,
    ) -> Result<Self> {
        if stride < width {
            return Err(QrError::InvalidArgument(format!(
                "stride {stride} is smaller than width {width}"
            )));
        }
        let needed = match height.checked_sub(1) {
            None => Some(0),
            Some(last) => stride.checked_mul(last).and_then(|n| n.checked_add(width)),
        };
        if needed.is_none_or(|needed| data.len() < needed) {
            return Err(QrError::InvalidArgument(format!(
                "buffer of {} bytes is too small for {width}x{height} with stride {stride}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            stride,
            data,
        })
    }

    /// Image width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Distance in bytes between the starts of consecutive rows
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// True when the image has no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Pixels of row `y` (exactly `width` bytes)
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    /// Pixel at (x, y)
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.stride + x]
    }

    /// Set pixel at (x, y); out-of-range writes are ignored
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        if x < self.width && y < self.height {
            self.data[y * self.stride + x] = value;
        }
    }

    /// Copy rows into a tightly packed `width * height` buffer
    pub fn to_contiguous(&self) -> Vec<u8> {
        if self.stride == self.width {
            return self.data[..self.width * self.height].to_vec();
        }
        let mut out = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            out.extend_from_slice(self.row(y));
        }
        out
    }

    /// Copy the rectangle at (x, y) of size `w` x `h`; the caller guarantees it
    /// lies inside the image
    pub fn crop(&self, x: usize, y: usize, w: usize, h: usize) -> Self {
        let mut data = Vec::with_capacity(w * h);
        for row in y..y + h {
            let start = row * self.stride + x;
            data.extend_from_slice(&self.data[start..start + w]);
        }
        Self {
            width: w,
            height: h,
            stride: w,
            data,
        }
    }

    /// Swap rows and columns
    pub fn transpose(&self) -> Self {
        let mut out = Self::new(self.height, self.width);
        for y in 0..self.height {
            let row = self.row(y);
            for (x, &v) in row.iter().enumerate() {
                out.data[x * out.stride + y] = v;
            }
        }
        out
    }

    /// Convert into an `image` crate buffer
    pub fn to_buffer(&self) -> image::GrayImage {
        // Dimensions always match the packed buffer length.
        image::GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            image::Luma([self.get(x as usize, y as usize)])
        })
    }

    /// Take ownership of an `image` crate buffer
    pub fn from_buffer(buffer: image::GrayImage) -> Self {
        let (width, height) = (buffer.width() as usize, buffer.height() as usize);
        Self {
            width,
            height,
            stride: width,
            data: buffer.into_raw(),
        }
    }
}
