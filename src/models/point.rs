/// 2D point with floating point coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point
    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Translate point by (dx, dy)
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Divide both coordinates by `factor`
    pub fn unscale(&self, factor: f32) -> Self {
        Self {
            x: self.x / factor,
            y: self.y / factor,
        }
    }

    /// Swap the x and y coordinates
    pub fn transposed(&self) -> Self {
        Self {
            x: self.y,
            y: self.x,
        }
    }
}

/// Four corner points in top-left, top-right, bottom-right, bottom-left order.
///
/// A quad carries no record of which coordinate frame it lives in; callers move
/// it between frames explicitly (see [`crate::detector::align::Aligner::warp_back`]).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Quad {
    /// Corner points
    pub points: [Point; 4],
}

impl Quad {
    /// Create a quad from its four corners
    pub fn new(points: [Point; 4]) -> Self {
        Self { points }
    }

    /// Axis-aligned rectangle spanned by two opposite corners
    pub fn from_corners(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            points: [
                Point::new(x0, y0),
                Point::new(x1, y0),
                Point::new(x1, y1),
                Point::new(x0, y1),
            ],
        }
    }

    /// Full extent of a `width` x `height` image as a rectangle
    pub fn full_image(width: usize, height: usize) -> Self {
        let x1 = width.saturating_sub(1) as f32;
        let y1 = height.saturating_sub(1) as f32;
        Self::from_corners(0.0, 0.0, x1, y1)
    }

    /// Top-left corner
    pub fn top_left(&self) -> Point {
        self.points[0]
    }

    /// Bottom-right corner (the diagonal opposite of the top-left)
    pub fn bottom_right(&self) -> Point {
        self.points[2]
    }

    /// Apply `f` to every corner
    pub fn map(&self, f: impl Fn(&Point) -> Point) -> Self {
        Self {
            points: [
                f(&self.points[0]),
                f(&self.points[1]),
                f(&self.points[2]),
                f(&self.points[3]),
            ],
        }
    }

    /// Flatten into `[x0, y0, x1, y1, x2, y2, x3, y3]`
    pub fn to_flat(&self) -> [f32; 8] {
        let mut flat = [0.0f32; 8];
        for (i, p) in self.points.iter().enumerate() {
            flat[i * 2] = p.x;
            flat[i * 2 + 1] = p.y;
        }
        flat
    }
}
