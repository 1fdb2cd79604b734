pub mod gray;
pub mod matrix;
pub mod point;
pub mod result;

pub use gray::GrayImage;
pub use matrix::BitMatrix;
pub use point::{Point, Quad};
pub use result::{DecodeRecord, ResultSet, payload_text};
