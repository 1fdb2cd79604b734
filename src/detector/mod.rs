//! Candidate localization
//!
//! - Region proposals from the detection network (or the whole image)
//! - Cropping with padding and the inverse coordinate mapping
//! - Duplicate suppression of decoded symbols

/// Candidate cropping and warp-back
pub mod align;
/// First-corner duplicate suppression
pub mod dedup;
/// Neural region proposer and input scale policy
pub mod region;

pub use align::{Aligner, CropPolicy};
pub use dedup::Deduplicator;
pub use region::RegionDetector;
