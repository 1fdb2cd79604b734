//! Duplicate suppression across candidates and scales.
use crate::models::Quad;

/// Corners closer than this on both axes are considered the same
pub const DUPLICATE_DISTANCE: f32 = 10.0;

/// Tracks the quads accepted so far for one image.
///
/// Two quads are duplicates when their first corners are within
/// [`DUPLICATE_DISTANCE`] on both axes; the remaining corners are not compared.
#[derive(Debug, Clone, Default)]
pub struct Deduplicator {
    accepted: Vec<Quad>,
}

impl Deduplicator {
    /// Empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `quad` duplicates an accepted quad
    pub fn is_duplicate(&self, quad: &Quad) -> bool {
        self.accepted.iter().any(|seen| same_symbol(seen, quad))
    }

    /// Record `quad` unless it is a duplicate; returns whether it was admitted
    pub fn admit(&mut self, quad: &Quad) -> bool {
        if self.is_duplicate(quad) {
            return false;
        }
        self.accepted.push(*quad);
        true
    }

    /// Number of admitted quads
    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    /// True when nothing has been admitted yet
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

fn same_symbol(a: &Quad, b: &Quad) -> bool {
    let (pa, pb) = (a.points[0], b.points[0]);
    (pa.x - pb.x).abs() < DUPLICATE_DISTANCE && (pa.y - pb.y).abs() < DUPLICATE_DISTANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_admit_always_accepted() {
        let mut dedup = Deduplicator::new();
        assert!(dedup.admit(&Quad::from_corners(5.0, 5.0, 50.0, 50.0)));
        assert_eq!(dedup.len(), 1);
    }

    #[test]
    fn test_near_first_corner_rejected() {
        let mut dedup = Deduplicator::new();
        dedup.admit(&Quad::from_corners(100.0, 100.0, 200.0, 200.0));
        assert!(!dedup.admit(&Quad::from_corners(109.0, 91.5, 205.0, 210.0)));
        assert_eq!(dedup.len(), 1);
    }

    #[test]
    fn test_only_first_corner_decides() {
        let mut dedup = Deduplicator::new();
        dedup.admit(&Quad::from_corners(100.0, 100.0, 200.0, 200.0));
        // Same first corner, very different extent: still a duplicate
        assert!(dedup.is_duplicate(&Quad::from_corners(102.0, 98.0, 900.0, 900.0)));
        // Same far corner, first corner 10 px away on x: distinct
        assert!(!dedup.is_duplicate(&Quad::from_corners(110.0, 100.0, 200.0, 200.0)));
    }

    #[test]
    fn test_separate_symbols_retained() {
        let mut dedup = Deduplicator::new();
        assert!(dedup.admit(&Quad::from_corners(20.0, 20.0, 120.0, 120.0)));
        assert!(dedup.admit(&Quad::from_corners(250.0, 20.0, 350.0, 120.0)));
        assert!(dedup.admit(&Quad::from_corners(20.0, 250.0, 120.0, 350.0)));
        assert_eq!(dedup.len(), 3);
    }
}
