//! Greedy overlap suppression for template-match hits.
//!
//! Template matching reports every position scoring above its threshold, so
//! one on-screen icon typically yields a cluster of near-identical boxes.
//! `DetectionSet` keeps the first box of each cluster: candidates must be
//! inserted best-first, and a candidate is dropped when its IoU with any
//! accepted box is strictly greater than the threshold. Candidates are never
//! re-sorted, so caller tie-breaks survive.

use serde::Serialize;

use framebot_core::error::{FramebotError, Result};
use framebot_core::types::{Detection, Rect};

/// IoU above which two hits are treated as the same object.
pub const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.7;

/// Ordered set of detections with pairwise overlap at most `threshold`.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionSet {
    threshold: f64,
    accepted: Vec<Detection>,
}

impl Default for DetectionSet {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_OVERLAP_THRESHOLD,
            accepted: Vec::new(),
        }
    }
}

impl DetectionSet {
    /// An empty set using `threshold`, which must lie within `[0, 1]`.
    pub fn new(threshold: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(FramebotError::Config(format!(
                "overlap threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        Ok(Self {
            threshold,
            accepted: Vec::new(),
        })
    }

    /// Build a set from candidates ordered best-first.
    pub fn from_candidates<I>(candidates: I, threshold: f64) -> Result<Self>
    where
        I: IntoIterator<Item = Detection>,
    {
        let mut set = Self::new(threshold)?;
        set.extend(candidates);
        Ok(set)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Largest IoU between `rect` and an accepted box; 0.0 when empty.
    pub fn max_overlap(&self, rect: &Rect) -> f64 {
        self.accepted
            .iter()
            .map(|d| d.rect.overlap(rect))
            .fold(0.0, f64::max)
    }

    /// Insert `candidate` unless it duplicates an accepted detection.
    /// Returns whether it was accepted.
    pub fn insert(&mut self, candidate: Detection) -> bool {
        if self
            .accepted
            .iter()
            .any(|d| d.rect.overlap(&candidate.rect) > self.threshold)
        {
            return false;
        }
        self.accepted.push(candidate);
        true
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
        self.accepted.iter()
    }

    /// Accepted boxes in insertion order.
    pub fn rects(&self) -> Vec<Rect> {
        self.accepted.iter().map(|d| d.rect).collect()
    }

    pub fn into_vec(self) -> Vec<Detection> {
        self.accepted
    }
}

impl Extend<Detection> for DetectionSet {
    fn extend<T: IntoIterator<Item = Detection>>(&mut self, iter: T) {
        for candidate in iter {
            self.insert(candidate);
        }
    }
}

impl<'a> IntoIterator for &'a DetectionSet {
    type Item = &'a Detection;
    type IntoIter = std::slice::Iter<'a, Detection>;

    fn into_iter(self) -> Self::IntoIter {
        self.accepted.iter()
    }
}

/// Deduplicate best-first candidates with `threshold`.
pub fn dedupe(candidates: Vec<Detection>, threshold: f64) -> Result<DetectionSet> {
    DetectionSet::from_candidates(candidates, threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x: i32, y: i32, w: i32, h: i32, confidence: f64) -> Detection {
        Detection::new(Rect::new(x, y, w, h).unwrap(), confidence)
    }

    #[test]
    fn test_keeps_first_and_distinct() {
        // The second box overlaps the first by 90/110 ~ 0.818.
        let candidates = vec![
            det(0, 0, 10, 10, 0.9),
            det(1, 0, 10, 10, 0.8),
            det(50, 50, 10, 10, 0.95),
        ];
        let set = dedupe(candidates, 0.7).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.rects(),
            vec![
                Rect::new(0, 0, 10, 10).unwrap(),
                Rect::new(50, 50, 10, 10).unwrap()
            ]
        );
    }

    #[test]
    fn test_just_below_threshold_is_kept() {
        // Diagonal shift gives 81/119 ~ 0.68, under 0.7.
        let set = dedupe(vec![det(0, 0, 10, 10, 0.9), det(1, 1, 10, 10, 0.8)], 0.7).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_equal_to_threshold_is_kept() {
        // Containment of a 5x5 box in a 10x10 box is exactly 0.25.
        let set = dedupe(vec![det(0, 0, 10, 10, 0.9), det(0, 0, 5, 5, 0.8)], 0.25).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_first_seen_wins_without_resorting() {
        // Lower confidence first: the caller's order is authoritative.
        let set = dedupe(vec![det(0, 0, 10, 10, 0.5), det(0, 0, 10, 10, 0.99)], 0.7).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().unwrap().confidence, 0.5);
    }

    #[test]
    fn test_no_accepted_pair_exceeds_threshold() {
        let mut candidates = Vec::new();
        for i in 0..40 {
            candidates.push(det(i * 3, (i % 4) * 2, 12, 12, 1.0 - i as f64 / 100.0));
        }
        let set = dedupe(candidates, 0.5).unwrap();
        let rects = set.rects();
        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                assert!(a.overlap(b) <= 0.5);
            }
        }
    }

    #[test]
    fn test_zero_area_candidates_never_collide() {
        let set = dedupe(vec![det(0, 0, 0, 0, 0.9), det(0, 0, 0, 0, 0.8)], 0.0).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_insert_reports_acceptance() {
        let mut set = DetectionSet::default();
        assert_eq!(set.threshold(), DEFAULT_OVERLAP_THRESHOLD);
        assert!(set.insert(det(0, 0, 10, 10, 0.9)));
        assert!(!set.insert(det(0, 0, 10, 10, 0.9)));
        assert!((set.max_overlap(&Rect::new(1, 0, 10, 10).unwrap()) - 90.0 / 110.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        assert!(DetectionSet::new(-0.1).is_err());
        assert!(DetectionSet::new(1.1).is_err());
        assert!(DetectionSet::new(f64::NAN).is_err());
        assert!(DetectionSet::new(0.0).is_ok());
        assert!(DetectionSet::new(1.0).is_ok());
    }

    #[test]
    fn test_empty_input() {
        let set = dedupe(Vec::new(), 0.7).unwrap();
        assert!(set.is_empty());
        assert!(set.into_vec().is_empty());
    }
}
