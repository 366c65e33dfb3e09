//! Keypoint extraction from per-joint heatmaps.
//!
//! A candidate is a pixel whose value exceeds the confidence threshold and is
//! strictly greater than its four direct neighbours (pixels outside the grid
//! count as zero). Candidates closer than the suppression radius to a stronger
//! candidate of the same joint type are dropped.

use crate::config::ExtractionConfig;
use ndarray::{ArrayView2, ArrayView3, Axis};
use std::cmp::Ordering;

/// A candidate joint detection in field coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Frame-unique id, increasing across joint types
    pub id: usize,
    /// Joint type (heatmap channel)
    pub joint: usize,
    /// Column in the heatmap grid
    pub x: usize,
    /// Row in the heatmap grid
    pub y: usize,
    /// Heatmap value at the peak
    pub score: f32,
}

impl Candidate {
    #[allow(clippy::cast_precision_loss)] // Grid sizes are far below f32 precision limits
    fn distance_to(&self, other: &Self) -> f32 {
        let dx = self.x as f32 - other.x as f32;
        let dy = self.y as f32 - other.y as f32;
        dx.hypot(dy)
    }
}

/// Every candidate of one frame, grouped by joint type
///
/// Ids are dense: candidate `id` is the `id`-th candidate in joint order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSet {
    by_joint: Vec<Vec<Candidate>>,
    all: Vec<Candidate>,
}

impl CandidateSet {
    /// Candidates for a joint type, ordered by position
    #[must_use]
    pub fn for_joint(&self, joint: usize) -> &[Candidate] {
        self.by_joint.get(joint).map_or(&[], Vec::as_slice)
    }

    /// Candidate with the given id
    #[must_use]
    pub fn get(&self, id: usize) -> Option<&Candidate> {
        self.all.get(id)
    }

    /// All candidates in id order
    #[must_use]
    pub fn all(&self) -> &[Candidate] {
        &self.all
    }

    /// Number of joint types scanned
    #[must_use]
    pub fn num_joints(&self) -> usize {
        self.by_joint.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.all.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

/// Heatmap peak finder with non-maximum suppression
#[derive(Debug, Clone)]
pub struct KeypointExtractor {
    confidence_threshold: f32,
    suppression_radius: f32,
}

impl KeypointExtractor {
    #[must_use]
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            confidence_threshold: config.confidence_threshold,
            suppression_radius: config.suppression_radius,
        }
    }

    /// Extract candidates from a single joint heatmap
    ///
    /// Ids are assigned from `first_id` upwards in position order (by column,
    /// then row).
    #[must_use]
    pub fn extract(&self, heatmap: ArrayView2<f32>, joint: usize, first_id: usize) -> Vec<Candidate> {
        let (height, width) = heatmap.dim();
        let value_at = |x: isize, y: isize| -> f32 {
            if x < 0 || y < 0 {
                return 0.0;
            }
            heatmap.get([y as usize, x as usize]).copied().unwrap_or(0.0)
        };

        let mut peaks = Vec::new();
        for ((y, x), &value) in heatmap.indexed_iter() {
            if value <= self.confidence_threshold || value.is_nan() {
                continue;
            }
            let (xi, yi) = (x as isize, y as isize);
            if value > value_at(xi - 1, yi)
                && value > value_at(xi + 1, yi)
                && value > value_at(xi, yi - 1)
                && value > value_at(xi, yi + 1)
            {
                peaks.push(Candidate {
                    id: 0,
                    joint,
                    x,
                    y,
                    score: value,
                });
            }
        }
        debug_assert!(peaks.iter().all(|p| p.x < width && p.y < height));

        // Strongest first; equal scores resolve by position
        peaks.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| position_order(a, b))
        });

        let mut kept: Vec<Candidate> = Vec::with_capacity(peaks.len());
        for peak in peaks {
            if kept
                .iter()
                .all(|strong| strong.distance_to(&peak) >= self.suppression_radius)
            {
                kept.push(peak);
            }
        }

        kept.sort_by(position_order);
        for (offset, candidate) in kept.iter_mut().enumerate() {
            candidate.id = first_id + offset;
        }
        kept
    }

    /// Extract candidates for the first `num_joints` heatmap channels
    #[must_use]
    pub fn extract_all(&self, heatmaps: ArrayView3<f32>, num_joints: usize) -> CandidateSet {
        let mut set = CandidateSet::default();
        for (joint, heatmap) in heatmaps.axis_iter(Axis(0)).take(num_joints).enumerate() {
            let candidates = self.extract(heatmap, joint, set.all.len());
            set.all.extend_from_slice(&candidates);
            set.by_joint.push(candidates);
        }

        log::debug!(
            "Extracted {} keypoint candidates over {} joint types",
            set.len(),
            set.num_joints()
        );
        set
    }
}

fn position_order(a: &Candidate, b: &Candidate) -> Ordering {
    a.x.cmp(&b.x).then(a.y.cmp(&b.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};
    use proptest::prelude::*;

    fn extractor(threshold: f32, radius: f32) -> KeypointExtractor {
        KeypointExtractor::new(&ExtractionConfig {
            confidence_threshold: threshold,
            suppression_radius: radius,
        })
    }

    #[test]
    fn test_single_peak() {
        let mut heatmap = Array2::<f32>::zeros((120, 160));
        heatmap[[50, 100]] = 0.9;
        let candidates = extractor(0.1, 6.0).extract(heatmap.view(), 0, 0);
        assert_eq!(candidates.len(), 1);
        assert_eq!((candidates[0].x, candidates[0].y), (100, 50));
        assert_eq!(candidates[0].score, 0.9);
    }

    #[test]
    fn test_below_threshold_ignored() {
        let mut heatmap = Array2::<f32>::zeros((20, 20));
        heatmap[[5, 5]] = 0.1;
        heatmap[[15, 15]] = 0.05;
        assert!(extractor(0.1, 6.0).extract(heatmap.view(), 0, 0).is_empty());
    }

    #[test]
    fn test_plateau_is_not_a_peak() {
        let mut heatmap = Array2::<f32>::zeros((20, 20));
        heatmap[[5, 5]] = 0.5;
        heatmap[[5, 6]] = 0.5;
        assert!(extractor(0.1, 6.0).extract(heatmap.view(), 0, 0).is_empty());
    }

    #[test]
    fn test_peak_on_border() {
        let mut heatmap = Array2::<f32>::zeros((20, 20));
        heatmap[[0, 0]] = 0.4;
        heatmap[[19, 19]] = 0.6;
        let candidates = extractor(0.1, 6.0).extract(heatmap.view(), 2, 0);
        assert_eq!(candidates.len(), 2);
        assert_eq!((candidates[0].x, candidates[0].y), (0, 0));
        assert_eq!(candidates[1].joint, 2);
    }

    #[test]
    fn test_weaker_neighbour_suppressed() {
        let mut heatmap = Array2::<f32>::zeros((40, 40));
        heatmap[[10, 10]] = 0.5;
        heatmap[[10, 14]] = 0.8;
        heatmap[[30, 30]] = 0.3;
        let candidates = extractor(0.1, 6.0).extract(heatmap.view(), 0, 0);
        let positions: Vec<_> = candidates.iter().map(|c| (c.x, c.y)).collect();
        assert_eq!(positions, vec![(14, 10), (30, 30)]);
    }

    #[test]
    fn test_ids_increase_across_joints() {
        let mut heatmaps = Array3::<f32>::zeros((3, 30, 30));
        heatmaps[[0, 5, 5]] = 0.9;
        heatmaps[[0, 5, 20]] = 0.8;
        heatmaps[[2, 10, 10]] = 0.7;
        let set = extractor(0.1, 6.0).extract_all(heatmaps.view(), 3);

        assert_eq!(set.len(), 3);
        assert_eq!(set.num_joints(), 3);
        assert!(set.for_joint(1).is_empty());
        let ids: Vec<_> = set.all().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(set.get(2).unwrap().joint, 2);
        assert!(set.for_joint(7).is_empty());
    }

    #[test]
    fn test_background_channel_skipped() {
        let mut heatmaps = Array3::<f32>::zeros((2, 10, 10));
        heatmaps[[1, 5, 5]] = 0.9;
        let set = extractor(0.1, 6.0).extract_all(heatmaps.view(), 1);
        assert!(set.is_empty());
    }

    proptest! {
        #[test]
        fn prop_candidates_respect_threshold_and_radius(
            values in proptest::collection::vec(0.0f32..1.0, 24 * 24),
            threshold in 0.05f32..0.6,
            radius in 0.0f32..8.0,
        ) {
            let heatmap = Array2::from_shape_vec((24, 24), values).unwrap();
            let candidates = extractor(threshold, radius).extract(heatmap.view(), 0, 0);
            for (i, a) in candidates.iter().enumerate() {
                prop_assert!(a.score > threshold);
                for b in &candidates[i + 1..] {
                    prop_assert!(a.distance_to(b) >= radius);
                }
            }
        }
    }
}
