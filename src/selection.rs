//! Selection of the skeleton nearest the horizontal center of the frame.

use crate::config::SelectionConfig;
use crate::skeleton::Skeleton;

/// Picks the most centered skeleton by its reference joint
#[derive(Debug, Clone)]
pub struct PoseSelector {
    reference_joint: usize,
    max_center_distance: Option<f32>,
}

impl PoseSelector {
    #[must_use]
    pub fn new(config: &SelectionConfig) -> Self {
        Self {
            reference_joint: config.reference_joint,
            max_center_distance: config.max_center_distance,
        }
    }

    /// Index of the skeleton whose reference joint is closest to `width / 2`
    ///
    /// Skeletons without the reference joint, or at or beyond the maximum
    /// center distance when one is set, are not eligible. Equal distances keep the
    /// earliest skeleton. Returns `None` when nothing is eligible.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Pixel coordinates are small
    pub fn select_index(&self, skeletons: &[Skeleton], width: u32) -> Option<usize> {
        let center = width as f32 / 2.0;
        let mut best: Option<(usize, f32)> = None;

        for (idx, skeleton) in skeletons.iter().enumerate() {
            let Some(reference) = skeleton.joint(self.reference_joint) else {
                continue;
            };
            let distance = (reference.x as f32 - center).abs();
            if self.max_center_distance.is_some_and(|max| distance >= max) {
                continue;
            }
            if best.map_or(true, |(_, best_distance)| distance < best_distance) {
                best = Some((idx, distance));
            }
        }

        best.map(|(idx, _)| idx)
    }

    /// The most centered skeleton, see [`PoseSelector::select_index`]
    #[must_use]
    pub fn select<'a>(&self, skeletons: &'a [Skeleton], width: u32) -> Option<&'a Skeleton> {
        self.select_index(skeletons, width).map(|idx| &skeletons[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::JointLocation;

    fn skeleton_at(x: Option<i32>) -> Skeleton {
        Skeleton::new(vec![x.map(|x| JointLocation::new(x, 100)), Some(JointLocation::new(0, 0))], 1.0)
    }

    fn selector() -> PoseSelector {
        PoseSelector::new(&SelectionConfig::default())
    }

    #[test]
    fn test_selects_closest_to_center() {
        let skeletons = vec![skeleton_at(Some(50)), skeleton_at(Some(400))];
        // |50 - 320| = 270, |400 - 320| = 80
        assert_eq!(selector().select_index(&skeletons, 640), Some(1));
    }

    #[test]
    fn test_single_skeleton() {
        let with_reference = vec![skeleton_at(Some(5))];
        assert_eq!(selector().select(&with_reference, 640), Some(&with_reference[0]));

        let without_reference = vec![skeleton_at(None)];
        assert_eq!(selector().select(&without_reference, 640), None);
    }

    #[test]
    fn test_missing_reference_is_ineligible() {
        let skeletons = vec![skeleton_at(None), skeleton_at(Some(600))];
        assert_eq!(selector().select_index(&skeletons, 640), Some(1));
    }

    #[test]
    fn test_ties_keep_first() {
        let skeletons = vec![skeleton_at(Some(300)), skeleton_at(Some(340))];
        assert_eq!(selector().select_index(&skeletons, 640), Some(0));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(selector().select_index(&[], 640), None);
    }

    #[test]
    fn test_max_center_distance() {
        let selector = PoseSelector::new(&SelectionConfig {
            reference_joint: 0,
            max_center_distance: Some(310.0),
        });
        let skeletons = vec![skeleton_at(Some(5))];
        // 315 px from center
        assert_eq!(selector.select_index(&skeletons, 640), None);

        let skeletons = vec![skeleton_at(Some(5)), skeleton_at(Some(20))];
        assert_eq!(selector.select_index(&skeletons, 640), Some(1));
    }

    #[test]
    fn test_max_center_distance_is_exclusive() {
        let selector = PoseSelector::new(&SelectionConfig {
            reference_joint: 0,
            max_center_distance: Some(310.0),
        });
        // Exactly 310 px from center is out, 309 px is in
        assert_eq!(selector.select_index(&[skeleton_at(Some(10))], 640), None);
        assert_eq!(selector.select_index(&[skeleton_at(Some(11))], 640), Some(0));
        assert_eq!(selector.select_index(&[skeleton_at(Some(630))], 640), None);
    }

    #[test]
    fn test_other_reference_joint() {
        let selector = PoseSelector::new(&SelectionConfig {
            reference_joint: 1,
            max_center_distance: None,
        });
        let skeletons = vec![skeleton_at(Some(320))];
        // Joint 1 sits at x = 0 in every test skeleton
        assert_eq!(selector.select_index(&skeletons, 640), Some(0));
        assert_eq!(selector.select_index(&skeletons, 0), Some(0));
    }
}
