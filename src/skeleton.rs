//! Resolved skeletons in frame pixel space.

use crate::grouping::JointGroup;
use crate::inference::FieldTransform;
use crate::keypoints::CandidateSet;
use crate::utils::safe_cast::f32_to_i32;
use crate::{Error, Result};
use serde::Serialize;

/// Joint position in frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct JointLocation {
    pub x: i32,
    pub y: i32,
}

impl JointLocation {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// One person: a location or nothing per joint type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Skeleton {
    joints: Vec<Option<JointLocation>>,
    score: f32,
}

impl Skeleton {
    #[must_use]
    pub fn new(joints: Vec<Option<JointLocation>>, score: f32) -> Self {
        Self { joints, score }
    }

    /// Resolve a joint group into frame pixels
    ///
    /// Field coordinates are mapped through `transform` and truncated toward
    /// zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the group references an unknown candidate or a
    /// mapped coordinate is not representable
    pub fn from_group(group: &JointGroup, candidates: &CandidateSet, transform: &FieldTransform) -> Result<Self> {
        let joints = group
            .joints
            .iter()
            .map(|slot| slot.map(|id| locate(id, candidates, transform)).transpose())
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(joints, group.score))
    }

    /// Location of a joint type, if it was resolved
    #[must_use]
    pub fn joint(&self, joint: usize) -> Option<JointLocation> {
        self.joints.get(joint).copied().flatten()
    }

    /// Resolved joints with their joint type
    pub fn present_joints(&self) -> impl Iterator<Item = (usize, JointLocation)> + '_ {
        self.joints
            .iter()
            .enumerate()
            .filter_map(|(joint, slot)| slot.map(|location| (joint, location)))
    }

    /// Number of resolved joints
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.iter().filter(|slot| slot.is_some()).count()
    }

    /// Number of joint slots
    #[must_use]
    pub fn num_slots(&self) -> usize {
        self.joints.len()
    }

    /// Aggregate assembly score
    #[must_use]
    pub fn score(&self) -> f32 {
        self.score
    }
}

#[allow(clippy::cast_precision_loss)] // Grid sizes are far below f32 precision limits
fn locate(id: usize, candidates: &CandidateSet, transform: &FieldTransform) -> Result<JointLocation> {
    let candidate = candidates
        .get(id)
        .ok_or_else(|| Error::InvalidInput(format!("Unknown candidate id {id}")))?;
    let (x, y) = transform.to_frame(candidate.x as f32, candidate.y as f32);
    Ok(JointLocation::new(f32_to_i32(x)?, f32_to_i32(y)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;
    use crate::inference::Padding;
    use crate::keypoints::KeypointExtractor;
    use ndarray::Array3;

    #[test]
    fn test_present_joints_skip_absent() {
        let skeleton = Skeleton::new(
            vec![Some(JointLocation::new(1, 2)), None, Some(JointLocation::new(5, 6))],
            1.5,
        );
        let present: Vec<_> = skeleton.present_joints().collect();
        assert_eq!(present, vec![(0, JointLocation::new(1, 2)), (2, JointLocation::new(5, 6))]);
        assert_eq!(skeleton.joint_count(), 2);
        assert_eq!(skeleton.num_slots(), 3);
        assert_eq!(skeleton.joint(1), None);
        assert_eq!(skeleton.joint(9), None);
    }

    #[test]
    fn test_from_group_rescales() {
        let mut heatmaps = Array3::<f32>::zeros((2, 64, 88));
        heatmaps[[0, 32, 41]] = 0.9;
        let candidates = KeypointExtractor::new(&ExtractionConfig::default()).extract_all(heatmaps.view(), 2);
        let group = JointGroup {
            joints: vec![Some(0), None],
            score: 0.9,
        };
        let transform = FieldTransform {
            scale: 0.5,
            pad: Padding {
                top: 0,
                left: 2,
                bottom: 0,
                right: 2,
            },
            stride: 8,
            upsample_ratio: 4,
        };

        let skeleton = Skeleton::from_group(&group, &candidates, &transform).unwrap();
        // x: (41 * 2 - 2) / 0.5 = 160, y: (32 * 2 - 0) / 0.5 = 128
        assert_eq!(skeleton.joint(0), Some(JointLocation::new(160, 128)));
        assert_eq!(skeleton.joint(1), None);
        assert_eq!(skeleton.score(), 0.9);
    }

    #[test]
    fn test_from_group_rejects_unknown_id() {
        let group = JointGroup {
            joints: vec![Some(4)],
            score: 1.0,
        };
        let result = Skeleton::from_group(&group, &CandidateSet::default(), &FieldTransform::identity());
        assert!(result.is_err());
    }
}
