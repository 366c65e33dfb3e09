//! Joint and limb topology.
//!
//! A topology names every joint type (the index into the heatmap stack) and
//! lists the limbs used to link joints together. Limbs are processed in the
//! order they are listed, which for [`Topology::coco18`] runs from the trunk
//! out to the extremities.

use crate::constants::{NUM_BODY_JOINTS, NUM_HEATMAP_CHANNELS, NUM_PAF_CHANNELS};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// COCO-18 joint names, in heatmap channel order
pub const COCO18_JOINT_NAMES: [&str; NUM_BODY_JOINTS] = [
    "nose", "neck", "r_sho", "r_elb", "r_wri", "l_sho", "l_elb", "l_wri", "r_hip", "r_knee", "r_ank",
    "l_hip", "l_knee", "l_ank", "r_eye", "l_eye", "r_ear", "l_ear",
];

/// (from joint, to joint) per COCO-18 limb
const COCO18_LIMB_JOINTS: [(usize, usize); 19] = [
    (1, 2),
    (1, 5),
    (2, 3),
    (3, 4),
    (5, 6),
    (6, 7),
    (1, 8),
    (8, 9),
    (9, 10),
    (1, 11),
    (11, 12),
    (12, 13),
    (1, 0),
    (0, 14),
    (14, 16),
    (0, 15),
    (15, 17),
    (2, 16),
    (5, 17),
];

/// (x channel, y channel) of the affinity field per COCO-18 limb
const COCO18_LIMB_FIELDS: [(usize, usize); 19] = [
    (12, 13),
    (20, 21),
    (14, 15),
    (16, 17),
    (22, 23),
    (24, 25),
    (0, 1),
    (2, 3),
    (4, 5),
    (6, 7),
    (8, 9),
    (10, 11),
    (28, 29),
    (30, 31),
    (34, 35),
    (32, 33),
    (36, 37),
    (18, 19),
    (26, 27),
];

/// A directed limb between two joint types with its affinity field channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limb {
    /// Joint type at the start of the limb
    pub from: usize,
    /// Joint type at the end of the limb
    pub to: usize,
    /// Affinity field channel holding the x component
    pub field_x: usize,
    /// Affinity field channel holding the y component
    pub field_y: usize,
}

impl Limb {
    #[must_use]
    pub const fn new(from: usize, to: usize, field_x: usize, field_y: usize) -> Self {
        Self {
            from,
            to,
            field_x,
            field_y,
        }
    }
}

/// Joint names plus the ordered limb traversal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    /// Joint names indexed by joint type
    pub joint_names: Vec<String>,
    /// Limbs in processing order
    pub limbs: Vec<Limb>,
    /// Heatmap channels the network emits (joints plus any background channel)
    pub heatmap_channels: usize,
    /// Affinity field channels the network emits
    pub field_channels: usize,
}

impl Default for Topology {
    fn default() -> Self {
        Self::coco18()
    }
}

impl Topology {
    /// The 18-joint body model used by the lightweight OpenPose network
    #[must_use]
    pub fn coco18() -> Self {
        let limbs = COCO18_LIMB_JOINTS
            .iter()
            .zip(COCO18_LIMB_FIELDS.iter())
            .map(|(&(from, to), &(field_x, field_y))| Limb::new(from, to, field_x, field_y))
            .collect();

        Self {
            joint_names: COCO18_JOINT_NAMES.iter().map(|name| (*name).to_string()).collect(),
            limbs,
            heatmap_channels: NUM_HEATMAP_CHANNELS,
            field_channels: NUM_PAF_CHANNELS,
        }
    }

    /// Number of joint types
    #[must_use]
    pub fn num_joints(&self) -> usize {
        self.joint_names.len()
    }

    /// Name of a joint type, if it exists
    #[must_use]
    pub fn joint_name(&self, joint: usize) -> Option<&str> {
        self.joint_names.get(joint).map(String::as_str)
    }

    /// Look up a joint type by name
    #[must_use]
    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.joint_names.iter().position(|n| n == name)
    }

    /// Check that every limb references existing joints and channels
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a limb points outside the joint list or the
    /// field stack, or if there are more joints than heatmap channels.
    pub fn validate(&self) -> Result<()> {
        let joints = self.num_joints();
        if joints == 0 {
            return Err(Error::ConfigError("Topology must define at least one joint".to_string()));
        }
        if joints > self.heatmap_channels {
            return Err(Error::ConfigError(format!(
                "Topology defines {joints} joints but only {} heatmap channels",
                self.heatmap_channels
            )));
        }

        for (idx, limb) in self.limbs.iter().enumerate() {
            if limb.from >= joints || limb.to >= joints {
                return Err(Error::ConfigError(format!(
                    "Limb {idx} links joints {}->{} outside of {joints} joints",
                    limb.from, limb.to
                )));
            }
            if limb.from == limb.to {
                return Err(Error::ConfigError(format!("Limb {idx} links joint {} to itself", limb.from)));
            }
            if limb.field_x >= self.field_channels || limb.field_y >= self.field_channels {
                return Err(Error::ConfigError(format!(
                    "Limb {idx} uses field channels {}/{} outside of {} channels",
                    limb.field_x, limb.field_y, self.field_channels
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coco18_is_valid() {
        let topology = Topology::coco18();
        assert_eq!(topology.num_joints(), 18);
        assert_eq!(topology.limbs.len(), 19);
        assert!(topology.validate().is_ok());
    }

    #[test]
    fn test_coco18_starts_at_trunk() {
        let topology = Topology::coco18();
        assert_eq!(topology.limbs[0], Limb::new(1, 2, 12, 13));
        assert_eq!(topology.joint_name(1), Some("neck"));
    }

    #[test]
    fn test_field_channels_are_used_once() {
        let topology = Topology::coco18();
        let mut seen = vec![false; topology.field_channels];
        for limb in &topology.limbs {
            for channel in [limb.field_x, limb.field_y] {
                assert!(!seen[channel], "channel {channel} used twice");
                seen[channel] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_joint_lookup() {
        let topology = Topology::coco18();
        assert_eq!(topology.joint_index("l_ear"), Some(17));
        assert_eq!(topology.joint_index("tail"), None);
        assert_eq!(topology.joint_name(18), None);
    }

    #[test]
    fn test_invalid_limb_rejected() {
        let mut topology = Topology::coco18();
        topology.limbs.push(Limb::new(0, 18, 0, 1));
        assert!(topology.validate().is_err());

        let mut topology = Topology::coco18();
        topology.limbs.push(Limb::new(0, 1, 38, 1));
        assert!(topology.validate().is_err());

        let mut topology = Topology::coco18();
        topology.limbs.push(Limb::new(3, 3, 0, 1));
        assert!(topology.validate().is_err());
    }
}
