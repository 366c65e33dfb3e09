//! Assembly of keypoint candidates into skeletons using limb affinity fields.
//!
//! Limbs are processed in topology order. For each limb every pair of
//! endpoint candidates is scored by integrating the affinity field along the
//! segment between them, and surviving pairs are matched greedily so that a
//! candidate takes part in at most one link per limb. Accepted links merge the
//! groups of their endpoints in a disjoint-set over candidate ids. A merge that
//! would place two candidates in the same joint slot is refused.

use crate::config::GroupingConfig;
use crate::keypoints::{Candidate, CandidateSet};
use crate::topology::{Limb, Topology};
use crate::utils::disjoint_set::DisjointSet;
use crate::utils::safe_cast::f32_to_index;
use ndarray::ArrayView3;

/// An accepted link between two candidates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimbConnection {
    /// Candidate id at the limb's start joint
    pub from: usize,
    /// Candidate id at the limb's end joint
    pub to: usize,
    /// Mean field alignment along the limb
    pub score: f32,
}

/// Candidates grouped into one person, by joint slot
#[derive(Debug, Clone, PartialEq)]
pub struct JointGroup {
    /// Candidate id per joint type, `None` where the joint was not linked
    pub joints: Vec<Option<usize>>,
    /// Sum of candidate scores and link scores
    pub score: f32,
}

impl JointGroup {
    fn singleton(candidate: &Candidate, num_joints: usize) -> Self {
        let mut joints = vec![None; num_joints];
        joints[candidate.joint] = Some(candidate.id);
        Self {
            joints,
            score: candidate.score,
        }
    }

    /// Number of filled joint slots
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.iter().filter(|slot| slot.is_some()).count()
    }

    /// Score per filled joint
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Joint counts are tiny
    pub fn average_score(&self) -> f32 {
        match self.joint_count() {
            0 => 0.0,
            count => self.score / count as f32,
        }
    }

    fn overlaps(&self, other: &Self) -> bool {
        self.joints
            .iter()
            .zip(&other.joints)
            .any(|(a, b)| a.is_some() && b.is_some())
    }

    fn absorb(&mut self, other: Self, link_score: f32) {
        for (slot, theirs) in self.joints.iter_mut().zip(other.joints) {
            if slot.is_none() {
                *slot = theirs;
            }
        }
        self.score += other.score + link_score;
    }
}

/// A scored candidate pair before conflict resolution
#[derive(Debug, Clone, Copy)]
struct ScoredPair {
    a: usize,
    b: usize,
    alignment: f32,
    combined: f32,
}

/// Greedy limb-affinity pose assembler
#[derive(Debug, Clone)]
pub struct PoseAssembler {
    config: GroupingConfig,
    topology: Topology,
}

impl PoseAssembler {
    #[must_use]
    pub fn new(config: &GroupingConfig, topology: &Topology) -> Self {
        Self {
            config: config.clone(),
            topology: topology.clone(),
        }
    }

    /// Group candidates into validated joint groups
    ///
    /// Groups are returned in order of their lowest candidate id. A frame
    /// without candidates yields no groups.
    #[must_use]
    pub fn assemble(&self, candidates: &CandidateSet, fields: ArrayView3<f32>) -> Vec<JointGroup> {
        let num_joints = self.topology.num_joints();
        let mut sets = DisjointSet::new(candidates.len());
        let mut groups: Vec<Option<JointGroup>> = candidates
            .all()
            .iter()
            .map(|candidate| Some(JointGroup::singleton(candidate, num_joints)))
            .collect();

        for (limb_idx, limb) in self.topology.limbs.iter().enumerate() {
            let from = candidates.for_joint(limb.from);
            let to = candidates.for_joint(limb.to);
            if from.is_empty() || to.is_empty() {
                continue;
            }

            for connection in self.connect(limb, from, to, fields) {
                let root_a = sets.find(connection.from);
                let root_b = sets.find(connection.to);
                if root_a == root_b {
                    continue;
                }

                let conflict = match (&groups[root_a], &groups[root_b]) {
                    (Some(a), Some(b)) => a.overlaps(b),
                    _ => true,
                };
                if conflict {
                    log::trace!(
                        "Limb {}: link {}->{} would fill a joint twice, skipped",
                        limb_idx,
                        connection.from,
                        connection.to
                    );
                    continue;
                }

                let root = sets.union(root_a, root_b);
                let child = if root == root_a { root_b } else { root_a };
                if let (Some(absorbed), Some(mut survivor)) = (groups[child].take(), groups[root].take()) {
                    survivor.absorb(absorbed, connection.score);
                    groups[root] = Some(survivor);
                }
            }
        }

        let mut assembled = Vec::new();
        for id in 0..candidates.len() {
            if sets.find(id) != id {
                continue;
            }
            if let Some(group) = groups[id].take() {
                assembled.push((lowest_id(&group), group));
            }
        }
        assembled.sort_by_key(|(lowest, _)| *lowest);

        let total = assembled.len();
        let valid: Vec<JointGroup> = assembled
            .into_iter()
            .map(|(_, group)| group)
            .filter(|group| {
                group.joint_count() >= self.config.min_joint_count
                    && group.average_score() >= self.config.min_average_score
            })
            .collect();

        log::debug!("Assembled {} groups, {} valid", total, valid.len());
        valid
    }

    /// Score and greedily match the candidate pairs of one limb
    #[must_use]
    pub fn connect(
        &self,
        limb: &Limb,
        from: &[Candidate],
        to: &[Candidate],
        fields: ArrayView3<f32>,
    ) -> Vec<LimbConnection> {
        let mut pairs = Vec::new();
        for (a, start) in from.iter().enumerate() {
            for (b, end) in to.iter().enumerate() {
                if let Some(alignment) = self.limb_alignment(limb, start, end, fields) {
                    pairs.push(ScoredPair {
                        a,
                        b,
                        alignment,
                        combined: alignment + start.score + end.score,
                    });
                }
            }
        }

        // Stable sort keeps enumeration order among equal scores
        pairs.sort_by(|p, q| q.combined.total_cmp(&p.combined));

        let max_links = from.len().min(to.len());
        let mut used_from = vec![false; from.len()];
        let mut used_to = vec![false; to.len()];
        let mut connections = Vec::with_capacity(max_links);
        for pair in pairs {
            if connections.len() == max_links {
                break;
            }
            if used_from[pair.a] || used_to[pair.b] {
                continue;
            }
            used_from[pair.a] = true;
            used_to[pair.b] = true;
            connections.push(LimbConnection {
                from: from[pair.a].id,
                to: to[pair.b].id,
                score: pair.alignment,
            });
        }
        connections
    }

    /// Mean alignment of the affinity field with the segment `start -> end`
    ///
    /// Returns `None` when the pair is rejected: coincident endpoints, a pass
    /// ratio of aligned sample points below the minimum, or a mean alignment
    /// below the minimum. Sample points round to the nearest grid cell.
    #[allow(clippy::cast_precision_loss)] // Grid sizes and sample counts are small
    fn limb_alignment(
        &self,
        limb: &Limb,
        start: &Candidate,
        end: &Candidate,
        fields: ArrayView3<f32>,
    ) -> Option<f32> {
        let (_, height, width) = fields.dim();
        let (ax, ay) = (start.x as f32, start.y as f32);
        let dx = end.x as f32 - ax;
        let dy = end.y as f32 - ay;
        let length = dx.hypot(dy);
        if length == 0.0 {
            return None;
        }
        let (ux, uy) = (dx / length, dy / length);

        let samples = self.config.sample_points.max(1);
        let step = if samples > 1 { 1.0 / (samples - 1) as f32 } else { 0.0 };

        let mut passed = 0usize;
        let mut passed_score = 0.0f32;
        for k in 0..samples {
            let t = k as f32 * step;
            let px = f32_to_index((ax + t * dx).round(), width);
            let py = f32_to_index((ay + t * dy).round(), height);
            let score = ux * fields[[limb.field_x, py, px]] + uy * fields[[limb.field_y, py, px]];
            if score > self.config.min_paf_score {
                passed += 1;
                passed_score += score;
            }
        }

        let pass_ratio = passed as f32 / samples as f32;
        let mut alignment = if passed > 0 { passed_score / passed as f32 } else { 0.0 };
        if self.config.length_penalty {
            let half_height = (height / 2) as f32;
            alignment += (half_height / length - 1.0).min(0.0);
        }

        if alignment >= self.config.min_alignment_score && pass_ratio >= self.config.min_pass_ratio {
            Some(alignment)
        } else {
            None
        }
    }
}

fn lowest_id(group: &JointGroup) -> usize {
    group.joints.iter().flatten().copied().min().unwrap_or(usize::MAX)
}
