//! Per-joint readings from the registered depth/thermal frame.

use crate::config::SamplingConfig;
use crate::frame::DepthFrame;
use crate::skeleton::Skeleton;
use crate::topology::Topology;
use crate::utils::clipped_window;
use ndarray::{s, ArrayView2};
use std::collections::BTreeMap;

/// Joint name to mean window value; unresolved joints have no entry
pub type TemperatureReading = BTreeMap<String, f64>;

/// Averages the depth frame over a square window around each joint
#[derive(Debug, Clone)]
pub struct TemperatureSampler {
    half_window: u32,
    scale: f64,
}

impl TemperatureSampler {
    /// `depth_scale` is applied only when the sampling config asks for it
    #[must_use]
    pub fn new(config: &SamplingConfig, depth_scale: f64) -> Self {
        Self {
            half_window: config.half_window,
            scale: if config.apply_depth_scale { depth_scale } else { 1.0 },
        }
    }

    /// Mean over rows `[y - h, y + h)` and columns `[x - h, x + h)`, clipped
    /// to the frame
    ///
    /// Returns `None` if the clipped window is empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Window pixel counts are tiny
    pub fn window_mean(&self, depth: ArrayView2<u16>, x: i32, y: i32) -> Option<f64> {
        let (height, width) = depth.dim();
        let rows = clipped_window(i64::from(y), self.half_window, height);
        let cols = clipped_window(i64::from(x), self.half_window, width);
        if rows.is_empty() || cols.is_empty() {
            return None;
        }

        let window = depth.slice(s![rows, cols]);
        let sum: f64 = window.iter().map(|&v| f64::from(v)).sum();
        Some(sum / window.len() as f64 * self.scale)
    }

    /// Read every resolved joint of the selected skeleton
    ///
    /// No skeleton yields an empty reading.
    #[must_use]
    pub fn sample(&self, skeleton: Option<&Skeleton>, depth: &DepthFrame, topology: &Topology) -> TemperatureReading {
        let mut reading = TemperatureReading::new();
        let Some(skeleton) = skeleton else {
            return reading;
        };

        for (joint, location) in skeleton.present_joints() {
            let Some(name) = topology.joint_name(joint) else {
                log::warn!("Skeleton joint {} is not in the topology", joint);
                continue;
            };
            match self.window_mean(depth.view(), location.x, location.y) {
                Some(value) => {
                    reading.insert(name.to_string(), value);
                }
                None => log::warn!(
                    "Joint {} at ({}, {}) lies outside the depth frame",
                    name,
                    location.x,
                    location.y
                ),
            }
        }

        reading
    }
}
