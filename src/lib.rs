//! Per-joint skin temperature estimation from a pose skeleton and a registered
//! depth/thermal frame.
//!
//! This library provides:
//! - Keypoint extraction from pose network heatmaps
//! - Limb affinity field grouping of keypoints into skeletons
//! - Selection of the most centered skeleton and per-joint window sampling
//!
//! The estimation pipeline consists of:
//! 1. Inference producing joint heatmaps and limb affinity fields (opaque)
//! 2. Peak extraction with non-maximum suppression per joint type
//! 3. Greedy limb matching and skeleton assembly
//! 4. Selection of the skeleton closest to the horizontal frame center
//! 5. Window-mean sampling of the depth frame at each resolved joint
//!
//! # Examples
//!
//! ## Estimating from network output
//!
//! ```no_run
//! use joint_temperature::config::Config;
//! use joint_temperature::frame::FrameMetadata;
//! use joint_temperature::inference::{FieldTransform, NetworkOutput};
//! use joint_temperature::pipeline::JointTemperaturePipeline;
//! use ndarray::{Array2, Array3};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metadata = FrameMetadata { width: 640, height: 480, depth_scale: 0.001 };
//! let pipeline = JointTemperaturePipeline::new(&Config::default(), metadata)?;
//!
//! // Heatmaps and fields would normally come from a PoseNetwork
//! let output = NetworkOutput {
//!     heatmaps: Array3::zeros((19, 480, 640)),
//!     fields: Array3::zeros((38, 480, 640)),
//!     transform: FieldTransform::identity(),
//! };
//! let depth = Array2::<u16>::zeros((480, 640));
//!
//! let estimate = pipeline.estimate(&output, &depth)?;
//! for (joint, value) in &estimate.temperatures {
//!     println!("{joint}: {value:.1}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Replaying a recorded session
//!
//! ```no_run
//! use joint_temperature::frame::replay::ImageSequenceSource;
//! use joint_temperature::frame::FrameSource;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut source = ImageSequenceSource::open("recordings/session1", 0.001)?;
//! while let Some(frame) = source.next_frame()? {
//!     println!("{}x{}", frame.width(), frame.height());
//! }
//! # Ok(())
//! # }
//! ```

/// Configuration management
pub mod config;

/// Constants used throughout the library
pub mod constants;

/// Error types and result handling
pub mod error;

/// Frame types and frame sources
pub mod frame;

/// Skeleton assembly from keypoint candidates and affinity fields
pub mod grouping;

/// Pose network seam and network output
pub mod inference;

/// Keypoint candidate extraction from heatmaps
pub mod keypoints;

/// Per-frame orchestration
pub mod pipeline;

/// Network input preparation and output upsampling
pub mod preprocessing;

/// Selection of the most centered skeleton
pub mod selection;

/// Skeletons in frame pixel space
pub mod skeleton;

/// Per-joint window sampling of depth frames
pub mod temperature;

/// Joint and limb topology
pub mod topology;

/// Utility functions for numeric conversion and grouping
pub mod utils;

pub use error::{Error, Result};
