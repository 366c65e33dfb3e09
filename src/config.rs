//! Configuration management for the joint temperature pipeline

use crate::constants::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_DEPTH_SCALE, DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH,
    DEFAULT_GRAB_TIMEOUT_MS, DEFAULT_IMAGE_MEAN, DEFAULT_IMAGE_SCALE, DEFAULT_MIN_ALIGNMENT_SCORE,
    DEFAULT_MIN_AVERAGE_SCORE, DEFAULT_MIN_JOINT_COUNT, DEFAULT_MIN_PAF_SCORE, DEFAULT_MIN_PASS_RATIO,
    DEFAULT_NET_INPUT_HEIGHT, DEFAULT_PAF_SAMPLE_POINTS, DEFAULT_REFERENCE_JOINT, DEFAULT_SAMPLING_HALF_WINDOW,
    DEFAULT_STRIDE, DEFAULT_SUPPRESSION_RADIUS, DEFAULT_UPSAMPLE_RATIO,
};
use crate::topology::Topology;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model configuration
    pub models: ModelConfig,

    /// Depth camera configuration
    pub camera: CameraConfig,

    /// Network input preparation
    pub inference: InferenceConfig,

    /// Keypoint extraction parameters
    pub extraction: ExtractionConfig,

    /// Limb grouping parameters
    pub grouping: GroupingConfig,

    /// Pose selection parameters
    pub selection: SelectionConfig,

    /// Depth window sampling parameters
    pub sampling: SamplingConfig,

    /// Joint names and limb traversal
    pub topology: Topology,
}

/// Model file paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the pose network ONNX export
    pub pose_network: PathBuf,
}

/// Depth camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Capture device index
    pub device: i32,

    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Multiplier converting raw depth units to metres
    pub depth_scale: f64,

    /// Maximum time to wait for a frame pair, in milliseconds
    pub grab_timeout_ms: u64,
}

/// Network input preparation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Height the color frame is resized to before inference
    pub net_input_height: u32,

    /// Output stride of the network
    pub stride: u32,

    /// Factor the network outputs are upsampled by before extraction
    pub upsample_ratio: u32,

    /// Value written into padded pixels (per channel, after normalisation)
    pub pad_value: [f32; 3],

    /// Mean subtracted from every channel
    pub image_mean: f32,

    /// Scale applied after mean subtraction
    pub image_scale: f32,
}

/// Keypoint extraction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Heatmap value a peak must exceed (0.0-1.0)
    pub confidence_threshold: f32,

    /// Peaks closer than this to a stronger peak are suppressed (pixels)
    pub suppression_radius: f32,
}

/// Limb grouping parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    /// Alignment a single sampled point needs to count as passed
    pub min_paf_score: f32,

    /// Number of points sampled along each candidate limb
    pub sample_points: usize,

    /// Fraction of sampled points that must pass (0.0-1.0)
    pub min_pass_ratio: f32,

    /// Minimum mean alignment of a candidate limb
    pub min_alignment_score: f32,

    /// Penalise limbs longer than half the field height
    pub length_penalty: bool,

    /// Skeletons with fewer joints are discarded
    pub min_joint_count: usize,

    /// Skeletons whose score per joint is lower are discarded
    pub min_average_score: f32,
}

/// Pose selection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Joint type used to place a skeleton horizontally
    pub reference_joint: usize,

    /// Skeletons this far or farther from the center are not eligible
    pub max_center_distance: Option<f32>,
}

/// Depth window sampling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Pixels sampled on each side of the joint
    pub half_window: u32,

    /// Multiply readings by the session depth scale
    pub apply_depth_scale: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            pose_network: PathBuf::from("assets/human-pose-estimation.onnx"),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: 0,
            width: DEFAULT_FRAME_WIDTH,
            height: DEFAULT_FRAME_HEIGHT,
            depth_scale: DEFAULT_DEPTH_SCALE,
            grab_timeout_ms: DEFAULT_GRAB_TIMEOUT_MS,
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            net_input_height: DEFAULT_NET_INPUT_HEIGHT,
            stride: DEFAULT_STRIDE,
            upsample_ratio: DEFAULT_UPSAMPLE_RATIO,
            pad_value: [0.0; 3],
            image_mean: DEFAULT_IMAGE_MEAN,
            image_scale: DEFAULT_IMAGE_SCALE,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            suppression_radius: DEFAULT_SUPPRESSION_RADIUS,
        }
    }
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            min_paf_score: DEFAULT_MIN_PAF_SCORE,
            sample_points: DEFAULT_PAF_SAMPLE_POINTS,
            min_pass_ratio: DEFAULT_MIN_PASS_RATIO,
            min_alignment_score: DEFAULT_MIN_ALIGNMENT_SCORE,
            length_penalty: true,
            min_joint_count: DEFAULT_MIN_JOINT_COUNT,
            min_average_score: DEFAULT_MIN_AVERAGE_SCORE,
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            reference_joint: DEFAULT_REFERENCE_JOINT,
            max_center_distance: None,
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            half_window: DEFAULT_SAMPLING_HALF_WINDOW,
            apply_depth_scale: false,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_yaml()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Render the configuration as YAML
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))
    }

    /// Validate configuration
    ///
    /// Model paths are not checked here; the adapter that opens them reports
    /// a missing file itself.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` describing the first invalid value found
    pub fn validate(&self) -> Result<()> {
        self.topology.validate()?;

        // Camera
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(Error::ConfigError("Frame width and height must be greater than 0".to_string()));
        }
        if !(self.camera.depth_scale.is_finite() && self.camera.depth_scale > 0.0) {
            return Err(Error::ConfigError("Depth scale must be a positive number".to_string()));
        }

        // Inference
        if self.inference.net_input_height == 0 {
            return Err(Error::ConfigError("Network input height must be greater than 0".to_string()));
        }
        if self.inference.stride == 0 || self.inference.upsample_ratio == 0 {
            return Err(Error::ConfigError(
                "Stride and upsample ratio must be greater than 0".to_string(),
            ));
        }

        // Extraction
        if !(0.0..=1.0).contains(&self.extraction.confidence_threshold) {
            return Err(Error::ConfigError(
                "Confidence threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.extraction.suppression_radius < 0.0 {
            return Err(Error::ConfigError("Suppression radius must not be negative".to_string()));
        }

        // Grouping
        if self.grouping.sample_points == 0 {
            return Err(Error::ConfigError("Limb sample points must be greater than 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.grouping.min_pass_ratio) {
            return Err(Error::ConfigError("Minimum pass ratio must be between 0.0 and 1.0".to_string()));
        }
        if self.grouping.min_joint_count == 0 {
            return Err(Error::ConfigError("Minimum joint count must be greater than 0".to_string()));
        }

        // Selection
        if self.selection.reference_joint >= self.topology.num_joints() {
            return Err(Error::ConfigError(format!(
                "Reference joint {} is not part of the topology",
                self.selection.reference_joint
            )));
        }
        if let Some(distance) = self.selection.max_center_distance {
            if distance <= 0.0 {
                return Err(Error::ConfigError("Maximum center distance must be positive".to_string()));
            }
        }

        // Sampling
        if self.sampling.half_window == 0 {
            return Err(Error::ConfigError("Sampling half window must be greater than 0".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Joint Temperature Configuration

# Model paths
models:
  pose_network: "assets/human-pose-estimation.onnx"

# Depth camera
camera:
  device: 0
  width: 640
  height: 480
  depth_scale: 0.001
  grab_timeout_ms: 5000

# Network input preparation
inference:
  net_input_height: 256
  stride: 8
  upsample_ratio: 4
  pad_value: [0.0, 0.0, 0.0]
  image_mean: 128.0
  image_scale: 0.00390625

# Keypoint extraction
extraction:
  confidence_threshold: 0.1
  suppression_radius: 6.0

# Limb grouping
grouping:
  min_paf_score: 0.05
  sample_points: 10
  min_pass_ratio: 0.8
  min_alignment_score: 0.0
  length_penalty: true
  min_joint_count: 3
  min_average_score: 0.2

# Pose selection
selection:
  reference_joint: 0
  max_center_distance: null

# Depth window sampling
sampling:
  half_window: 3
  apply_depth_scale: false
"#;
