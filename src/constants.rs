//! Constants used throughout the library

/// Number of joint types in the COCO-18 body topology
pub const NUM_BODY_JOINTS: usize = 18;

/// Number of heatmap channels produced by the pose network (joints + background)
pub const NUM_HEATMAP_CHANNELS: usize = 19;

/// Number of affinity field channels produced by the pose network (x/y per limb)
pub const NUM_PAF_CHANNELS: usize = 38;

/// Default session frame size
pub const DEFAULT_FRAME_WIDTH: u32 = 640;
pub const DEFAULT_FRAME_HEIGHT: u32 = 480;

/// Default depth unit scale (raw units to metres)
pub const DEFAULT_DEPTH_SCALE: f64 = 0.001;

/// Network input preparation defaults
pub const DEFAULT_NET_INPUT_HEIGHT: u32 = 256;
pub const DEFAULT_STRIDE: u32 = 8;
pub const DEFAULT_UPSAMPLE_RATIO: u32 = 4;
pub const DEFAULT_IMAGE_MEAN: f32 = 128.0;
pub const DEFAULT_IMAGE_SCALE: f32 = 1.0 / 256.0;

/// Keypoint extraction defaults
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.1;
pub const DEFAULT_SUPPRESSION_RADIUS: f32 = 6.0;

/// Limb scoring defaults
pub const DEFAULT_MIN_PAF_SCORE: f32 = 0.05;
pub const DEFAULT_PAF_SAMPLE_POINTS: usize = 10;
pub const DEFAULT_MIN_PASS_RATIO: f32 = 0.8;
pub const DEFAULT_MIN_ALIGNMENT_SCORE: f32 = 0.0;

/// Skeleton validity defaults
pub const DEFAULT_MIN_JOINT_COUNT: usize = 3;
pub const DEFAULT_MIN_AVERAGE_SCORE: f32 = 0.2;

/// Joint used to locate a skeleton horizontally (nose in COCO-18)
pub const DEFAULT_REFERENCE_JOINT: usize = 0;

/// Half side of the square sampling window, in pixels
pub const DEFAULT_SAMPLING_HALF_WINDOW: u32 = 3;

/// Default grab timeout for live capture
pub const DEFAULT_GRAB_TIMEOUT_MS: u64 = 5000;
