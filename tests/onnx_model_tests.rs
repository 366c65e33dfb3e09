//! Tests for ONNX model loading and inference

#![cfg(feature = "onnx")]

use joint_temperature::{
    config::{Config, InferenceConfig},
    frame::FrameMetadata,
    inference::{onnx::OnnxPoseNetwork, PoseNetwork},
    pipeline::JointTemperaturePipeline,
    Result,
};
use ndarray::{Array2, Array3};
use std::path::Path;

const MODEL_PATH: &str = "assets/human-pose-estimation.onnx";

#[test]
fn test_missing_model_is_an_error() {
    let result = OnnxPoseNetwork::new("assets/does-not-exist.onnx", &InferenceConfig::default());
    assert!(result.is_err());
}

#[test]
#[ignore = "Requires ONNX models"]
fn test_load_pose_network_model() -> Result<()> {
    assert!(Path::new(MODEL_PATH).exists(), "Pose network model not found");

    let _network = OnnxPoseNetwork::new(MODEL_PATH, &InferenceConfig::default())?;
    // If construction succeeds, model loaded correctly

    Ok(())
}

#[test]
#[ignore = "Requires ONNX models"]
fn test_inference_output_shapes() -> Result<()> {
    let config = InferenceConfig::default();
    let mut network = OnnxPoseNetwork::new(MODEL_PATH, &config)?;
    let color = Array3::<u8>::zeros((480, 640, 3));

    let output = network.infer(&color)?;
    let (heatmap_channels, height, width) = output.heatmaps.dim();
    assert_eq!(heatmap_channels, 19);
    assert_eq!(output.fields.dim(), (38, height, width));

    // 256 px input height at stride 8, upsampled 4x
    assert_eq!(height, 128);
    assert!((output.transform.scale - 256.0 / 480.0).abs() < 1e-6);

    Ok(())
}

#[test]
#[ignore = "Requires ONNX models"]
fn test_blank_frame_has_no_readings() -> Result<()> {
    let config = Config::default();
    let mut network = OnnxPoseNetwork::new(MODEL_PATH, &config.inference)?;
    let metadata = FrameMetadata {
        width: 640,
        height: 480,
        depth_scale: 0.001,
    };
    let pipeline = JointTemperaturePipeline::new(&config, metadata)?;

    let output = network.infer(&Array3::zeros((480, 640, 3)))?;
    let estimate = pipeline.estimate(&output, &Array2::zeros((480, 640)))?;
    assert!(estimate.temperatures.is_empty());

    Ok(())
}
