//! Pose network inference through `ONNX` Runtime.

use super::{FieldTransform, NetworkOutput, PoseNetwork};
use crate::config::InferenceConfig;
use crate::frame::ColorFrame;
use crate::preprocessing::{prepare_input, upsample_stack};
use crate::{Error, Result};
use ndarray::{Array3, CowArray};
use ort::{Environment, Session, Value};
use std::path::Path;
use std::sync::Arc;

/// Lightweight OpenPose style network exported to `ONNX`
///
/// The last two model outputs are read as the heatmap stack and the affinity
/// field stack, each shaped `[1, channels, height, width]`.
pub struct OnnxPoseNetwork {
    session: Session,
    config: InferenceConfig,
}

impl OnnxPoseNetwork {
    /// Load the network from an `ONNX` model file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The ONNX model file cannot be loaded
    /// - The model has fewer than two outputs
    /// - The ONNX runtime environment cannot be created
    pub fn new<P: AsRef<Path>>(model_path: P, config: &InferenceConfig) -> Result<Self> {
        log::info!(
            "Initializing pose network with model: {}",
            model_path.as_ref().display()
        );
        let environment = Arc::new(
            Environment::builder()
                .with_name("pose_network")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        if session.inputs.is_empty() {
            return Err(Error::ModelError("Model has no inputs".to_string()));
        }
        if session.outputs.len() < 2 {
            return Err(Error::ModelError(format!(
                "Model has {} outputs, expected heatmaps and affinity fields",
                session.outputs.len()
            )));
        }

        Ok(Self {
            session,
            config: config.clone(),
        })
    }
}

impl PoseNetwork for OnnxPoseNetwork {
    fn infer(&mut self, color: &ColorFrame) -> Result<NetworkOutput> {
        let prepared = prepare_input(color, &self.config)?;

        let cow_array = CowArray::from(prepared.tensor.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;
        let outputs = self.session.run(vec![input_tensor])?;

        let count = outputs.len();
        if count < 2 {
            return Err(Error::ModelOutputError(format!("Expected at least 2 outputs, got {count}")));
        }
        let heatmaps = extract_stack(&outputs[count - 2], "heatmaps")?;
        let fields = extract_stack(&outputs[count - 1], "affinity fields")?;

        Ok(NetworkOutput {
            heatmaps: upsample_stack(heatmaps.view(), self.config.upsample_ratio),
            fields: upsample_stack(fields.view(), self.config.upsample_ratio),
            transform: FieldTransform {
                scale: prepared.scale,
                pad: prepared.pad,
                stride: self.config.stride,
                upsample_ratio: self.config.upsample_ratio,
            },
        })
    }
}

/// Copy a `[1, C, H, W]` output into a `(C, H, W)` stack
fn extract_stack(value: &Value, what: &str) -> Result<Array3<f32>> {
    let tensor = value.try_extract::<f32>()?;
    let view = tensor.view();
    let shape = view.shape().to_vec();

    let [batch, channels, height, width] = shape[..] else {
        return Err(Error::ModelDataFormatError(format!(
            "Expected 4-D {what} output, got shape {shape:?}"
        )));
    };
    if batch != 1 {
        return Err(Error::ModelDataFormatError(format!(
            "Expected batch of 1 for {what}, got {batch}"
        )));
    }

    view.to_owned()
        .into_shape((channels, height, width))
        .map_err(|e| Error::ModelDataFormatError(format!("Failed to reshape {what}: {e}")))
}
