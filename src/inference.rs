//! Pose network seam and its output fields.
//!
//! The network itself is opaque: a [`PoseNetwork`] turns a color frame into a
//! heatmap stack and an affinity field stack, both at the same (upsampled)
//! network resolution, plus the [`FieldTransform`] needed to map positions in
//! those fields back onto frame pixels.

#[cfg(feature = "onnx")]
pub mod onnx;

use crate::frame::ColorFrame;
use crate::topology::Topology;
use crate::{Error, Result};
use ndarray::Array3;

/// Padding added around the resized frame, in network input pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Padding {
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
}

/// Mapping from field coordinates back to frame pixels
///
/// `frame = (field * stride / upsample_ratio - pad) / scale`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldTransform {
    /// Resize factor applied to the frame before inference
    pub scale: f32,
    /// Padding applied after resizing
    pub pad: Padding,
    /// Network output stride
    pub stride: u32,
    /// Upsampling applied to the network outputs
    pub upsample_ratio: u32,
}

impl FieldTransform {
    /// Fields already in frame pixel space
    #[must_use]
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            pad: Padding::default(),
            stride: 1,
            upsample_ratio: 1,
        }
    }

    /// Map a field position onto frame pixels (sub-pixel)
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Stride, ratio and padding are small
    pub fn to_frame(&self, x: f32, y: f32) -> (f32, f32) {
        let step = self.stride as f32 / self.upsample_ratio as f32;
        let fx = (x * step - self.pad.left as f32) / self.scale;
        let fy = (y * step - self.pad.top as f32) / self.scale;
        (fx, fy)
    }
}

/// Heatmaps and affinity fields for one frame
#[derive(Debug, Clone)]
pub struct NetworkOutput {
    /// Per joint confidence grids, shape `(channels, height, width)`
    pub heatmaps: Array3<f32>,
    /// Limb affinity vector components, shape `(channels, height, width)`
    pub fields: Array3<f32>,
    /// Mapping back to frame pixels
    pub transform: FieldTransform,
}

impl NetworkOutput {
    /// Check the stacks are usable with `topology`
    ///
    /// Malformed stacks are rejected rather than repaired.
    ///
    /// # Errors
    ///
    /// Returns `ModelDataFormatError` if either stack has too few channels,
    /// the spatial sizes disagree, or the grids are empty
    pub fn validate(&self, topology: &Topology) -> Result<()> {
        let (heatmap_channels, height, width) = self.heatmaps.dim();
        let (field_channels, field_height, field_width) = self.fields.dim();

        if height == 0 || width == 0 {
            return Err(Error::ModelDataFormatError(format!(
                "Heatmap grid is empty ({height}x{width})"
            )));
        }
        if heatmap_channels < topology.num_joints() {
            return Err(Error::ModelDataFormatError(format!(
                "Expected at least {} heatmap channels, got {heatmap_channels}",
                topology.num_joints()
            )));
        }

        let needed_fields = topology
            .limbs
            .iter()
            .map(|limb| limb.field_x.max(limb.field_y) + 1)
            .max()
            .unwrap_or(0);
        if field_channels < needed_fields {
            return Err(Error::ModelDataFormatError(format!(
                "Expected at least {needed_fields} affinity field channels, got {field_channels}"
            )));
        }
        if (field_height, field_width) != (height, width) {
            return Err(Error::ModelDataFormatError(format!(
                "Affinity fields are {field_height}x{field_width}, heatmaps are {height}x{width}"
            )));
        }
        if !(self.transform.scale.is_finite() && self.transform.scale > 0.0) {
            return Err(Error::ModelDataFormatError(format!(
                "Invalid resize scale {}",
                self.transform.scale
            )));
        }

        Ok(())
    }
}

/// Black-box pose network
pub trait PoseNetwork {
    /// Compute heatmaps and affinity fields for a BGR color frame
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails or produces malformed tensors
    fn infer(&mut self, color: &ColorFrame) -> Result<NetworkOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(heatmap_channels: usize, field_channels: usize, field_size: (usize, usize)) -> NetworkOutput {
        NetworkOutput {
            heatmaps: Array3::zeros((heatmap_channels, 32, 40)),
            fields: Array3::zeros((field_channels, field_size.0, field_size.1)),
            transform: FieldTransform::identity(),
        }
    }

    #[test]
    fn test_identity_transform() {
        let transform = FieldTransform::identity();
        assert_eq!(transform.to_frame(12.0, 34.0), (12.0, 34.0));
    }

    #[test]
    fn test_transform_undoes_resize_and_padding() {
        // 640x480 frame resized to height 256 (scale 0.5333), padded 4px left
        let transform = FieldTransform {
            scale: 256.0 / 480.0,
            pad: Padding {
                top: 0,
                left: 4,
                bottom: 0,
                right: 4,
            },
            stride: 8,
            upsample_ratio: 4,
        };
        // Field x=162 -> input x=324 -> resized x=320 -> frame x=600
        let (x, y) = transform.to_frame(162.0, 64.0);
        assert!((x - 600.0).abs() < 1e-3);
        assert!((y - 240.0).abs() < 1e-3);
    }

    #[test]
    fn test_validate_accepts_coco_stacks() {
        assert!(output(19, 38, (32, 40)).validate(&Topology::coco18()).is_ok());
    }

    #[test]
    fn test_validate_rejects_malformed_stacks() {
        let topology = Topology::coco18();
        assert!(matches!(
            output(10, 38, (32, 40)).validate(&topology),
            Err(Error::ModelDataFormatError(_))
        ));
        assert!(output(19, 20, (32, 40)).validate(&topology).is_err());
        assert!(output(19, 38, (16, 20)).validate(&topology).is_err());
    }
}
