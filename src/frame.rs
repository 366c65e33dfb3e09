//! Frame types and the frame source seam.
//!
//! A frame source delivers color and depth frames that are already registered
//! to each other: pixel `(x, y)` in the depth frame observes the same point as
//! pixel `(x, y)` in the color frame. Color frames are stored as `(height,
//! width, 3)` arrays in BGR order, depth frames as `(height, width)` arrays of
//! raw sensor units.

#[cfg(feature = "camera")]
pub mod depth_camera;
pub mod replay;

use crate::{Error, Result};
use ndarray::{Array2, Array3};

/// BGR color frame, shape `(height, width, 3)`
pub type ColorFrame = Array3<u8>;

/// Raw depth/thermal-proxy frame, shape `(height, width)`
pub type DepthFrame = Array2<u16>;

/// Session-level sensor metadata
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMetadata {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Multiplier converting raw depth units to metres
    pub depth_scale: f64,
}

impl FrameMetadata {
    /// Metadata for the frame size a device reports after negotiation
    ///
    /// Devices may ignore a requested size, so the reported one wins. A
    /// report that is not a positive whole pixel count falls back to the
    /// requested size.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Bounds checked against u32::MAX first
    #[allow(clippy::cast_sign_loss)] // Only positive values are converted
    pub fn negotiated(requested: (u32, u32), reported: (f64, f64), depth_scale: f64) -> Self {
        let pixels = |value: f64, fallback: u32| {
            if (1.0..=f64::from(u32::MAX)).contains(&value) {
                value.round() as u32
            } else {
                fallback
            }
        };
        Self {
            width: pixels(reported.0, requested.0),
            height: pixels(reported.1, requested.1),
            depth_scale,
        }
    }
}

/// A registered color/depth frame pair
#[derive(Debug, Clone)]
pub struct FramePair {
    pub color: ColorFrame,
    pub depth: DepthFrame,
}

impl FramePair {
    /// Pair a color and depth frame, checking they cover the same pixels
    ///
    /// # Errors
    ///
    /// Returns `FrameSource` if the color frame is not 3-channel or the two
    /// frames differ in size.
    pub fn new(color: ColorFrame, depth: DepthFrame) -> Result<Self> {
        let (height, width, channels) = color.dim();
        if channels != 3 {
            return Err(Error::FrameSource(format!(
                "Color frame must have 3 channels, got {channels}"
            )));
        }
        if depth.dim() != (height, width) {
            return Err(Error::FrameSource(format!(
                "Depth frame {:?} is not registered to color frame {:?}",
                depth.dim(),
                (height, width)
            )));
        }
        Ok(Self { color, depth })
    }

    /// Frame width in pixels
    #[must_use]
    pub fn width(&self) -> usize {
        self.color.dim().1
    }

    /// Frame height in pixels
    #[must_use]
    pub fn height(&self) -> usize {
        self.color.dim().0
    }
}

/// Supplier of registered frame pairs
pub trait FrameSource {
    /// Sensor metadata, fixed for the session
    fn metadata(&self) -> FrameMetadata;

    /// Block until the next frame pair is available
    ///
    /// Returns `Ok(None)` once a finite source is exhausted.
    ///
    /// # Errors
    ///
    /// Returns `FrameSource` or `FrameTimeout` when acquisition fails. The
    /// pipeline does not retry.
    fn next_frame(&mut self) -> Result<Option<FramePair>>;
}
