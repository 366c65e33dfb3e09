//! Live depth camera capture through OpenCV's OpenNI2 backend.

use super::{FrameMetadata, FramePair, FrameSource};
use crate::config::CameraConfig;
use crate::utils::image_conversion::{mat_to_color_frame, mat_to_depth_frame};
use crate::{Error, Result};
use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};

/// Depth camera delivering color frames with depth registered onto them
pub struct DepthCamera {
    capture: VideoCapture,
    metadata: FrameMetadata,
    color: Mat,
    depth: Mat,
}

impl DepthCamera {
    /// Open the capture device described by `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot be opened or refuses depth
    /// registration
    #[allow(clippy::cast_precision_loss)] // Timeouts are far below f64 precision limits
    pub fn open(config: &CameraConfig) -> Result<Self> {
        log::info!("Opening depth camera {} via OpenNI2", config.device);

        let mut capture = VideoCapture::new(config.device, videoio::CAP_OPENNI2)?;
        if !capture.is_opened()? {
            return Err(Error::FrameSource(format!(
                "Could not open depth camera {}",
                config.device
            )));
        }

        // Map depth pixels onto the color sensor's pixel grid
        if !capture.set(videoio::CAP_OPENNI_DEPTH_GENERATOR_REGISTRATION, 1.0)? {
            return Err(Error::FrameSource("Depth camera does not support registration".to_string()));
        }
        capture.set(videoio::CAP_PROP_FRAME_WIDTH, f64::from(config.width))?;
        capture.set(videoio::CAP_PROP_FRAME_HEIGHT, f64::from(config.height))?;
        capture.set(
            videoio::CAP_PROP_READ_TIMEOUT_MSEC,
            config.grab_timeout_ms as f64,
        )?;

        // OpenNI2 may keep its own output mode regardless of the request
        let metadata = FrameMetadata::negotiated(
            (config.width, config.height),
            (
                capture.get(videoio::CAP_PROP_FRAME_WIDTH)?,
                capture.get(videoio::CAP_PROP_FRAME_HEIGHT)?,
            ),
            config.depth_scale,
        );
        if (metadata.width, metadata.height) != (config.width, config.height) {
            log::warn!(
                "Depth camera delivers {}x{} instead of the requested {}x{}",
                metadata.width,
                metadata.height,
                config.width,
                config.height
            );
        }

        Ok(Self {
            capture,
            metadata,
            color: Mat::default(),
            depth: Mat::default(),
        })
    }
}

impl FrameSource for DepthCamera {
    fn metadata(&self) -> FrameMetadata {
        self.metadata
    }

    fn next_frame(&mut self) -> Result<Option<FramePair>> {
        if !self.capture.grab()? {
            return Err(Error::FrameTimeout("Depth camera did not deliver a frame".to_string()));
        }

        if !self.capture.retrieve(&mut self.depth, videoio::CAP_OPENNI_DEPTH_MAP)? {
            return Err(Error::FrameSource("Failed to retrieve depth map".to_string()));
        }
        if !self.capture.retrieve(&mut self.color, videoio::CAP_OPENNI_BGR_IMAGE)? {
            return Err(Error::FrameSource("Failed to retrieve color image".to_string()));
        }

        let pair = FramePair::new(mat_to_color_frame(&self.color)?, mat_to_depth_frame(&self.depth)?)?;
        if (pair.width(), pair.height()) != (self.metadata.width as usize, self.metadata.height as usize) {
            return Err(Error::FrameSource(format!(
                "Depth camera delivered {}x{}, session is {}x{}",
                pair.width(),
                pair.height(),
                self.metadata.width,
                self.metadata.height
            )));
        }
        Ok(Some(pair))
    }
}
