//! Network input preparation and output upsampling.
//!
//! The frame is resized so its height matches the network input height,
//! normalised per channel, then padded so both sides are multiples of the
//! network stride. Outputs come back at `1 / stride` of the input resolution
//! and are upsampled by `upsample_ratio` before keypoint extraction.

use crate::config::InferenceConfig;
use crate::frame::ColorFrame;
use crate::inference::Padding;
use crate::{Error, Result};
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgb};
use ndarray::{Array3, Array4, ArrayView3};

/// Network-ready input tensor with the transform that produced it
#[derive(Debug, Clone)]
pub struct PreparedInput {
    /// NCHW tensor, batch of one
    pub tensor: Array4<f32>,
    /// Resize factor applied to the frame
    pub scale: f32,
    /// Padding applied after resizing
    pub pad: Padding,
}

/// Resize, normalise and pad a BGR frame for the pose network
///
/// # Errors
///
/// Returns an error if the frame is empty or the buffers cannot be shaped
#[allow(clippy::cast_precision_loss)] // Frame sizes are far below f32 precision limits
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Rounded positive sizes
pub fn prepare_input(color: &ColorFrame, config: &InferenceConfig) -> Result<PreparedInput> {
    let (height, width, _) = color.dim();
    if height == 0 || width == 0 {
        return Err(Error::InvalidInput(format!("Empty color frame {width}x{height}")));
    }

    let scale = config.net_input_height as f32 / height as f32;
    let resized_width = ((width as f32 * scale).round() as u32).max(1);
    let resized_height = config.net_input_height;

    let frame: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_raw(
        u32::try_from(width).map_err(|_| Error::InvalidInput(format!("Frame width {width} too large")))?,
        u32::try_from(height).map_err(|_| Error::InvalidInput(format!("Frame height {height} too large")))?,
        color.iter().copied().collect(),
    )
    .ok_or_else(|| Error::InvalidInput("Color frame buffer does not match its dimensions".to_string()))?;
    let resized = imageops::resize(&frame, resized_width, resized_height, FilterType::CatmullRom);

    let (padded_height, padded_width, pad) = padded_size(resized_height, resized_width, config);

    let mut tensor = Array4::<f32>::zeros((1, 3, padded_height as usize, padded_width as usize));
    for channel in 0..3 {
        tensor
            .slice_mut(ndarray::s![0, channel, .., ..])
            .fill(config.pad_value[channel]);
    }

    for (x, y, pixel) in resized.enumerate_pixels() {
        let row = (y + pad.top) as usize;
        let col = (x + pad.left) as usize;
        for channel in 0..3 {
            tensor[[0, channel, row, col]] =
                (f32::from(pixel.0[channel]) - config.image_mean) * config.image_scale;
        }
    }

    log::trace!(
        "Prepared {}x{} input (scale {:.4}, pad {:?})",
        padded_width,
        padded_height,
        scale,
        pad
    );

    Ok(PreparedInput { tensor, scale, pad })
}

/// Padded size and padding for a resized frame
///
/// Height is at least the network input height and width at least as wide
/// as it is tall, both rounded up to the stride. Odd padding puts the extra
/// pixel at the bottom/right.
fn padded_size(height: u32, width: u32, config: &InferenceConfig) -> (u32, u32, Padding) {
    let stride = config.stride.max(1);
    let min_height = config.net_input_height.max(height);
    let min_width = width.max(config.net_input_height);
    let padded_height = min_height.div_ceil(stride) * stride;
    let padded_width = min_width.div_ceil(stride) * stride;

    let top = (padded_height - height) / 2;
    let left = (padded_width - width) / 2;
    let pad = Padding {
        top,
        left,
        bottom: padded_height - height - top,
        right: padded_width - width - left,
    };
    (padded_height, padded_width, pad)
}

/// Bilinearly upsample every channel of a `(channels, height, width)` stack
///
/// Sample positions use pixel centers, so a ratio of 1 returns the input.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Grid sizes are far below f32 precision limits
pub fn upsample_stack(stack: ArrayView3<f32>, ratio: u32) -> Array3<f32> {
    let (channels, height, width) = stack.dim();
    let ratio = ratio.max(1) as usize;
    let (out_height, out_width) = (height * ratio, width * ratio);
    let mut out = Array3::<f32>::zeros((channels, out_height, out_width));
    if height == 0 || width == 0 {
        return out;
    }

    let source_coord = |dst: usize, len: usize| -> (usize, usize, f32) {
        let src = ((dst as f32 + 0.5) / ratio as f32 - 0.5).clamp(0.0, (len - 1) as f32);
        let lo = crate::utils::safe_cast::f32_to_index(src, len);
        let hi = (lo + 1).min(len - 1);
        (lo, hi, src - lo as f32)
    };

    let rows: Vec<_> = (0..out_height).map(|y| source_coord(y, height)).collect();
    let cols: Vec<_> = (0..out_width).map(|x| source_coord(x, width)).collect();

    for channel in 0..channels {
        let src = stack.index_axis(ndarray::Axis(0), channel);
        let mut dst = out.index_axis_mut(ndarray::Axis(0), channel);
        for (y, &(y0, y1, wy)) in rows.iter().enumerate() {
            for (x, &(x0, x1, wx)) in cols.iter().enumerate() {
                let top = src[[y0, x0]] * (1.0 - wx) + src[[y0, x1]] * wx;
                let bottom = src[[y1, x0]] * (1.0 - wx) + src[[y1, x1]] * wx;
                dst[[y, x]] = top * (1.0 - wy) + bottom * wy;
            }
        }
    }

    out
}
