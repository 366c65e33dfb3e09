//! Conversions from OpenCV `Mat` frames into ndarray frames.

use crate::frame::{ColorFrame, DepthFrame};
use crate::{Error, Result};
use ndarray::{Array2, Array3};
use opencv::core::{Mat, MatTraitConst, CV_16UC1, CV_8UC3};

/// Convert an 8-bit BGR `Mat` into a color frame
///
/// # Errors
///
/// Returns an error if the `Mat` is empty, not `CV_8UC3`, or its data cannot
/// be accessed
pub fn mat_to_color_frame(mat: &Mat) -> Result<ColorFrame> {
    let (rows, cols) = checked_dims(mat, CV_8UC3, "CV_8UC3")?;

    // Non-continuous Mats (ROIs) need a compacting copy first
    let continuous;
    let mat = if mat.is_continuous() {
        mat
    } else {
        continuous = mat.try_clone()?;
        &continuous
    };

    let data = mat.data_bytes()?.to_vec();
    Array3::from_shape_vec((rows, cols, 3), data)
        .map_err(|e| Error::InvalidInput(format!("Failed to create color frame from Mat: {e}")))
}

/// Convert a 16-bit single channel `Mat` into a depth frame
///
/// # Errors
///
/// Returns an error if the `Mat` is empty, not `CV_16UC1`, or its data cannot
/// be accessed
pub fn mat_to_depth_frame(mat: &Mat) -> Result<DepthFrame> {
    let (rows, cols) = checked_dims(mat, CV_16UC1, "CV_16UC1")?;

    let continuous;
    let mat = if mat.is_continuous() {
        mat
    } else {
        continuous = mat.try_clone()?;
        &continuous
    };

    let data = mat.data_typed::<u16>()?.to_vec();
    Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| Error::InvalidInput(format!("Failed to create depth frame from Mat: {e}")))
}

#[allow(clippy::cast_sign_loss)] // Checked positive above
fn checked_dims(mat: &Mat, expected_type: i32, type_name: &str) -> Result<(usize, usize)> {
    let rows = mat.rows();
    let cols = mat.cols();
    if rows <= 0 || cols <= 0 {
        return Err(Error::InvalidInput(format!("Invalid Mat dimensions: {rows}x{cols}")));
    }
    if mat.typ() != expected_type {
        return Err(Error::InvalidInput(format!(
            "Expected {type_name} Mat, got type {}",
            mat.typ()
        )));
    }
    Ok((rows as usize, cols as usize))
}
