//! Checked numeric conversions between grid indices and pixel coordinates

use crate::{Error, Result};

/// Safely convert f32 to i32 with bounds checking, truncating toward zero
///
/// # Errors
///
/// Returns an error if the value is not finite or outside i32 range
#[allow(clippy::cast_precision_loss)] // MIN/MAX bounds checking is approximate
#[allow(clippy::cast_possible_truncation)] // Truncation after bounds check is safe
pub fn f32_to_i32(value: f32) -> Result<i32> {
    if value.is_finite() && value >= i32::MIN as f32 && value <= i32::MAX as f32 {
        Ok(value as i32)
    } else {
        Err(Error::InvalidInput(format!(
            "Value {value} cannot be safely converted to i32"
        )))
    }
}

/// Truncate a sub-pixel coordinate to a grid index inside `0..len`
///
/// Non-finite values map to 0. `len` of zero also yields 0, callers must not
/// index an empty axis.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Grid sizes are far below f32 precision limits
#[allow(clippy::cast_possible_truncation)] // Clamping ensures safe truncation
#[allow(clippy::cast_sign_loss)] // Negative values are clamped to 0 first
pub fn f32_to_index(value: f32, len: usize) -> usize {
    if len == 0 || !value.is_finite() {
        return 0;
    }
    let max = (len - 1) as f32;
    value.clamp(0.0, max) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_f32_to_i32_truncates() {
        assert_eq!(f32_to_i32(42.9).unwrap(), 42);
        assert_eq!(f32_to_i32(-42.9).unwrap(), -42);
        assert_eq!(f32_to_i32(0.0).unwrap(), 0);

        assert!(f32_to_i32(f32::INFINITY).is_err());
        assert!(f32_to_i32(f32::NAN).is_err());
        assert!(f32_to_i32(i32::MAX as f32 * 2.0).is_err());
    }

    #[test]
    fn test_f32_to_index() {
        assert_eq!(f32_to_index(12.7, 100), 12);
        assert_eq!(f32_to_index(-3.0, 100), 0);
        assert_eq!(f32_to_index(250.0, 100), 99);
        assert_eq!(f32_to_index(f32::NAN, 100), 0);
        assert_eq!(f32_to_index(5.0, 0), 0);
    }

    proptest! {
        #[test]
        fn prop_f32_to_index_always_in_bounds(value in any::<f32>(), len in 1usize..4096) {
            prop_assert!(f32_to_index(value, len) < len);
        }
    }
}
