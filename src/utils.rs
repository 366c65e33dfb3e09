//! Utility functions for grid indexing and frame conversions.

pub mod disjoint_set;
#[cfg(feature = "camera")]
pub mod image_conversion;
pub mod safe_cast;

use std::ops::Range;

/// Index range `[center - half, center + half)` clipped to `0..len`
///
/// The range is empty when the window lies entirely outside the axis.
#[must_use]
pub fn clipped_window(center: i64, half: u32, len: usize) -> Range<usize> {
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let half = i64::from(half);

    let start = center.saturating_sub(half).clamp(0, len);
    let end = center.saturating_add(half).clamp(0, len);
    let start = usize::try_from(start).unwrap_or(0);
    let end = usize::try_from(end).unwrap_or(0);
    start..end.max(start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_inside() {
        assert_eq!(clipped_window(100, 3, 640), 97..103);
    }

    #[test]
    fn test_window_clipped_at_origin() {
        assert_eq!(clipped_window(0, 3, 640), 0..3);
        assert_eq!(clipped_window(1, 3, 640), 0..4);
    }

    #[test]
    fn test_window_clipped_at_far_edge() {
        assert_eq!(clipped_window(639, 3, 640), 636..640);
    }

    #[test]
    fn test_window_outside() {
        assert!(clipped_window(-10, 3, 640).is_empty());
        assert!(clipped_window(700, 3, 640).is_empty());
    }

    #[test]
    fn test_zero_half_window_is_empty() {
        assert!(clipped_window(10, 0, 640).is_empty());
    }
}
