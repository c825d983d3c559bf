//! Adaptive font sizing.
//!
//! Picks the largest font size whose single-line text width stays within 80%
//! of the image width, searching between bounds derived from the shorter image
//! side.

use super::fonts::FontSet;
use super::text_metrics::measure_str;

/// Fraction of the image width the single-line text may occupy.
pub const TARGET_WIDTH_RATIO: f32 = 0.80;

/// Binary search iterations.
pub const MAX_ITERATIONS: u32 = 10;

const ABSOLUTE_MIN_SIZE: u32 = 10;
const MIN_SIZE_RATIO: f64 = 0.015;
const MAX_SIZE_RATIO: f64 = 0.30;

/// Search bounds for an image: `(min, max)`.
///
/// The lower bound is at least 10px. On images too small for the upper bound
/// to exceed it, the upper bound becomes `min + 1`.
pub fn size_bounds(width: u32, height: u32) -> (u32, u32) {
    let shorter = width.min(height) as f64;
    let min = ABSOLUTE_MIN_SIZE.max((shorter * MIN_SIZE_RATIO).floor() as u32);
    let max = (shorter * MAX_SIZE_RATIO).floor() as u32;
    if max <= min {
        (min, min + 1)
    } else {
        (min, max)
    }
}

/// Largest size in the bounds whose single-line width fits the target.
///
/// Returns `base_size` unchanged for empty text. When even the lower bound
/// does not fit, the lower bound is returned.
pub fn adaptive_font_size(text: &str, base_size: u32, image_size: (u32, u32), fonts: &FontSet) -> u32 {
    if text.is_empty() {
        return base_size;
    }

    let (width, height) = image_size;
    let (min_size, max_size) = size_bounds(width, height);
    let target = width as f32 * TARGET_WIDTH_RATIO;

    let mut low = min_size;
    let mut high = max_size;
    let mut best = min_size;

    for _ in 0..MAX_ITERATIONS {
        if low > high {
            break;
        }
        let mid = low + (high - low) / 2;
        let extent = measure_str(text, &fonts.at_size(mid as f32));
        if extent.width <= target {
            best = mid;
            low = mid + 1;
        } else if mid == 0 {
            break;
        } else {
            high = mid - 1;
        }
    }

    let size = best.clamp(min_size, max_size);
    tracing::debug!(
        size,
        min_size,
        max_size,
        image_width = width,
        image_height = height,
        "Adaptive font size selected"
    );
    size
}
