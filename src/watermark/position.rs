//! Position calculation for watermark placement.
//!
//! The draw origin is computed from the anchor and the estimated single-line
//! text box, then clamped so the box stays inside the image whenever it fits.
//!
//! # Example
//!
//! ```
//! use picmark::watermark::position::{resolve, ImageDimensions, TextDimensions};
//! use picmark::watermark::Anchor;
//!
//! let image = ImageDimensions { width: 800, height: 600 };
//! let text = TextDimensions { width: 100, height: 50 };
//!
//! let pos = resolve(&image, &text, Anchor::BottomRight);
//! assert_eq!((pos.x, pos.y), (690, 540)); // 800 - 100 - 10, 600 - 50 - 10
//! ```

use super::Anchor;

/// Distance from the image edges for corner anchors.
pub const MARGIN: u32 = 10;

/// Dimensions of the target image.
#[derive(Debug, Clone, Copy)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Dimensions of the estimated text box.
#[derive(Debug, Clone, Copy)]
pub struct TextDimensions {
    pub width: u32,
    pub height: u32,
}

/// Top-left corner where the text is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Unclamped position for an anchor.
///
/// Coordinates may be negative if the text is larger than the image.
pub fn calculate_position(
    anchor: Anchor,
    image: &ImageDimensions,
    text: &TextDimensions,
    margin: u32,
) -> PlacementPosition {
    let img_w = image.width as i64;
    let img_h = image.height as i64;
    let txt_w = text.width as i64;
    let txt_h = text.height as i64;
    let m = margin as i64;

    let (x, y) = match anchor {
        Anchor::TopLeft => (m, m),
        Anchor::TopRight => (img_w - txt_w - m, m),
        Anchor::BottomLeft => (m, img_h - txt_h - m),
        Anchor::BottomRight => (img_w - txt_w - m, img_h - txt_h - m),
        Anchor::Center => ((img_w - txt_w) / 2, (img_h - txt_h) / 2),
    };

    PlacementPosition::new(saturate(x), saturate(y))
}

fn saturate(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Clamp a position to `[0, max(0, image - text)]` on both axes.
pub fn clamp_to_bounds(
    pos: PlacementPosition,
    image: &ImageDimensions,
    text: &TextDimensions,
) -> PlacementPosition {
    let max_x = saturate((image.width as i64 - text.width as i64).max(0));
    let max_y = saturate((image.height as i64 - text.height as i64).max(0));

    PlacementPosition::new(pos.x.clamp(0, max_x), pos.y.clamp(0, max_y))
}

/// Anchored and clamped draw origin with the default margin.
pub fn resolve(image: &ImageDimensions, text: &TextDimensions, anchor: Anchor) -> PlacementPosition {
    let pos = calculate_position(anchor, image, text, MARGIN);
    let clamped = clamp_to_bounds(pos, image, text);
    if clamped != pos {
        tracing::debug!(
            anchor = %anchor,
            x = pos.x,
            y = pos.y,
            clamped_x = clamped.x,
            clamped_y = clamped.y,
            "Watermark origin clamped to image bounds"
        );
    }
    clamped
}
