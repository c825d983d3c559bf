//! Background-adaptive text color.
//!
//! In high-contrast mode the text color is black or white, chosen from the
//! average luminance of the area the text will cover.

use super::Color;
use image::RgbaImage;

/// Luminance threshold on the 0-255 scale; darker backgrounds get white text.
pub const LUMINANCE_THRESHOLD: u64 = 128;

/// A rectangle inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Sampled area for a text estimate at `origin`.
///
/// The height is inflated by `height_factor` to cover wrapped lines, then the
/// rectangle is clamped to the image. Returns `None` when nothing is left.
pub fn contrast_region(
    image_size: (u32, u32),
    origin: (i32, i32),
    estimate: (u32, u32),
    height_factor: f32,
) -> Option<Region> {
    let (img_w, img_h) = (image_size.0 as i64, image_size.1 as i64);
    let factor = if height_factor.is_finite() && height_factor > 0.0 {
        height_factor as f64
    } else {
        1.0
    };

    let left = (origin.0 as i64).clamp(0, img_w);
    let top = (origin.1 as i64).clamp(0, img_h);
    let right = (origin.0 as i64 + estimate.0 as i64).clamp(0, img_w);
    let inflated = (estimate.1 as f64 * factor).ceil() as i64;
    let bottom = (origin.1 as i64 + inflated).clamp(0, img_h);

    if right <= left || bottom <= top {
        return None;
    }

    Some(Region {
        x: left as u32,
        y: top as u32,
        width: (right - left) as u32,
        height: (bottom - top) as u32,
    })
}

/// Black or white, whichever contrasts with the mean color of `region`.
///
/// Alpha is ignored. An empty region yields black.
pub fn pick_contrast_color(region: &RgbaImage) -> Color {
    let count = region.width() as u64 * region.height() as u64;
    if count == 0 {
        tracing::warn!("Contrast region is empty, using black");
        return Color::black();
    }

    let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
    for pixel in region.pixels() {
        r += pixel[0] as u64;
        g += pixel[1] as u64;
        b += pixel[2] as u64;
    }

    // 0.299 R + 0.587 G + 0.114 B < 128, scaled by 1000 * count
    let weighted = 299 * r + 587 * g + 114 * b;
    let color = if weighted < LUMINANCE_THRESHOLD * 1000 * count {
        Color::white()
    } else {
        Color::black()
    };

    tracing::debug!(
        luminance = weighted as f64 / (1000.0 * count as f64),
        color = ?color,
        "Picked contrast color"
    );
    color
}

/// Contrast color for `region` of `image`.
pub fn pick_for_region(image: &RgbaImage, region: Region) -> Color {
    let view = image::imageops::crop_imm(image, region.x, region.y, region.width, region.height);
    pick_contrast_color(&view.to_image())
}
