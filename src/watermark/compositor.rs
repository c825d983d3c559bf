//! Watermark compositor.
//!
//! Ties the layout pieces together for one image: pick the font size, place
//! the text, pick the color, wrap, draw onto a transparent layer and blend the
//! layer over the source.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use image::{Rgba, RgbaImage};
//! use picmark::watermark::{Anchor, FontSet, LayoutSettings, WatermarkCompositor, WatermarkSpec};
//!
//! let compositor = WatermarkCompositor::new(Arc::new(FontSet::fallback()), LayoutSettings::default());
//! let spec = WatermarkSpec::new("© Studio").with_anchor(Anchor::TopLeft);
//!
//! let source = RgbaImage::from_pixel(320, 200, Rgba([30, 30, 30, 255]));
//! let rendered = compositor.apply(&source, "© Studio", &spec).unwrap();
//! assert_eq!(rendered.placement.origin.x, 10);
//! ```

use super::contrast::{contrast_region, pick_contrast_color, pick_for_region};
use super::fonts::FontSet;
use super::line_breaker::{layout, TextLayout};
use super::position::{resolve, ImageDimensions, PlacementPosition, TextDimensions};
use super::sizer::adaptive_font_size;
use super::source::SourceImage;
use super::template::{resolve_placeholders, TemplateContext};
use super::text_metrics::measure_str;
use super::text_renderer::{render_layer, TextStyle};
use super::{Color, LayoutSettings, WatermarkError, WatermarkSpec};
use image::{Rgba, RgbaImage};
use std::sync::Arc;

/// Where and how the text ended up on an image.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Text after placeholder substitution
    pub text: String,
    pub font_size: u32,
    /// Top-left corner of the first line
    pub origin: PlacementPosition,
    /// Single-line text box used for positioning
    pub estimate: (u32, u32),
    /// Pixels the origin was moved up so wrapped lines stay inside the image
    pub lifted_by: u32,
    pub color: Color,
    pub alpha: u8,
    pub line_count: usize,
    /// Laid-out text box: widest line and total height
    pub bbox: (u32, u32),
}

/// A watermarked image.
#[derive(Debug, Clone)]
pub struct RenderedWatermark {
    pub image: RgbaImage,
    pub placement: Placement,
}

/// Applies a [`WatermarkSpec`] to images, sharing one [`FontSet`].
#[derive(Debug, Clone)]
pub struct WatermarkCompositor {
    fonts: Arc<FontSet>,
    layout: LayoutSettings,
}

impl WatermarkCompositor {
    pub fn new(fonts: Arc<FontSet>, layout: LayoutSettings) -> Self {
        Self { fonts, layout }
    }

    pub fn fonts(&self) -> &FontSet {
        &self.fonts
    }

    /// Watermark a decoded source, resolving placeholders from its metadata.
    pub fn render(
        &self,
        source: &SourceImage,
        spec: &WatermarkSpec,
    ) -> Result<RenderedWatermark, WatermarkError> {
        let mut context = TemplateContext::new();
        if let Some(date) = &source.record.capture_date {
            context = context.with_capture_date(date.clone());
        }
        let text = resolve_placeholders(&spec.text, &context);
        self.apply(&source.image.to_rgba8(), &text, spec)
    }

    /// Watermark `image` with already-resolved `text`.
    pub fn apply(
        &self,
        image: &RgbaImage,
        text: &str,
        spec: &WatermarkSpec,
    ) -> Result<RenderedWatermark, WatermarkError> {
        let (img_w, img_h) = image.dimensions();
        if img_w == 0 || img_h == 0 {
            return Err(WatermarkError::RenderError(format!(
                "image has no pixels ({}x{})",
                img_w, img_h
            )));
        }

        let font_size = if spec.adaptive_size {
            adaptive_font_size(text, spec.base_font_size, (img_w, img_h), &self.fonts)
        } else {
            spec.base_font_size
        };
        let fonts = self.fonts.at_size(font_size as f32);

        let estimate = measure_str(text, &fonts).to_pixels();
        let anchored = resolve(
            &ImageDimensions {
                width: img_w,
                height: img_h,
            },
            &TextDimensions {
                width: estimate.0,
                height: estimate.1,
            },
            spec.anchor,
        );

        let color = if spec.high_contrast {
            self.contrast_color(image, anchored, estimate)
        } else {
            spec.color
        };

        let budget = (img_w as i64 - anchored.x as i64).max(0) as f32;
        let mut laid_out = layout(text, &fonts, budget, anchored.x as f32, anchored.y as f32);

        let bottom = anchored.y as f32 + laid_out.total_height;
        let overflow = (bottom - img_h as f32).ceil().max(0.0) as i64;
        let lifted_by = overflow.min(anchored.y as i64).max(0) as i32;
        let origin = PlacementPosition::new(anchored.x, anchored.y - lifted_by);
        if lifted_by > 0 {
            tracing::debug!(lifted_by, "Wrapped text overflows the bottom edge, moving it up");
            laid_out = layout(text, &fonts, budget, origin.x as f32, origin.y as f32);
        }

        let style = TextStyle::new(color, spec.alpha());
        let layer = render_layer((img_w, img_h), &laid_out, &fonts, style);
        let mut output = image.clone();
        blend_layer(&mut output, &layer, PlacementPosition::new(0, 0));

        let placement = Placement {
            text: text.to_string(),
            font_size,
            origin,
            estimate,
            lifted_by: lifted_by as u32,
            color,
            alpha: style.alpha,
            line_count: laid_out.line_count,
            bbox: layout_bbox(&laid_out),
        };
        tracing::debug!(
            font_size,
            x = origin.x,
            y = origin.y,
            lines = placement.line_count,
            color = ?color,
            "Watermark placed"
        );

        Ok(RenderedWatermark {
            image: output,
            placement,
        })
    }

    fn contrast_color(
        &self,
        image: &RgbaImage,
        origin: PlacementPosition,
        estimate: (u32, u32),
    ) -> Color {
        match contrast_region(
            image.dimensions(),
            (origin.x, origin.y),
            estimate,
            self.layout.contrast_height_factor,
        ) {
            Some(region) => pick_for_region(image, region),
            None => pick_contrast_color(&RgbaImage::new(0, 0)),
        }
    }
}

fn layout_bbox(laid_out: &TextLayout) -> (u32, u32) {
    (
        laid_out.max_line_width.max(0.0).ceil() as u32,
        laid_out.total_height.max(0.0).ceil() as u32,
    )
}

/// Blend `layer` onto `target` with its top-left corner at `position`.
///
/// Parts of the layer outside the target are clipped.
pub fn blend_layer(target: &mut RgbaImage, layer: &RgbaImage, position: PlacementPosition) {
    let target_width = target.width() as i64;
    let target_height = target.height() as i64;
    let (px, py) = (position.x as i64, position.y as i64);

    let x_start = px.max(0);
    let y_start = py.max(0);
    let x_end = (px + layer.width() as i64).min(target_width);
    let y_end = (py + layer.height() as i64).min(target_height);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let wm_pixel = layer.get_pixel((tx - px) as u32, (ty - py) as u32);
            if wm_pixel[3] == 0 {
                continue;
            }
            let target_pixel = target.get_pixel(tx as u32, ty as u32);
            let blended = blend_pixels(*target_pixel, *wm_pixel);
            target.put_pixel(tx as u32, ty as u32, blended);
        }
    }
}

/// Porter-Duff "over": result = foreground + background * (1 - foreground.alpha)
pub fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;

    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watermark::sizer::size_bounds;
    use crate::watermark::Anchor;
    use image::{DynamicImage, RgbImage};
    use rstest::rstest;
    use std::path::Path;

    fn compositor() -> WatermarkCompositor {
        WatermarkCompositor::new(Arc::new(FontSet::fallback()), LayoutSettings::default())
    }

    fn solid(w: u32, h: u32, v: u8) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([v, v, v, 255]))
    }

    fn spec(text: &str) -> WatermarkSpec {
        WatermarkSpec::new(text)
            .with_font_size(20)
            .with_color(Color::white())
            .with_anchor(Anchor::TopLeft)
    }

    #[test]
    fn test_blend_pixels_half_alpha_over_black() {
        let result = blend_pixels(Rgba([0, 0, 0, 255]), Rgba([255, 255, 255, 128]));
        assert_eq!(result, Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn test_blend_pixels_transparent_foreground() {
        let bg = Rgba([10, 20, 30, 255]);
        assert_eq!(blend_pixels(bg, Rgba([255, 255, 255, 0])), bg);
    }

    #[test]
    fn test_blend_layer_clips_to_target() {
        let mut target = solid(10, 10, 0);
        let layer = RgbaImage::from_pixel(6, 6, Rgba([255, 0, 0, 255]));
        blend_layer(&mut target, &layer, PlacementPosition::new(7, -3));
        assert_eq!(target.get_pixel(9, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(target.get_pixel(6, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(target.get_pixel(9, 3), &Rgba([0, 0, 0, 255]));
    }

    // Block glyph for 'A' at (10, 10), 20px: stroke pixels start at (11, 11)
    #[rstest]
    #[case(0, 0)]
    #[case(50, 128)]
    #[case(100, 255)]
    fn test_opacity_maps_to_pixel_value(#[case] opacity: u8, #[case] expected: u8) {
        let source = solid(300, 100, 0);
        let rendered = compositor()
            .apply(&source, "AB", &spec("AB").with_opacity(opacity))
            .unwrap();

        assert_eq!(rendered.placement.alpha, expected);
        assert_eq!(rendered.image.get_pixel(11, 11)[0], expected);
        assert_eq!(rendered.image.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_placement_for_fixed_size() {
        let rendered = compositor()
            .apply(&solid(400, 300, 0), "Hello", &spec("Hello").with_anchor(Anchor::BottomRight))
            .unwrap();
        let p = rendered.placement;
        assert_eq!(p.font_size, 20);
        assert_eq!(p.estimate, (50, 20));
        assert_eq!(p.origin, PlacementPosition::new(340, 270));
        assert_eq!(p.line_count, 1);
        assert_eq!(p.bbox, (50, 20));
        assert_eq!(p.lifted_by, 0);
    }

    #[test]
    fn test_adaptive_size_within_bounds() {
        let spec = spec("Adaptive").with_adaptive_size(true);
        let rendered = compositor().apply(&solid(1000, 800, 0), "Adaptive", &spec).unwrap();
        let (min, max) = size_bounds(1000, 800);
        let size = rendered.placement.font_size;
        assert!(size >= min && size <= max);
        assert_ne!(size, 20);
    }

    #[rstest]
    #[case(10, Color::white())]
    #[case(240, Color::black())]
    fn test_high_contrast_color(#[case] background: u8, #[case] expected: Color) {
        let spec = spec("contrast")
            .with_color(Color::new(255, 0, 0))
            .with_high_contrast(true);
        let rendered = compositor()
            .apply(&solid(300, 100, background), "contrast", &spec)
            .unwrap();
        assert_eq!(rendered.placement.color, expected);
    }

    #[test]
    fn test_empty_contrast_region_picks_black() {
        // Whitespace has no height, so there is nothing to sample
        let spec = spec("   ")
            .with_color(Color::new(255, 0, 0))
            .with_high_contrast(true);
        let rendered = compositor().apply(&solid(300, 100, 10), "   ", &spec).unwrap();
        assert_eq!(rendered.placement.estimate.1, 0);
        assert_eq!(rendered.placement.color, Color::black());
    }

    #[test]
    fn test_wrapped_text_lifted_inside_image() {
        // 19 chars * 10 = 190 wide estimate on a 100px image: clamped to x = 0,
        // y = 60 - 20 - 10 = 30; two wrapped lines need 40px
        let spec = spec("word word word word").with_anchor(Anchor::BottomLeft);
        let rendered = compositor()
            .apply(&solid(100, 60, 0), "word word word word", &spec)
            .unwrap();
        let p = rendered.placement;
        assert_eq!(p.line_count, 2);
        assert_eq!(p.lifted_by, 10);
        assert_eq!(p.origin, PlacementPosition::new(0, 20));
        assert!(p.origin.y as u32 + p.bbox.1 <= 60);
    }

    #[test]
    fn test_lift_never_goes_above_top() {
        let spec = spec("one two three four five six").with_anchor(Anchor::TopLeft);
        let rendered = compositor()
            .apply(&solid(60, 30, 0), "one two three four five six", &spec)
            .unwrap();
        // Three lines of 20px from y = 10 would need 70px; lifting stops at the top
        assert_eq!(rendered.placement.line_count, 3);
        assert_eq!(rendered.placement.lifted_by, 10);
        assert_eq!(rendered.placement.origin.y, 0);
    }

    #[test]
    fn test_empty_image_is_render_error() {
        let result = compositor().apply(&RgbaImage::new(0, 10), "x", &spec("x"));
        assert!(matches!(result, Err(WatermarkError::RenderError(_))));
    }

    #[test]
    fn test_render_resolves_missing_date_to_na() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 80, image::Rgb([0, 0, 0])));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
        let source = SourceImage::from_bytes(Path::new("a.png"), bytes.get_ref()).unwrap();

        let rendered = compositor()
            .render(&source, &spec("Date: {exif_date}"))
            .unwrap();
        assert_eq!(rendered.placement.text, "Date: N/A");
    }

    #[test]
    fn test_render_uses_capture_date() {
        let bytes = crate::watermark::source::tests::jpeg_with_exif(
            &RgbImage::new(400, 100),
            &[exif::Field {
                tag: exif::Tag::DateTimeOriginal,
                ifd_num: exif::In::PRIMARY,
                value: exif::Value::Ascii(vec![b"2022:02:22 22:22:22".to_vec()]),
            }],
        );
        let source = SourceImage::from_bytes(Path::new("a.jpg"), &bytes).unwrap();
        let rendered = compositor().render(&source, &spec("{exif_date}")).unwrap();
        assert_eq!(rendered.placement.text, "2022-02-22 22:22:22");
    }
}
