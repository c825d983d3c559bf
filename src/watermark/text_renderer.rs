//! Text watermark rendering.
//!
//! Draws laid-out runs onto a transparent RGBA layer. Every pixel of the layer
//! carries the fill color; glyph coverage scales the watermark alpha, and
//! where glyphs overlap the stronger coverage wins, so the layer never gets
//! more opaque than the configured opacity.
//!
//! # Example
//!
//! ```
//! use picmark::watermark::text_renderer::{render_layer, TextStyle};
//! use picmark::watermark::{layout, Color, FontSet};
//!
//! let fonts = FontSet::fallback().at_size(16.0);
//! let laid_out = layout("Hi", &fonts, 200.0, 4.0, 4.0);
//! let style = TextStyle::new(Color::white(), 204);
//!
//! let layer = render_layer((64, 32), &laid_out, &fonts, style);
//! assert_eq!(layer.dimensions(), (64, 32));
//! ```

use super::fonts::{FontFace, FontHandle, ScaledFonts};
use super::line_breaker::{Run, TextLayout};
use super::Color;
use ab_glyph::{point, Font, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};

/// Fill color and peak alpha of the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    pub color: Color,
    pub alpha: u8,
}

impl TextStyle {
    pub fn new(color: Color, alpha: u8) -> Self {
        Self { color, alpha }
    }
}

/// Render all drawable runs onto a new transparent layer of `size`.
pub fn render_layer(
    size: (u32, u32),
    layout: &TextLayout,
    fonts: &ScaledFonts,
    style: TextStyle,
) -> RgbaImage {
    let mut layer = RgbaImage::new(size.0, size.1);
    draw_runs(&mut layer, layout, fonts, style);
    layer
}

/// Draw every run that should be visible.
pub fn draw_runs(layer: &mut RgbaImage, layout: &TextLayout, fonts: &ScaledFonts, style: TextStyle) {
    if style.alpha == 0 {
        return;
    }
    for run in layout.drawn_runs() {
        for ch in run.text.chars().filter(|c| !c.is_whitespace()) {
            draw_char(layer, ch, fonts.for_char(ch), run, style);
        }
    }
}

fn draw_char(layer: &mut RgbaImage, ch: char, font: &FontHandle, run: &Run, style: TextStyle) {
    match font.face() {
        FontFace::Outline(face) => {
            let scale = PxScale::from(font.px());
            let scaled = face.as_scaled(scale);
            let glyph = face
                .glyph_id(ch)
                .with_scale_and_position(scale, point(run.x, run.y + scaled.ascent()));

            if let Some(outlined) = face.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|px, py, coverage| {
                    let x = px as i64 + bounds.min.x as i64;
                    let y = py as i64 + bounds.min.y as i64;
                    plot(layer, x, y, coverage, style);
                });
            }
        }
        FontFace::Blocks { .. } => draw_block(layer, run, font.px(), style),
    }
}

/// Hollow rectangle filling the run box, inset by one pixel.
fn draw_block(layer: &mut RgbaImage, run: &Run, px: f32, style: TextStyle) {
    let stroke = ((px / 10.0).floor() as i64).max(1);
    let left = run.x.floor() as i64 + 1;
    let top = run.y.floor() as i64 + 1;
    let right = (run.x + run.width).floor() as i64 - 1;
    let bottom = (run.y + run.height).floor() as i64 - 1;
    if right <= left || bottom <= top {
        return;
    }

    // Only the part of the box inside the layer is visited
    let (layer_w, layer_h) = (layer.width() as i64, layer.height() as i64);
    let (x_start, x_end) = (left.max(0), right.min(layer_w));
    let (y_start, y_end) = (top.max(0), bottom.min(layer_h));

    for y in y_start..y_end {
        for x in x_start..x_end {
            let edge = x < left + stroke
                || x >= right - stroke
                || y < top + stroke
                || y >= bottom - stroke;
            if edge {
                plot(layer, x, y, 1.0, style);
            }
        }
    }
}

fn plot(layer: &mut RgbaImage, x: i64, y: i64, coverage: f32, style: TextStyle) {
    if x < 0 || y < 0 || x >= layer.width() as i64 || y >= layer.height() as i64 {
        return;
    }
    let alpha = (coverage.clamp(0.0, 1.0) * style.alpha as f32).round() as u8;
    if alpha == 0 {
        return;
    }
    let pixel = layer.get_pixel_mut(x as u32, y as u32);
    if alpha > pixel[3] {
        *pixel = style.color.with_alpha(alpha);
    }
}

/// Number of pixels with non-zero alpha.
pub fn painted_pixels(layer: &RgbaImage) -> usize {
    layer.pixels().filter(|p: &&Rgba<u8>| p[3] > 0).count()
}
