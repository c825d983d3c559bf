//! Per-character text measurement.
//!
//! Widths and heights are measured one character at a time so that CJK and
//! Latin characters in the same string can use different faces. The height of
//! a character is the bottom of its rendered glyph box measured from the run's
//! top edge (glyphs are drawn top-anchored at the font ascent), not the nominal
//! font size; descenders and overshoot are therefore accounted for.
//!
//! Measurement never fails. Each character goes through three tiers:
//!
//! 1. exact outline bounding box
//! 2. advance width and nominal size for glyphs without an outline
//! 3. a fixed 10x10 box when the face yields unusable numbers

use super::fonts::{FontFace, FontHandle, ScaledFonts, Script};
use ab_glyph::{point, Font, FontArc, PxScale, ScaleFont};

/// Width and height used when a face cannot measure a character.
pub const FALLBACK_METRIC: f32 = 10.0;

/// Which measurement tier produced a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricTier {
    Exact,
    SizeAttribute,
    Fixed,
}

/// Measured size of one character.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharMetric {
    pub ch: char,
    pub script: Script,
    pub width: f32,
    pub height: f32,
    pub tier: MetricTier,
}

/// Single-line extent of a string.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextExtent {
    pub width: f32,
    pub height: f32,
}

impl TextExtent {
    /// Pixel bounding box, rounded up.
    pub fn to_pixels(self) -> (u32, u32) {
        (
            self.width.max(0.0).ceil() as u32,
            self.height.max(0.0).ceil() as u32,
        )
    }
}

/// Measure a character with the given handle.
pub fn measure(ch: char, font: &FontHandle) -> CharMetric {
    let script = Script::of(ch);
    let px = font.px();

    let measured = if px.is_finite() && px > 0.0 {
        match font.face() {
            FontFace::Outline(face) => measure_outline(face, ch, px),
            FontFace::Blocks { advance_ratio } => {
                let height = if ch.is_whitespace() { 0.0 } else { px };
                (px * advance_ratio, height, MetricTier::Exact)
            }
        }
    } else {
        (f32::NAN, f32::NAN, MetricTier::Fixed)
    };

    let (width, height, tier) = measured;
    if width.is_finite() && height.is_finite() && width >= 0.0 && height >= 0.0 {
        CharMetric {
            ch,
            script,
            width,
            height,
            tier,
        }
    } else {
        tracing::warn!(
            character = %ch.escape_debug(),
            px,
            "Cannot measure character, using default metric"
        );
        CharMetric {
            ch,
            script,
            width: FALLBACK_METRIC,
            height: FALLBACK_METRIC,
            tier: MetricTier::Fixed,
        }
    }
}

fn measure_outline(face: &FontArc, ch: char, px: f32) -> (f32, f32, MetricTier) {
    let scale = PxScale::from(px);
    let scaled = face.as_scaled(scale);
    let id = face.glyph_id(ch);
    let advance = scaled.h_advance(id);
    let glyph = id.with_scale_and_position(scale, point(0.0, scaled.ascent()));

    match face.outline_glyph(glyph) {
        Some(outlined) => {
            let bounds = outlined.px_bounds();
            let width = if advance > 0.0 {
                advance
            } else {
                bounds.max.x - bounds.min.x.min(0.0)
            };
            (width, bounds.max.y.max(0.0), MetricTier::Exact)
        }
        None if ch.is_whitespace() => (advance, 0.0, MetricTier::SizeAttribute),
        None => {
            let width = if advance > 0.0 { advance } else { px / 2.0 };
            (width, px, MetricTier::SizeAttribute)
        }
    }
}

/// Measure a character with the face for its script.
pub fn measure_char(ch: char, fonts: &ScaledFonts) -> CharMetric {
    measure(ch, fonts.for_char(ch))
}

/// Width of an inter-word space, measured with the English face.
pub fn space_width(fonts: &ScaledFonts) -> f32 {
    measure(' ', fonts.space()).width
}

/// Single-line extent: sum of character widths and the tallest character.
pub fn measure_str(text: &str, fonts: &ScaledFonts) -> TextExtent {
    text.chars()
        .map(|ch| measure_char(ch, fonts))
        .fold(TextExtent::default(), |acc, m| TextExtent {
            width: acc.width + m.width,
            height: acc.height.max(m.height),
        })
}
