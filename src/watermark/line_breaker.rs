//! Greedy word wrapping for watermark text.
//!
//! Text is split on ASCII spaces. Words are packed onto a line while they fit
//! in the width budget; a word that does not fit starts a new line, and a word
//! wider than the whole budget is broken between characters. Line height is the
//! tallest character on the line, so mixed CJK/Latin lines advance by the
//! tallest glyph actually placed.
//!
//! Every character of the input ends up in exactly one [`Run`]. The separator
//! in front of a word that opens a wrapped line becomes a zero-width
//! [`RunKind::WrapSpace`] that is never drawn, so concatenating the run texts
//! gives back the input string.
//!
//! # Example
//!
//! ```
//! use picmark::watermark::{layout, FontSet};
//!
//! let fonts = FontSet::fallback().at_size(10.0);
//! let laid_out = layout("hello world", &fonts, 40.0, 0.0, 0.0);
//! assert_eq!(laid_out.line_count, 2);
//! assert_eq!(laid_out.text(), "hello world");
//! ```

use super::fonts::{ScaledFonts, Script};
use super::text_metrics::{measure_char, space_width, CharMetric};

/// What a run represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    /// Character of a word that fit on its line
    Char,
    /// Inter-word space inside a line
    Space,
    /// Separator consumed by a line wrap; zero width, not drawn
    WrapSpace,
    /// Character of a word broken across lines
    ForcedChar,
}

/// A positioned piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub kind: RunKind,
    pub script: Script,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Run {
    /// Whether the renderer should draw this run.
    pub fn is_drawn(&self) -> bool {
        self.kind != RunKind::WrapSpace
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Result of laying out a string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLayout {
    pub runs: Vec<Run>,
    /// Sum of all line heights
    pub total_height: f32,
    /// Width of the widest line
    pub max_line_width: f32,
    pub line_count: usize,
}

impl TextLayout {
    /// Concatenated run texts.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Runs the renderer should draw.
    pub fn drawn_runs(&self) -> impl Iterator<Item = &Run> {
        self.runs.iter().filter(|r| r.is_drawn())
    }
}

struct Piece {
    text: String,
    kind: RunKind,
    script: Script,
    width: f32,
    height: f32,
}

impl Piece {
    fn from_metric(metric: &CharMetric, kind: RunKind) -> Self {
        Self {
            text: metric.ch.to_string(),
            kind,
            script: metric.script,
            width: metric.width,
            height: metric.height,
        }
    }
}

struct Breaker {
    origin_x: f32,
    cursor_y: f32,
    max_width: f32,
    line: Vec<Piece>,
    line_width: f32,
    line_has_word: bool,
    runs: Vec<Run>,
    max_line_width: f32,
    line_count: usize,
}

impl Breaker {
    fn flush(&mut self) {
        if self.line.is_empty() && !self.line_has_word {
            return;
        }
        let mut x = self.origin_x;
        let mut height: f32 = 0.0;
        for piece in self.line.drain(..) {
            height = height.max(piece.height);
            let width = piece.width;
            self.runs.push(Run {
                text: piece.text,
                kind: piece.kind,
                script: piece.script,
                x,
                y: self.cursor_y,
                width,
                height: piece.height,
            });
            x += width;
        }
        self.max_line_width = self.max_line_width.max(self.line_width);
        self.cursor_y += height;
        self.line_count += 1;
        self.line_width = 0.0;
        self.line_has_word = false;
    }

    fn push_wrap_space(&mut self, x: f32) {
        self.runs.push(Run {
            text: " ".to_string(),
            kind: RunKind::WrapSpace,
            script: Script::Other,
            x,
            y: self.cursor_y,
            width: 0.0,
            height: 0.0,
        });
    }

    /// Break a word wider than the budget between characters.
    fn force_break(&mut self, metrics: &[CharMetric]) {
        let limit = self.origin_x + self.max_width;
        let mut x = self.origin_x;
        let mut line_height: f32 = 0.0;
        let mut line_width: f32 = 0.0;

        for metric in metrics {
            if x > self.origin_x && x + metric.width > limit {
                self.cursor_y += if line_height > 0.0 {
                    line_height
                } else {
                    metric.height
                };
                self.max_line_width = self.max_line_width.max(line_width);
                self.line_count += 1;
                x = self.origin_x;
                line_height = 0.0;
                line_width = 0.0;
            }
            let piece = Piece::from_metric(metric, RunKind::ForcedChar);
            self.runs.push(Run {
                text: piece.text,
                kind: piece.kind,
                script: piece.script,
                x,
                y: self.cursor_y,
                width: piece.width,
                height: piece.height,
            });
            x += metric.width;
            line_width += metric.width;
            line_height = line_height.max(metric.height);
        }

        self.cursor_y += line_height;
        self.max_line_width = self.max_line_width.max(line_width);
        self.line_count += 1;
    }
}

/// Lay out `text` starting at `(origin_x, origin_y)` within `max_width`.
///
/// A non-finite or negative budget is treated as zero, which puts one
/// character on each line.
pub fn layout(
    text: &str,
    fonts: &ScaledFonts,
    max_width: f32,
    origin_x: f32,
    origin_y: f32,
) -> TextLayout {
    if text.is_empty() {
        return TextLayout::default();
    }

    let max_width = if max_width.is_finite() && max_width > 0.0 {
        max_width
    } else {
        0.0
    };
    let space = space_width(fonts);
    let space_height = measure_char(' ', fonts).height;

    let mut breaker = Breaker {
        origin_x,
        cursor_y: origin_y,
        max_width,
        line: Vec::new(),
        line_width: 0.0,
        line_has_word: false,
        runs: Vec::new(),
        max_line_width: 0.0,
        line_count: 0,
    };

    for (index, word) in text.split(' ').enumerate() {
        let metrics: Vec<CharMetric> = word.chars().map(|ch| measure_char(ch, fonts)).collect();
        let word_width: f32 = metrics.iter().map(|m| m.width).sum();
        let needs_separator = index > 0;

        loop {
            let separator = if breaker.line_has_word { space } else { 0.0 };
            if breaker.line_width + separator + word_width <= max_width {
                if needs_separator {
                    if breaker.line_has_word {
                        breaker.line.push(Piece {
                            text: " ".to_string(),
                            kind: RunKind::Space,
                            script: Script::Other,
                            width: space,
                            height: space_height,
                        });
                        breaker.line_width += space;
                    } else {
                        let x = breaker.origin_x;
                        breaker.push_wrap_space(x);
                    }
                }
                breaker
                    .line
                    .extend(metrics.iter().map(|m| Piece::from_metric(m, RunKind::Char)));
                breaker.line_width += word_width;
                breaker.line_has_word = true;
                break;
            }

            if breaker.line_has_word {
                breaker.flush();
                continue;
            }

            tracing::debug!(
                word_width,
                max_width,
                chars = metrics.len(),
                "Word wider than the line, breaking between characters"
            );
            if needs_separator {
                let x = breaker.origin_x;
                breaker.push_wrap_space(x);
            }
            breaker.force_break(&metrics);
            break;
        }
    }
    breaker.flush();

    TextLayout {
        total_height: breaker.cursor_y - origin_y,
        max_line_width: breaker.max_line_width,
        line_count: breaker.line_count,
        runs: breaker.runs,
    }
}
