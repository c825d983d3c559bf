//! Watermark configuration types.
//!
//! This module defines the user-facing watermark settings as they appear in
//! the configuration file, and the validated, immutable [`WatermarkSpec`]
//! that the layout engine consumes for a whole batch run.
//!
//! Settings files written by older releases stored every value as a string
//! (`font_size: "40"`, `multi_size: "1"`), so numeric and boolean keys accept
//! either form.

use super::WatermarkError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// Default values
fn default_text() -> String {
    "{exif_date}".to_string()
}

fn default_font_size() -> i64 {
    40
}

fn default_opacity() -> i64 {
    80
}

fn default_color() -> Color {
    Color::new(255, 255, 0)
}

fn default_contrast_height_factor() -> f32 {
    1.5
}

/// RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// White color.
    pub fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// Black color.
    pub fn black() -> Self {
        Self::new(0, 0, 0)
    }

    /// Color with an 8-bit alpha channel attached.
    pub fn with_alpha(self, alpha: u8) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, alpha])
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.r, self.g, self.b].serialize(serializer)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Channels(Vec<f64>),
    Hex(String),
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match ColorRepr::deserialize(deserializer)? {
            ColorRepr::Channels(channels) => {
                if channels.len() < 3 {
                    return Err(serde::de::Error::custom(format!(
                        "color needs 3 channels, got {}",
                        channels.len()
                    )));
                }
                let mut rgb = [0u8; 3];
                for (slot, value) in rgb.iter_mut().zip(&channels) {
                    if !value.is_finite() || !(0.0..=255.0).contains(value) {
                        return Err(serde::de::Error::custom(format!(
                            "color channel {} is outside 0..=255",
                            value
                        )));
                    }
                    *slot = *value as u8;
                }
                Ok(Color::new(rgb[0], rgb[1], rgb[2]))
            }
            ColorRepr::Hex(hex) => parse_hex_color(&hex).map_err(serde::de::Error::custom),
        }
    }
}

/// Parse a hex color string into RGB components.
///
/// Supports both #RGB and #RRGGBB formats.
///
/// # Examples
///
/// ```
/// use picmark::watermark::{parse_hex_color, Color};
///
/// assert_eq!(parse_hex_color("#FFF").unwrap(), Color::new(255, 255, 255));
/// assert_eq!(parse_hex_color("#FF0000").unwrap(), Color::new(255, 0, 0));
/// ```
pub fn parse_hex_color(hex: &str) -> Result<Color, WatermarkError> {
    let hex = hex
        .strip_prefix('#')
        .ok_or_else(|| WatermarkError::ConfigError("Color must start with '#'".to_string()))?;

    let digit = |s: &str| {
        u8::from_str_radix(s, 16)
            .map_err(|_| WatermarkError::ConfigError(format!("Invalid hex digit in '{}'", s)))
    };

    match hex.len() {
        3 => {
            // #RGB: each digit is doubled, 0xF -> 0xFF
            let r = digit(&hex[0..1])?;
            let g = digit(&hex[1..2])?;
            let b = digit(&hex[2..3])?;
            Ok(Color::new(r * 17, g * 17, b * 17))
        }
        6 => Ok(Color::new(
            digit(&hex[0..2])?,
            digit(&hex[2..4])?,
            digit(&hex[4..6])?,
        )),
        _ => Err(WatermarkError::ConfigError(format!(
            "Color must be #RGB or #RRGGBB format, got {} characters",
            hex.len()
        ))),
    }
}

/// Named watermark placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Anchor {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
}

impl Anchor {
    pub const ALL: [Anchor; 5] = [
        Anchor::TopLeft,
        Anchor::TopRight,
        Anchor::BottomLeft,
        Anchor::BottomRight,
        Anchor::Center,
    ];

    /// Parse a placement label.
    ///
    /// Accepts kebab-case, snake_case or spaced English names in any case, and
    /// the Chinese labels.
    pub fn parse(label: &str) -> Option<Anchor> {
        let normalized: String = label
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();

        match normalized.as_str() {
            "topleft" | "左上角" => Some(Anchor::TopLeft),
            "topright" | "右上角" => Some(Anchor::TopRight),
            "bottomleft" | "左下角" => Some(Anchor::BottomLeft),
            "bottomright" | "右下角" => Some(Anchor::BottomRight),
            "center" | "centre" | "中心" => Some(Anchor::Center),
            _ => None,
        }
    }

    /// Parse a placement label, falling back to `TopLeft` for unknown labels.
    pub fn from_label(label: &str) -> Anchor {
        Self::parse(label).unwrap_or_else(|| {
            tracing::warn!(
                position = %label,
                "Unknown watermark position, falling back to top-left"
            );
            Anchor::TopLeft
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
            Self::Center => "center",
        }
    }
}

impl std::fmt::Display for Anchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Anchor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Anchor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Anchor::from_label(&label))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntRepr {
    Int(i64),
    Text(String),
}

fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match IntRepr::deserialize(deserializer)? {
        IntRepr::Int(value) => Ok(value),
        IntRepr::Text(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| serde::de::Error::custom(format!("'{}' is not an integer", text))),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolRepr {
    Bool(bool),
    Int(i64),
    Text(String),
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match BoolRepr::deserialize(deserializer)? {
        BoolRepr::Bool(value) => Ok(value),
        BoolRepr::Int(0) => Ok(false),
        BoolRepr::Int(1) => Ok(true),
        BoolRepr::Int(other) => Err(serde::de::Error::custom(format!(
            "expected 0 or 1, got {}",
            other
        ))),
        BoolRepr::Text(text) => match text.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(serde::de::Error::custom(format!(
                "'{}' is not a boolean",
                text
            ))),
        },
    }
}

/// Watermark settings as read from the configuration file.
///
/// ```yaml
/// watermark:
///   text: "Shot on {exif_date}"
///   font_size: 40
///   opacity: 80
///   color: [255, 255, 0]
///   position: bottom-right
///   multi_size: true
///   high_contrast: false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkSettings {
    /// Watermark text, may contain `{exif_date}` (default: "{exif_date}")
    #[serde(default = "default_text")]
    pub text: String,

    /// Base font size in pixels (default: 40)
    #[serde(default = "default_font_size", deserialize_with = "lenient_int")]
    pub font_size: i64,

    /// Opacity percentage from 0 to 100 (default: 80)
    #[serde(default = "default_opacity", deserialize_with = "lenient_int")]
    pub opacity: i64,

    /// Fill color as [r, g, b] or hex string (default: yellow)
    #[serde(default = "default_color")]
    pub color: Color,

    /// Placement on the image (default: bottom-right)
    #[serde(default)]
    pub position: Anchor,

    /// Pick the font size from the image width instead of `font_size`
    #[serde(default, deserialize_with = "lenient_bool")]
    pub multi_size: bool,

    /// Pick black or white from the background instead of `color`
    #[serde(default, deserialize_with = "lenient_bool")]
    pub high_contrast: bool,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            text: default_text(),
            font_size: default_font_size(),
            opacity: default_opacity(),
            color: default_color(),
            position: Anchor::default(),
            multi_size: false,
            high_contrast: false,
        }
    }
}

impl WatermarkSettings {
    /// Validate the watermark settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err("Watermark 'text' field cannot be empty".to_string());
        }

        if self.font_size <= 0 || self.font_size > u32::MAX as i64 {
            return Err(format!(
                "Watermark font_size must be a positive integer, got {}",
                self.font_size
            ));
        }

        if !(0..=100).contains(&self.opacity) {
            return Err(format!(
                "Watermark opacity must be between 0 and 100, got {}",
                self.opacity
            ));
        }

        Ok(())
    }

    /// Validate and convert into the immutable spec used for a batch run.
    pub fn to_spec(&self) -> Result<WatermarkSpec, WatermarkError> {
        self.validate().map_err(WatermarkError::ConfigError)?;

        Ok(WatermarkSpec {
            text: self.text.trim().to_string(),
            base_font_size: self.font_size as u32,
            opacity_percent: self.opacity as u8,
            color: self.color,
            anchor: self.position,
            adaptive_size: self.multi_size,
            high_contrast: self.high_contrast,
        })
    }
}

/// Layout tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutSettings {
    /// Height multiplier for the region sampled in high-contrast mode,
    /// covering wrapped lines the single-line estimate misses (default: 1.5)
    #[serde(default = "default_contrast_height_factor")]
    pub contrast_height_factor: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            contrast_height_factor: default_contrast_height_factor(),
        }
    }
}

impl LayoutSettings {
    pub fn validate(&self) -> Result<(), String> {
        if !self.contrast_height_factor.is_finite() || self.contrast_height_factor <= 0.0 {
            return Err(format!(
                "layout.contrast_height_factor must be a positive finite number, got {}",
                self.contrast_height_factor
            ));
        }
        Ok(())
    }
}

/// Map an opacity percentage to an 8-bit alpha value.
///
/// Rounds half up: `round(opacity * 255 / 100)`, so 50% maps to 128.
pub fn opacity_to_alpha(opacity_percent: u8) -> u8 {
    let percent = opacity_percent.min(100) as u32;
    ((percent * 255 + 50) / 100).min(255) as u8
}

/// Immutable watermark parameters for one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatermarkSpec {
    pub text: String,
    pub base_font_size: u32,
    pub opacity_percent: u8,
    pub color: Color,
    pub anchor: Anchor,
    pub adaptive_size: bool,
    pub high_contrast: bool,
}

impl WatermarkSpec {
    /// Create a spec with the default style for the given text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            base_font_size: default_font_size() as u32,
            opacity_percent: default_opacity() as u8,
            color: default_color(),
            anchor: Anchor::default(),
            adaptive_size: false,
            high_contrast: false,
        }
    }

    pub fn with_font_size(mut self, size: u32) -> Self {
        self.base_font_size = size.max(1);
        self
    }

    pub fn with_opacity(mut self, percent: u8) -> Self {
        self.opacity_percent = percent.min(100);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_adaptive_size(mut self, enabled: bool) -> Self {
        self.adaptive_size = enabled;
        self
    }

    pub fn with_high_contrast(mut self, enabled: bool) -> Self {
        self.high_contrast = enabled;
        self
    }

    /// Alpha value derived from the opacity percentage.
    pub fn alpha(&self) -> u8 {
        opacity_to_alpha(self.opacity_percent)
    }
}
