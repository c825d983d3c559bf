//! Watermark error types.
//!
//! Defines errors that can occur while preparing or rendering a watermark.

use std::fmt;

/// Errors that can occur during watermark processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatermarkError {
    /// Failed to load or parse a font file
    FontError(String),

    /// Failed to render the text layer
    RenderError(String),

    /// Invalid watermark settings
    ConfigError(String),

    /// EXIF metadata could not be read
    ExifError(String),
}

impl fmt::Display for WatermarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FontError(msg) => write!(f, "Failed to load font: {}", msg),
            Self::RenderError(msg) => write!(f, "Failed to render text watermark: {}", msg),
            Self::ConfigError(msg) => write!(f, "Watermark configuration error: {}", msg),
            Self::ExifError(msg) => write!(f, "Failed to read EXIF metadata: {}", msg),
        }
    }
}

impl std::error::Error for WatermarkError {}
