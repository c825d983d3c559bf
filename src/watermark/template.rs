//! Placeholder substitution for watermark text.
//!
//! The only placeholder is `{exif_date}`, replaced with the capture time of
//! the image (`YYYY-MM-DD HH:MM:SS`) or `N/A` when the image has none. Any
//! other braces are left as written.
//!
//! # Example
//!
//! ```
//! use picmark::watermark::template::{resolve_placeholders, TemplateContext};
//!
//! let context = TemplateContext::new().with_capture_date("2024-05-01 12:30:00");
//! assert_eq!(
//!     resolve_placeholders("Shot {exif_date} {other}", &context),
//!     "Shot 2024-05-01 12:30:00 {other}"
//! );
//! ```

/// Capture time placeholder.
pub const EXIF_DATE: &str = "{exif_date}";

/// Substitute used when the capture time is unknown.
pub const UNKNOWN_DATE: &str = "N/A";

/// Per-image values available to placeholders.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    capture_date: Option<String>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the formatted capture time.
    pub fn with_capture_date(mut self, date: impl Into<String>) -> Self {
        self.capture_date = Some(date.into());
        self
    }

    pub fn capture_date(&self) -> Option<&str> {
        self.capture_date.as_deref()
    }
}

/// Returns true if the text needs per-image values.
pub fn has_placeholders(text: &str) -> bool {
    text.contains(EXIF_DATE)
}

/// Replace every placeholder in `text`.
pub fn resolve_placeholders(text: &str, context: &TemplateContext) -> String {
    if !has_placeholders(text) {
        return text.to_string();
    }
    text.replace(EXIF_DATE, context.capture_date().unwrap_or(UNKNOWN_DATE))
}
