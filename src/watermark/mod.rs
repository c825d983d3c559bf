//! Text watermark layout engine.
//!
//! Computes where and how a line of watermark text goes on an image, then
//! draws it. The text may mix CJK and Latin characters, and each script is
//! drawn with its own face.
//!
//! # Pipeline
//!
//! 1. [`source`]: decode, apply the EXIF orientation, read the capture date
//! 2. [`template`]: substitute `{exif_date}`
//! 3. [`sizer`]: optional adaptive font size from the image width
//! 4. [`text_metrics`]: single-line estimate of the text box
//! 5. [`position`]: anchor the estimate inside the image
//! 6. [`contrast`]: optional black/white pick from the background
//! 7. [`line_breaker`]: greedy word wrap within the remaining width
//! 8. [`text_renderer`] and [`compositor`]: draw and blend
//!
//! # Configuration Example
//!
//! ```yaml
//! watermark:
//!   text: "© Studio {exif_date}"
//!   font_size: 40
//!   opacity: 80
//!   color: [255, 255, 0]
//!   position: bottom-right
//!   multi_size: true
//!   high_contrast: false
//! ```

pub mod compositor;
pub mod config;
pub mod contrast;
pub mod error;
pub mod fonts;
pub mod line_breaker;
pub mod position;
pub mod sizer;
pub mod source;
pub mod template;
pub mod text_metrics;
pub mod text_renderer;

// Re-export main types for convenience
pub use compositor::{blend_layer, blend_pixels, Placement, RenderedWatermark, WatermarkCompositor};
pub use config::{
    opacity_to_alpha, parse_hex_color, Anchor, Color, LayoutSettings, WatermarkSettings,
    WatermarkSpec,
};
pub use contrast::{contrast_region, pick_contrast_color, Region};
pub use error::WatermarkError;
pub use fonts::{FontConfig, FontFace, FontHandle, FontSet, ScaledFonts, Script};
pub use line_breaker::{layout, Run, RunKind, TextLayout};
pub use position::{clamp_to_bounds, resolve, PlacementPosition};
pub use sizer::{adaptive_font_size, size_bounds};
pub use source::{apply_orientation, ImageRecord, SourceImage};
pub use template::{resolve_placeholders, TemplateContext};
pub use text_metrics::{measure, measure_char, measure_str, CharMetric, MetricTier, TextExtent};
pub use text_renderer::TextStyle;
