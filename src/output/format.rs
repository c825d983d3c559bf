//! Output format selection
//!
//! Each image is written back in its source format where the encoders can
//! reproduce it. GIF (animation would be lost) and formats without an encoder
//! are written as PNG instead, with the file extension changed to match.

use image::ImageFormat;
use std::path::{Path, PathBuf};

/// Formats the watermarked images are written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Bmp,
}

impl OutputFormat {
    /// Lowercase format name for logs and messages
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
            OutputFormat::Bmp => "bmp",
        }
    }

    /// Default file extension
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
            OutputFormat::Bmp => "bmp",
        }
    }
}

/// Why an image is not written in its source format
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Substitution {
    /// GIF sources are written as a single PNG frame
    GifAsPng,
    /// No encoder for the source format
    UnsupportedAsPng { source: String },
}

impl std::fmt::Display for Substitution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Substitution::GifAsPng => write!(f, "GIF saved as a static PNG, animation is not kept"),
            Substitution::UnsupportedAsPng { source } => {
                write!(f, "{} cannot be written back, saved as PNG", source)
            }
        }
    }
}

/// Output format for one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPlan {
    pub format: OutputFormat,
    pub substitution: Option<Substitution>,
}

impl OutputPlan {
    fn keep(format: OutputFormat) -> Self {
        Self {
            format,
            substitution: None,
        }
    }

    fn png_instead(substitution: Substitution) -> Self {
        Self {
            format: OutputFormat::Png,
            substitution: Some(substitution),
        }
    }

    /// Choose the output for a decoded source format.
    pub fn for_source(source: Option<ImageFormat>) -> Self {
        match source {
            Some(ImageFormat::Jpeg) => Self::keep(OutputFormat::Jpeg),
            Some(ImageFormat::Png) => Self::keep(OutputFormat::Png),
            Some(ImageFormat::WebP) => Self::keep(OutputFormat::WebP),
            Some(ImageFormat::Bmp) => Self::keep(OutputFormat::Bmp),
            Some(ImageFormat::Gif) => Self::png_instead(Substitution::GifAsPng),
            Some(other) => Self::png_instead(Substitution::UnsupportedAsPng {
                source: format!("{:?}", other),
            }),
            None => Self::png_instead(Substitution::UnsupportedAsPng {
                source: "Unknown format".to_string(),
            }),
        }
    }

    /// Output path under `output_dir` with the same base name as `source`.
    ///
    /// The source extension is kept as written unless the format changed.
    pub fn output_path(&self, output_dir: &Path, source: &Path) -> PathBuf {
        let file_name = source
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("image"));
        let mut path = output_dir.join(file_name);
        let keep_extension = self.substitution.is_none() && source.extension().is_some();
        if !keep_extension {
            path.set_extension(self.format.extension());
        }
        path
    }

    /// Replacement for `output_path` when that path is taken.
    ///
    /// Substituted outputs are tagged with the source extension first
    /// (`a.gif` becomes `a_gif.png`); later attempts add a counter.
    pub fn alternate_path(&self, output_dir: &Path, source: &Path, attempt: u32) -> PathBuf {
        let planned = self.output_path(output_dir, source);
        let stem = planned
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let tag = match (&self.substitution, source.extension()) {
            (Some(_), Some(ext)) => Some(ext.to_string_lossy().to_lowercase()),
            _ => None,
        };
        let name = match (tag, attempt) {
            (Some(tag), 0) => format!("{}_{}", stem, tag),
            (Some(tag), n) => format!("{}_{}_{}", stem, tag, n + 1),
            (None, n) => format!("{}_{}", stem, n + 2),
        };
        match planned.extension() {
            Some(ext) => output_dir.join(format!("{}.{}", name, ext.to_string_lossy())),
            None => output_dir.join(name),
        }
    }
}
