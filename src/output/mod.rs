//! Writing watermarked images.
//!
//! Picks the output format for each source ([`format`]), encodes with the
//! matching encoder ([`encoder`]) and writes the file under the output
//! directory.
//!
//! ```yaml
//! output:
//!   folder_name: Watermarked_Images
//!   jpeg_quality: 95
//! ```

pub mod encoder;
pub mod error;
pub mod format;

pub use encoder::{flatten_onto_white, EncoderFactory, EncoderQuality, ImageEncoder};
pub use error::OutputError;
pub use format::{OutputFormat, OutputPlan, Substitution};

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default name of the output directory created inside the source folder
pub const DEFAULT_FOLDER_NAME: &str = "Watermarked_Images";

fn default_folder_name() -> String {
    DEFAULT_FOLDER_NAME.to_string()
}

fn default_jpeg_quality() -> u8 {
    encoder::DEFAULT_JPEG_QUALITY
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory name inside the source folder (default: Watermarked_Images)
    #[serde(default = "default_folder_name")]
    pub folder_name: String,

    /// JPEG quality from 1 to 100 (default: 95)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            folder_name: default_folder_name(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

impl OutputConfig {
    pub fn validate(&self) -> Result<(), String> {
        let name = self.folder_name.trim();
        if name.is_empty() {
            return Err("output.folder_name cannot be empty".to_string());
        }
        if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            return Err(format!(
                "output.folder_name must be a plain directory name, got '{}'",
                self.folder_name
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(format!(
                "output.jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            ));
        }
        Ok(())
    }

    pub fn quality(&self) -> EncoderQuality {
        EncoderQuality::with_quality(self.jpeg_quality)
    }
}

/// Encode `image` per `plan` and write it to `path`.
pub fn write_image(
    image: &RgbaImage,
    plan: &OutputPlan,
    path: &Path,
    quality: EncoderQuality,
) -> Result<PathBuf, OutputError> {
    let data = EncoderFactory::create(plan.format).encode(image, quality)?;
    std::fs::write(path, &data)
        .map_err(|e| OutputError::write_failed(path.display().to_string(), e.to_string()))?;

    tracing::debug!(
        path = %path.display(),
        format = plan.format.as_str(),
        bytes = data.len(),
        "Wrote watermarked image"
    );
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use tempfile::TempDir;

    #[test]
    fn test_output_config_defaults() {
        let config = OutputConfig::default();
        assert_eq!(config.folder_name, "Watermarked_Images");
        assert_eq!(config.jpeg_quality, 95);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_output_config_from_yaml() {
        let config: OutputConfig = serde_yaml::from_str("jpeg_quality: 80").unwrap();
        assert_eq!(config.jpeg_quality, 80);
        assert_eq!(config.folder_name, DEFAULT_FOLDER_NAME);
    }

    #[test]
    fn test_output_config_validation() {
        let mut config = OutputConfig::default();
        config.jpeg_quality = 0;
        assert!(config.validate().unwrap_err().contains("jpeg_quality"));

        let mut config = OutputConfig::default();
        config.folder_name = "../elsewhere".to_string();
        assert!(config.validate().unwrap_err().contains("folder_name"));

        let mut config = OutputConfig::default();
        config.folder_name = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_write_image() {
        let dir = TempDir::new().unwrap();
        let plan = OutputPlan::for_source(Some(ImageFormat::Jpeg));
        let path = plan.output_path(dir.path(), Path::new("photo.jpg"));
        let img = RgbaImage::from_pixel(16, 16, Rgba([10, 200, 10, 255]));

        let written = write_image(&img, &plan, &path, EncoderQuality::default()).unwrap();
        assert_eq!(written, dir.path().join("photo.jpg"));
        let bytes = std::fs::read(&written).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_write_image_missing_directory() {
        let dir = TempDir::new().unwrap();
        let plan = OutputPlan::for_source(Some(ImageFormat::Png));
        let path = dir.path().join("missing").join("a.png");
        let img = RgbaImage::new(2, 2);

        let err = write_image(&img, &plan, &path, EncoderQuality::default()).unwrap_err();
        assert!(matches!(err, OutputError::WriteFailed { .. }));
    }
}
