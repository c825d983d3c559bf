//! Image encoder abstraction
//!
//! One encoder per output format behind a common trait. Formats without an
//! alpha channel are flattened onto white before encoding.

use super::error::OutputError;
use super::format::OutputFormat;
use image::{ImageEncoder as _, Rgb, RgbImage, RgbaImage};
use std::io::Cursor;

/// Default JPEG quality
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Quality settings for image encoding
#[derive(Debug, Clone, Copy)]
pub struct EncoderQuality {
    /// JPEG quality value (1-100, where 100 is best quality)
    pub quality: u8,
}

impl Default for EncoderQuality {
    fn default() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl EncoderQuality {
    /// Create quality settings with specified quality level
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

/// Trait for image encoders
pub trait ImageEncoder: Send + Sync {
    /// The output format this encoder produces
    fn format(&self) -> OutputFormat;

    /// Encode an RGBA image to the target format
    fn encode(&self, image: &RgbaImage, quality: EncoderQuality) -> Result<Vec<u8>, OutputError>;

    /// Check if this encoder keeps the alpha channel
    fn supports_transparency(&self) -> bool;
}

/// JPEG encoder, RGB only
pub struct JpegEncoder;

impl ImageEncoder for JpegEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Jpeg
    }

    fn encode(&self, image: &RgbaImage, quality: EncoderQuality) -> Result<Vec<u8>, OutputError> {
        use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;

        let rgb = flatten_onto_white(image);
        let mut output = Cursor::new(Vec::new());
        ImageJpegEncoder::new_with_quality(&mut output, quality.quality)
            .write_image(rgb.as_raw(), rgb.width(), rgb.height(), image::ColorType::Rgb8)
            .map_err(|e| OutputError::encode_failed("jpeg", e.to_string()))?;

        Ok(output.into_inner())
    }

    fn supports_transparency(&self) -> bool {
        false
    }
}

/// PNG encoder
pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Png
    }

    fn encode(&self, image: &RgbaImage, _quality: EncoderQuality) -> Result<Vec<u8>, OutputError> {
        use image::codecs::png::PngEncoder as ImagePngEncoder;

        let mut output = Cursor::new(Vec::new());
        ImagePngEncoder::new(&mut output)
            .write_image(image.as_raw(), image.width(), image.height(), image::ColorType::Rgba8)
            .map_err(|e| OutputError::encode_failed("png", e.to_string()))?;

        Ok(output.into_inner())
    }

    fn supports_transparency(&self) -> bool {
        true
    }
}

/// Lossless WebP encoder
pub struct WebPEncoder;

impl ImageEncoder for WebPEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::WebP
    }

    fn encode(&self, image: &RgbaImage, _quality: EncoderQuality) -> Result<Vec<u8>, OutputError> {
        use image::codecs::webp::WebPEncoder as ImageWebPEncoder;

        let mut output = Cursor::new(Vec::new());
        ImageWebPEncoder::new_lossless(&mut output)
            .write_image(image.as_raw(), image.width(), image.height(), image::ColorType::Rgba8)
            .map_err(|e| OutputError::encode_failed("webp", e.to_string()))?;

        Ok(output.into_inner())
    }

    fn supports_transparency(&self) -> bool {
        true
    }
}

/// BMP encoder, RGB only
pub struct BmpEncoder;

impl ImageEncoder for BmpEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Bmp
    }

    fn encode(&self, image: &RgbaImage, _quality: EncoderQuality) -> Result<Vec<u8>, OutputError> {
        use image::codecs::bmp::BmpEncoder as ImageBmpEncoder;

        let rgb = flatten_onto_white(image);
        let mut output = Cursor::new(Vec::new());
        ImageBmpEncoder::new(&mut output)
            .write_image(rgb.as_raw(), rgb.width(), rgb.height(), image::ColorType::Rgb8)
            .map_err(|e| OutputError::encode_failed("bmp", e.to_string()))?;

        Ok(output.into_inner())
    }

    fn supports_transparency(&self) -> bool {
        false
    }
}

/// Factory for creating encoders based on output format
pub struct EncoderFactory;

impl EncoderFactory {
    /// Create an encoder for the specified output format
    pub fn create(format: OutputFormat) -> Box<dyn ImageEncoder> {
        match format {
            OutputFormat::Jpeg => Box::new(JpegEncoder),
            OutputFormat::Png => Box::new(PngEncoder),
            OutputFormat::WebP => Box::new(WebPEncoder),
            OutputFormat::Bmp => Box::new(BmpEncoder),
        }
    }
}

/// Composite an RGBA image over an opaque white background
pub fn flatten_onto_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let p = image.get_pixel(x, y);
        let a = p[3] as u32;
        let over = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        Rgb([over(p[0]), over(p[1]), over(p[2])])
    })
}
