//! Decoding source images and reading their EXIF metadata.
//!
//! Orientation is applied right after decoding so the watermark lands on the
//! image as it is meant to be viewed. The capture time feeds the
//! `{exif_date}` placeholder. Metadata problems never fail an image: a
//! missing or unreadable EXIF block means "upright, no date".

use super::WatermarkError;
use chrono::NaiveDateTime;
use image::io::Reader as ImageReader;
use image::{ColorType, DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Formats the capture time is accepted in.
const EXIF_DATE_FORMATS: &[&str] = &["%Y:%m:%d %H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Output format of a capture time.
pub const CAPTURE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What is known about one source image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    pub path: PathBuf,
    /// Width after orientation is applied
    pub width: u32,
    /// Height after orientation is applied
    pub height: u32,
    pub color_type: ColorType,
    pub format: Option<ImageFormat>,
    /// EXIF orientation tag, 1 when absent
    pub orientation: u32,
    /// Capture time as `YYYY-MM-DD HH:MM:SS`
    pub capture_date: Option<String>,
}

/// A decoded, upright image and its record.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub record: ImageRecord,
    pub image: DynamicImage,
}

impl SourceImage {
    /// Decode `bytes` read from `path`.
    ///
    /// Only decoding can fail; EXIF problems are logged and ignored.
    pub fn from_bytes(path: &Path, bytes: &[u8]) -> Result<Self, image::ImageError> {
        let format = image::guess_format(bytes)
            .ok()
            .or_else(|| ImageFormat::from_path(path).ok());

        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(image::ImageError::IoError)?;
        if reader.format().is_none() {
            if let Some(format) = format {
                reader.set_format(format);
            }
        }
        let decoded = reader.decode()?;
        let color_type = decoded.color();

        let metadata = match read_exif(bytes) {
            Ok(exif) => exif.map(|exif| ExifInfo::from_exif(&exif)).unwrap_or_default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring EXIF metadata");
                ExifInfo::default()
            }
        };

        let image = apply_orientation(decoded, metadata.orientation);

        Ok(Self {
            record: ImageRecord {
                path: path.to_path_buf(),
                width: image.width(),
                height: image.height(),
                color_type,
                format,
                orientation: metadata.orientation,
                capture_date: metadata.capture_date,
            },
            image,
        })
    }
}

/// Metadata extracted from an EXIF block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExifInfo {
    pub orientation: u32,
    pub capture_date: Option<String>,
}

impl Default for ExifInfo {
    fn default() -> Self {
        Self {
            orientation: 1,
            capture_date: None,
        }
    }
}

impl ExifInfo {
    pub fn from_exif(exif: &exif::Exif) -> Self {
        let orientation = exif
            .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .and_then(|f| f.value.get_uint(0))
            .filter(|o| (1..=8).contains(o))
            .unwrap_or(1);

        Self {
            orientation,
            capture_date: capture_date(exif),
        }
    }
}

/// Parse the EXIF block of a JPEG, PNG, TIFF, HEIF or WebP file.
///
/// `Ok(None)` means the file simply has no EXIF data.
pub fn read_exif(bytes: &[u8]) -> Result<Option<exif::Exif>, WatermarkError> {
    let mut cursor = Cursor::new(bytes);
    match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => Ok(Some(exif)),
        Err(exif::Error::NotFound(_)) => Ok(None),
        Err(e) => Err(WatermarkError::ExifError(e.to_string())),
    }
}

/// Capture time from `DateTimeOriginal`, falling back to `DateTime`.
fn capture_date(exif: &exif::Exif) -> Option<String> {
    let raw = [exif::Tag::DateTimeOriginal, exif::Tag::DateTime]
        .into_iter()
        .find_map(|tag| {
            let field = exif.get_field(tag, exif::In::PRIMARY)?;
            match &field.value {
                exif::Value::Ascii(values) => values.first().map(|v| ascii_value(v)),
                _ => None,
            }
        })?;

    let formatted = format_capture_date(&raw);
    if formatted.is_none() {
        tracing::warn!(value = %raw, "Unrecognized EXIF date");
    }
    formatted
}

fn ascii_value(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim().to_string()
}

/// Normalize an EXIF date (`2024:05:01 12:30:00`) to `2024-05-01 12:30:00`.
pub fn format_capture_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    EXIF_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.format(CAPTURE_DATE_FORMAT).to_string())
}

/// Rotate or flip an image into its upright orientation.
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Insert an APP1 EXIF segment holding `fields` right after the JPEG SOI marker.
#[doc(hidden)]
pub fn embed_exif(jpeg: &[u8], fields: &[exif::Field]) -> Result<Vec<u8>, WatermarkError> {
    if !jpeg.starts_with(&[0xFF, 0xD8]) {
        return Err(WatermarkError::ExifError("not a JPEG stream".to_string()));
    }

    let mut writer = exif::experimental::Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer
        .write(&mut tiff, false)
        .map_err(|e| WatermarkError::ExifError(e.to_string()))?;
    let tiff = tiff.into_inner();

    let len = u16::try_from(2 + 6 + tiff.len())
        .map_err(|_| WatermarkError::ExifError("EXIF block too large".to_string()))?;
    let mut out = Vec::with_capacity(jpeg.len() + len as usize + 2);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    Ok(out)
}
