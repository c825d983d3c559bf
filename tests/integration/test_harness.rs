//! Fixtures shared by the batch integration tests.

use image::{ImageFormat, Rgb, RgbImage};
use parking_lot::Mutex;
use picmark::batch::{BatchEvent, BatchProcessor};
use picmark::watermark::source::embed_exif;
use picmark::watermark::{FontSet, LayoutSettings, WatermarkCompositor};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Processor drawing with block glyphs, so results do not depend on the
/// fonts installed on the machine.
pub fn processor() -> BatchProcessor {
    BatchProcessor::new(WatermarkCompositor::new(
        Arc::new(FontSet::fallback()),
        LayoutSettings::default(),
    ))
}

pub fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    })
}

pub fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// Write `count` JPEGs named `img_0.jpg`, `img_1.jpg`, ...
pub fn write_jpegs(dir: &Path, count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| {
            let path = dir.join(format!("img_{}.jpg", i));
            std::fs::write(&path, encode(&gradient(200, 150), ImageFormat::Jpeg)).unwrap();
            path
        })
        .collect()
}

/// JPEG carrying an APP1 segment with the given EXIF fields.
pub fn jpeg_with_exif(img: &RgbImage, fields: &[exif::Field]) -> Vec<u8> {
    embed_exif(&encode(img, ImageFormat::Jpeg), fields).unwrap()
}

pub fn date_field(value: &str) -> exif::Field {
    exif::Field {
        tag: exif::Tag::DateTimeOriginal,
        ifd_num: exif::In::PRIMARY,
        value: exif::Value::Ascii(vec![value.as_bytes().to_vec()]),
    }
}

/// Event sink that records everything it receives.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<BatchEvent>>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<BatchEvent> {
        self.events.lock().clone()
    }

    pub fn progress(&self) -> Vec<(usize, u8)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                BatchEvent::Progress { index, percent, .. } => Some((index, percent)),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<PathBuf> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                BatchEvent::Error { file, .. } => Some(file),
                _ => None,
            })
            .collect()
    }
}

impl picmark::batch::EventSink for RecordingSink {
    fn emit(&self, event: BatchEvent) {
        self.events.lock().push(event);
    }
}

pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
