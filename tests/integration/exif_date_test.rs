//! `{exif_date}` resolution through the decode and render path.

use super::test_harness::{date_field, encode, gradient, jpeg_with_exif, processor, RecordingSink};
use image::ImageFormat;
use picmark::batch::{BatchJob, BatchState, CancelToken};
use picmark::watermark::{FontSet, LayoutSettings, SourceImage, WatermarkCompositor, WatermarkSpec};
use std::path::Path;
use std::sync::Arc;

fn compositor() -> WatermarkCompositor {
    WatermarkCompositor::new(Arc::new(FontSet::fallback()), LayoutSettings::default())
}

#[test]
fn test_missing_exif_renders_na() {
    let bytes = encode(&gradient(300, 200), ImageFormat::Png);
    let source = SourceImage::from_bytes(Path::new("plain.png"), &bytes).unwrap();
    assert!(source.record.capture_date.is_none());

    let rendered = compositor()
        .render(&source, &WatermarkSpec::new("{exif_date}"))
        .unwrap();
    assert_eq!(rendered.placement.text, "N/A");
}

#[test]
fn test_capture_date_in_text() {
    let bytes = jpeg_with_exif(&gradient(300, 200), &[date_field("2019:12:31 23:59:58")]);
    let source = SourceImage::from_bytes(Path::new("dated.jpg"), &bytes).unwrap();

    let rendered = compositor()
        .render(&source, &WatermarkSpec::new("Taken {exif_date}"))
        .unwrap();
    assert_eq!(rendered.placement.text, "Taken 2019-12-31 23:59:58");
}

#[test]
fn test_batch_with_date_placeholder() {
    let dir = tempfile::TempDir::new().unwrap();
    let dated = dir.path().join("dated.jpg");
    let plain = dir.path().join("plain.png");
    std::fs::write(
        &dated,
        jpeg_with_exif(&gradient(120, 90), &[date_field("2020:01:02 03:04:05")]),
    )
    .unwrap();
    std::fs::write(&plain, encode(&gradient(120, 90), ImageFormat::Png)).unwrap();

    let job = BatchJob::for_folder(dir.path(), vec![dated, plain]);
    let spec = WatermarkSpec::new("{exif_date}").with_adaptive_size(true);
    let report = processor().run(&job, &spec, &RecordingSink::default(), &CancelToken::new());

    assert_eq!(report.state, BatchState::Completed);
    assert_eq!(report.processed, 2);
    assert!(job.output_dir.join("dated.jpg").is_file());
    assert!(job.output_dir.join("plain.png").is_file());
}
