//! Settings file through to a finished batch.

use super::test_harness::{write_jpegs, RecordingSink};
use picmark::batch::{image_files, BatchJob, BatchProcessor, BatchState, CancelToken};
use picmark::config::Config;
use picmark::watermark::{Anchor, FontSet, WatermarkCompositor};
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_config_file_drives_batch() {
    let dir = TempDir::new().unwrap();
    write_jpegs(dir.path(), 2);
    let config_path = dir.path().join("picmark.yaml");
    std::fs::write(
        &config_path,
        r##"
watermark:
  text: "Studio {exif_date}"
  opacity: 60
  color: "#FFFFFF"
  position: "左上角"
  multi_size: "true"
fonts:
  no_system_fonts: true
output:
  folder_name: Marked
  jpeg_quality: 70
"##,
    )
    .unwrap();

    let config = Config::from_file(&config_path).unwrap();
    config.validate().unwrap();
    let spec = config.watermark.to_spec().unwrap();
    assert_eq!(spec.anchor, Anchor::TopLeft);
    assert!(spec.adaptive_size);
    assert_eq!(spec.alpha(), 153);

    let fonts = FontSet::resolve(&config.fonts);
    assert!(fonts.has_english());
    let processor = BatchProcessor::new(WatermarkCompositor::new(
        Arc::new(fonts),
        config.layout.clone(),
    ))
    .with_quality(config.output.quality());

    let job = BatchJob::new(
        image_files(dir.path()).unwrap(),
        dir.path().join(&config.output.folder_name),
    );
    let report = processor.run(&job, &spec, &RecordingSink::default(), &CancelToken::new());

    assert_eq!(report.state, BatchState::Completed);
    assert_eq!(report.processed, 2);
    assert!(dir.path().join("Marked").join("img_1.jpg").is_file());
}
