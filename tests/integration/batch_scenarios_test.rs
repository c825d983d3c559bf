//! Batch runs over a temporary folder: success, bad files, cancellation and
//! fatal setup errors.

use super::test_harness::{encode, file_names, gradient, processor, write_jpegs, RecordingSink};
use image::{GenericImageView, ImageFormat};
use picmark::batch::{image_files, BatchEvent, BatchJob, BatchState, CancelToken};
use picmark::watermark::{Anchor, WatermarkSpec};
use rstest::rstest;
use tempfile::TempDir;

#[test]
fn test_all_images_processed() {
    let dir = TempDir::new().unwrap();
    write_jpegs(dir.path(), 3);
    let sink = RecordingSink::default();

    let job = BatchJob::for_folder(dir.path(), image_files(dir.path()).unwrap());
    let report = processor().run(&job, &WatermarkSpec::new("Hello"), &sink, &CancelToken::new());

    assert_eq!(report.state, BatchState::Completed);
    assert_eq!((report.processed, report.skipped), (3, 0));
    assert!(report.fatal_error.is_none());
    assert_eq!(
        file_names(&job.output_dir),
        vec!["img_0.jpg", "img_1.jpg", "img_2.jpg"]
    );
    for name in file_names(&job.output_dir) {
        let out = image::open(job.output_dir.join(name)).unwrap();
        assert_eq!(out.dimensions(), (200, 150));
    }
    assert_eq!(sink.progress(), vec![(1, 33), (2, 66), (3, 100)]);
    assert!(matches!(
        sink.events().last(),
        Some(BatchEvent::Finished {
            state: BatchState::Completed,
            processed: 3,
            skipped: 0,
            fatal_error: None,
        })
    ));
}

#[test]
fn test_corrupt_file_is_skipped() {
    let dir = TempDir::new().unwrap();
    let mut images = write_jpegs(dir.path(), 2);
    let corrupt = dir.path().join("broken.jpg");
    std::fs::write(&corrupt, b"\xFF\xD8 truncated").unwrap();
    images.insert(1, corrupt.clone());
    let sink = RecordingSink::default();

    let job = BatchJob::for_folder(dir.path(), images);
    let report = processor().run(&job, &WatermarkSpec::new("Hello"), &sink, &CancelToken::new());

    assert_eq!(report.state, BatchState::Completed);
    assert_eq!((report.processed, report.skipped), (2, 1));
    assert_eq!(sink.errors(), vec![corrupt]);
    // Progress still covers the skipped image
    assert_eq!(sink.progress().len(), 3);
    assert_eq!(file_names(&job.output_dir), vec!["img_0.jpg", "img_1.jpg"]);
}

#[test]
fn test_cancel_after_first_image() {
    let dir = TempDir::new().unwrap();
    let images = write_jpegs(dir.path(), 5);
    let cancel = CancelToken::new();
    let sink = {
        let cancel = cancel.clone();
        move |event: BatchEvent| {
            if matches!(event, BatchEvent::Progress { .. }) {
                cancel.cancel();
            }
        }
    };

    let job = BatchJob::for_folder(dir.path(), images);
    let report = processor().run(&job, &WatermarkSpec::new("Hello"), &sink, &cancel);

    assert_eq!(report.state, BatchState::Cancelled);
    assert_eq!((report.processed, report.skipped), (1, 0));
    assert_eq!(file_names(&job.output_dir), vec!["img_0.jpg"]);
}

#[test]
fn test_output_dir_failure_is_fatal() {
    let dir = TempDir::new().unwrap();
    let images = write_jpegs(dir.path(), 2);
    let blocker = dir.path().join("not_a_dir");
    std::fs::write(&blocker, b"file").unwrap();
    let sink = RecordingSink::default();

    let job = BatchJob::new(images, blocker.join("out"));
    let report = processor().run(&job, &WatermarkSpec::new("Hello"), &sink, &CancelToken::new());

    assert_eq!(report.state, BatchState::Failed);
    assert_eq!((report.processed, report.skipped), (0, 0));
    assert!(report
        .fatal_error
        .as_deref()
        .unwrap()
        .contains("Cannot create output directory"));
    assert!(sink.progress().is_empty());
    assert_eq!(sink.events().len(), 1);
}

#[test]
fn test_mixed_formats() {
    let dir = TempDir::new().unwrap();
    let img = gradient(64, 48);
    std::fs::write(dir.path().join("a.png"), encode(&img, ImageFormat::Png)).unwrap();
    std::fs::write(dir.path().join("b.bmp"), encode(&img, ImageFormat::Bmp)).unwrap();
    std::fs::write(dir.path().join("c.gif"), encode(&img, ImageFormat::Gif)).unwrap();
    std::fs::write(dir.path().join("d.webp"), encode(&img, ImageFormat::WebP)).unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
    let sink = RecordingSink::default();

    let images = image_files(dir.path()).unwrap();
    assert_eq!(images.len(), 4);
    let job = BatchJob::for_folder(dir.path(), images);
    let spec = WatermarkSpec::new("Mixed").with_anchor(Anchor::TopLeft);
    let report = processor().run(&job, &spec, &sink, &CancelToken::new());

    assert_eq!((report.processed, report.skipped), (4, 0));
    assert_eq!(
        file_names(&job.output_dir),
        vec!["a.png", "b.bmp", "c.png", "d.webp"]
    );
    for (name, format) in [
        ("a.png", ImageFormat::Png),
        ("b.bmp", ImageFormat::Bmp),
        ("c.png", ImageFormat::Png),
        ("d.webp", ImageFormat::WebP),
    ] {
        let bytes = std::fs::read(job.output_dir.join(name)).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), format, "{}", name);
    }
}

#[test]
fn test_rerun_skips_previous_output() {
    let dir = TempDir::new().unwrap();
    write_jpegs(dir.path(), 2);
    let spec = WatermarkSpec::new("Twice");

    for _ in 0..2 {
        let job = BatchJob::for_folder(dir.path(), image_files(dir.path()).unwrap());
        assert_eq!(job.images.len(), 2);
        let report = processor().run(&job, &spec, &RecordingSink::default(), &CancelToken::new());
        assert_eq!(report.processed, 2);
    }
}

#[rstest]
#[case::gif_listed_first(false)]
#[case::png_listed_first(true)]
fn test_gif_does_not_overwrite_png_of_same_name(#[case] png_first: bool) {
    let dir = TempDir::new().unwrap();
    let img = gradient(64, 48);
    std::fs::write(dir.path().join("a.gif"), encode(&img, ImageFormat::Gif)).unwrap();
    std::fs::write(dir.path().join("a.png"), encode(&img, ImageFormat::Png)).unwrap();
    let sink = RecordingSink::default();

    let mut images = image_files(dir.path()).unwrap();
    if png_first {
        images.reverse();
    }
    let job = BatchJob::for_folder(dir.path(), images);
    let report = processor().run(&job, &WatermarkSpec::new("Twin"), &sink, &CancelToken::new());

    assert_eq!((report.processed, report.skipped), (2, 0));
    assert_eq!(file_names(&job.output_dir), vec!["a.png", "a_gif.png"]);
    assert!(sink.events().iter().any(|e| matches!(
        e,
        BatchEvent::Status { message }
            if message.starts_with("a.gif:")
                && message.ends_with("written as a_gif.png so a.png is not overwritten")
    )));
}

#[test]
fn test_substituted_output_keeps_existing_file() {
    let dir = TempDir::new().unwrap();
    let img = gradient(64, 48);
    std::fs::write(dir.path().join("a.gif"), encode(&img, ImageFormat::Gif)).unwrap();
    let job = BatchJob::for_folder(dir.path(), image_files(dir.path()).unwrap());
    std::fs::create_dir_all(&job.output_dir).unwrap();
    std::fs::write(job.output_dir.join("a.png"), b"kept").unwrap();

    let sink = RecordingSink::default();
    let report = processor().run(&job, &WatermarkSpec::new("Keep"), &sink, &CancelToken::new());

    assert_eq!(report.processed, 1);
    assert_eq!(std::fs::read(job.output_dir.join("a.png")).unwrap(), b"kept");
    let bytes = std::fs::read(job.output_dir.join("a_gif.png")).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
}
