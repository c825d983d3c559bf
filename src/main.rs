use anyhow::{bail, Context};
use clap::Parser;
use picmark::batch::{
    image_files, log_event, BatchEvent, BatchJob, BatchProcessor, BatchState, CancelToken,
    EventSink,
};
use picmark::config::Config;
use picmark::watermark::{
    parse_hex_color, Anchor, FontSet, WatermarkCompositor, WatermarkSettings,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Picmark - batch text watermarking for a folder of photos
#[derive(Parser, Debug)]
#[command(name = "picmark")]
#[command(version, about, long_about = None)]
struct Args {
    /// Folder containing the images to watermark
    folder: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Watermark text; `{exif_date}` is replaced by the capture date
    #[arg(short, long)]
    text: Option<String>,

    /// Base font size in pixels
    #[arg(long)]
    font_size: Option<i64>,

    /// Opacity percentage (0-100)
    #[arg(long)]
    opacity: Option<i64>,

    /// Text color as #RRGGBB or #RGB
    #[arg(long)]
    color: Option<String>,

    /// Placement: top-left, top-right, bottom-left, bottom-right, center
    #[arg(short, long)]
    position: Option<String>,

    /// Scale the font size with the image width
    #[arg(long)]
    adaptive: bool,

    /// Pick black or white text from the background
    #[arg(long)]
    high_contrast: bool,

    /// Output directory (default: <FOLDER>/Watermarked_Images)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Args {
    fn apply_overrides(&self, settings: &mut WatermarkSettings) -> anyhow::Result<()> {
        if let Some(text) = &self.text {
            settings.text = text.clone();
        }
        if let Some(size) = self.font_size {
            settings.font_size = size;
        }
        if let Some(opacity) = self.opacity {
            settings.opacity = opacity;
        }
        if let Some(color) = &self.color {
            settings.color = parse_hex_color(color).map_err(anyhow::Error::msg)?;
        }
        if let Some(position) = &self.position {
            settings.position = Anchor::from_label(position);
        }
        settings.multi_size |= self.adaptive;
        settings.high_contrast |= self.high_contrast;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => Config::default(),
    };
    args.apply_overrides(&mut config.watermark)?;
    config.validate().context("Invalid configuration")?;

    picmark::logging::init_subscriber(&config.logging).map_err(anyhow::Error::msg)?;

    let spec = config.watermark.to_spec().map_err(anyhow::Error::msg)?;
    let images = image_files(&args.folder)
        .with_context(|| format!("Cannot read folder {}", args.folder.display()))?;

    let job = match &args.output {
        Some(dir) => BatchJob::new(images, dir.clone()),
        None => BatchJob::new(images, args.folder.join(&config.output.folder_name)),
    };

    tracing::info!(
        folder = %args.folder.display(),
        output = %job.output_dir.display(),
        images = job.images.len(),
        text = %spec.text,
        position = %spec.anchor,
        adaptive = spec.adaptive_size,
        high_contrast = spec.high_contrast,
        "Starting batch"
    );

    let fonts = Arc::new(FontSet::resolve(&config.fonts));
    let processor = Arc::new(
        BatchProcessor::new(WatermarkCompositor::new(fonts, config.layout.clone()))
            .with_quality(config.output.quality()),
    );

    let cancel = CancelToken::new();
    #[cfg(unix)]
    {
        if let Err(e) = cancel.register_signal_handlers() {
            tracing::warn!(error = %e, "Ctrl-C will not stop the batch early");
        }
    }

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<BatchEvent>();
    let sink: Arc<dyn EventSink> = Arc::new(tx);
    let handle = processor.spawn(job, spec, sink, cancel);

    // Drains until the worker drops its sender
    while let Some(event) = rx.recv().await {
        log_event(&event);
    }

    let report = handle.await.context("Batch worker panicked")?;
    match report.state {
        BatchState::Failed => {
            let reason = report.fatal_error.unwrap_or_default();
            bail!("Batch failed: {}", reason)
        }
        BatchState::Cancelled => std::process::exit(130),
        _ => Ok(()),
    }
}
