//! Batch watermarking of an ordered list of images.
//!
//! A run walks the list once, in the order given. Every image is read,
//! decoded, watermarked and written on its own: a failing image is reported
//! and skipped, and the next one is tried. Only failing to create the output
//! directory stops a run, before any image is touched. Cancellation is
//! checked before each image; the image in progress always completes.

use super::cancel::CancelToken;
use super::events::{BatchEvent, BatchState, EventSink};
use crate::error::{BatchError, ItemError};
use crate::output::{write_image, EncoderQuality, OutputError, OutputPlan};
use crate::watermark::{SourceImage, WatermarkCompositor, WatermarkSpec};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

/// The images of one run and where their results go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    pub images: Vec<PathBuf>,
    pub output_dir: PathBuf,
}

impl BatchJob {
    pub fn new(images: Vec<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            images,
            output_dir: output_dir.into(),
        }
    }

    /// Job writing into `<folder>/Watermarked_Images`.
    pub fn for_folder(folder: &Path, images: Vec<PathBuf>) -> Self {
        Self::new(images, folder.join(crate::output::DEFAULT_FOLDER_NAME))
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub state: BatchState,
    pub processed: usize,
    pub skipped: usize,
    pub fatal_error: Option<String>,
}

/// Result of one successfully written image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub output: PathBuf,
    /// Set when the output format differs from the source format
    pub substitution: Option<String>,
    /// Path the output would have had, when that path was taken
    pub renamed_from: Option<PathBuf>,
}

impl ItemOutcome {
    /// Message telling the user the output differs from the source.
    pub fn note(&self) -> Option<String> {
        let renamed = self.renamed_from.as_ref().map(|planned| {
            format!(
                "written as {} so {} is not overwritten",
                display_name(&self.output),
                display_name(planned)
            )
        });
        match (&self.substitution, renamed) {
            (Some(substitution), Some(renamed)) => Some(format!("{}, {}", substitution, renamed)),
            (Some(substitution), None) => Some(substitution.clone()),
            (None, renamed) => renamed,
        }
    }
}

/// Output paths claimed by the images of a run and those already written.
///
/// An image keeping its own file name only yields to outputs written earlier
/// in the run. An image whose name changes (GIF to PNG) must also avoid the
/// names of the other images and files already on disk.
#[derive(Debug, Default)]
struct OutputNames {
    claimed: HashSet<PathBuf>,
    written: HashSet<PathBuf>,
}

impl OutputNames {
    fn for_job(job: &BatchJob) -> Self {
        Self {
            claimed: job
                .images
                .iter()
                .filter_map(|p| p.file_name().map(|n| job.output_dir.join(n)))
                .collect(),
            written: HashSet::new(),
        }
    }

    /// Planned output path, or a free alternate plus the planned path.
    fn pick(
        &self,
        plan: &OutputPlan,
        output_dir: &Path,
        source: &Path,
    ) -> (PathBuf, Option<PathBuf>) {
        let planned = plan.output_path(output_dir, source);
        let own_name = source.file_name().map(|n| output_dir.join(n));
        let renamed = own_name.as_ref() != Some(&planned);

        let taken = self.written.contains(&planned)
            || (renamed && (self.claimed.contains(&planned) || planned.exists()));
        if !taken {
            return (planned, None);
        }

        let alternate = (0..u32::MAX)
            .map(|n| plan.alternate_path(output_dir, source, n))
            .find(|p| !self.written.contains(p) && !self.claimed.contains(p));
        match alternate {
            Some(path) => (path, Some(planned)),
            None => (planned, None),
        }
    }
}

/// Runs batches; holds nothing that outlives a run.
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    compositor: WatermarkCompositor,
    quality: EncoderQuality,
}

impl BatchProcessor {
    pub fn new(compositor: WatermarkCompositor) -> Self {
        Self {
            compositor,
            quality: EncoderQuality::default(),
        }
    }

    pub fn with_quality(mut self, quality: EncoderQuality) -> Self {
        self.quality = quality;
        self
    }

    /// Process every image of `job`, reporting to `sink`.
    pub fn run(
        &self,
        job: &BatchJob,
        spec: &WatermarkSpec,
        sink: &dyn EventSink,
        cancel: &CancelToken,
    ) -> BatchReport {
        let started = Instant::now();
        let total = job.images.len();

        if let Err(e) = std::fs::create_dir_all(&job.output_dir).map_err(|source| {
            BatchError::OutputDir {
                path: job.output_dir.clone(),
                source,
            }
        }) {
            tracing::error!(error = %e, "Batch aborted");
            return finish(
                sink,
                BatchReport {
                    state: BatchState::Failed,
                    processed: 0,
                    skipped: 0,
                    fatal_error: Some(e.to_string()),
                },
            );
        }

        sink.emit(BatchEvent::status(format!(
            "Processing {} images into {}",
            total,
            job.output_dir.display()
        )));

        let mut names = OutputNames::for_job(job);
        let mut processed = 0;
        let mut skipped = 0;
        let mut state = BatchState::Completed;

        for (i, path) in job.images.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::info!(done = i, total, "Batch cancelled");
                sink.emit(BatchEvent::status(format!(
                    "Cancelled after {} of {} images",
                    i, total
                )));
                state = BatchState::Cancelled;
                break;
            }

            match self.process_into(path, &job.output_dir, spec, &names) {
                Ok(outcome) => {
                    processed += 1;
                    names.written.insert(outcome.output.clone());
                    if let Some(note) = outcome.note() {
                        sink.emit(BatchEvent::status(format!(
                            "{}: {}",
                            display_name(path),
                            note
                        )));
                    }
                    tracing::info!(
                        source = %path.display(),
                        output = %outcome.output.display(),
                        "Watermarked image"
                    );
                }
                Err(e) => {
                    skipped += 1;
                    tracing::error!(source = %path.display(), error = %e, "Skipping image");
                    sink.emit(BatchEvent::Error {
                        file: path.clone(),
                        message: e.to_string(),
                    });
                }
            }

            sink.emit(BatchEvent::progress(i + 1, total));
        }

        tracing::info!(
            ?state,
            processed,
            skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Batch run done"
        );

        finish(
            sink,
            BatchReport {
                state,
                processed,
                skipped,
                fatal_error: None,
            },
        )
    }

    /// Watermark one image and write it under `output_dir`.
    pub fn process_item(
        &self,
        path: &Path,
        output_dir: &Path,
        spec: &WatermarkSpec,
    ) -> Result<ItemOutcome, ItemError> {
        self.process_into(path, output_dir, spec, &OutputNames::default())
    }

    fn process_into(
        &self,
        path: &Path,
        output_dir: &Path,
        spec: &WatermarkSpec,
        names: &OutputNames,
    ) -> Result<ItemOutcome, ItemError> {
        let bytes = std::fs::read(path).map_err(|source| ItemError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let source = SourceImage::from_bytes(path, &bytes).map_err(|source| ItemError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        let rendered = self
            .compositor
            .render(&source, spec)
            .map_err(|source| ItemError::Render {
                path: path.to_path_buf(),
                source,
            })?;

        let plan = OutputPlan::for_source(source.record.format);
        let (output, renamed_from) = names.pick(&plan, output_dir, path);

        write_image(&rendered.image, &plan, &output, self.quality).map_err(|source| {
            let path = path.to_path_buf();
            match source {
                OutputError::EncodeFailed { .. } => ItemError::Encode { path, source },
                OutputError::WriteFailed { .. } => ItemError::Write { path, source },
            }
        })?;

        tracing::debug!(
            source = %path.display(),
            font_size = rendered.placement.font_size,
            lines = rendered.placement.line_count,
            format = plan.format.as_str(),
            "Item written"
        );

        Ok(ItemOutcome {
            output,
            substitution: plan.substitution.map(|s| s.to_string()),
            renamed_from,
        })
    }

    /// Run a batch on a blocking worker thread.
    pub fn spawn(
        self: Arc<Self>,
        job: BatchJob,
        spec: WatermarkSpec,
        sink: Arc<dyn EventSink>,
        cancel: CancelToken,
    ) -> JoinHandle<BatchReport> {
        tokio::task::spawn_blocking(move || self.run(&job, &spec, sink.as_ref(), &cancel))
    }
}

fn finish(sink: &dyn EventSink, report: BatchReport) -> BatchReport {
    sink.emit(BatchEvent::Finished {
        state: report.state,
        processed: report.processed,
        skipped: report.skipped,
        fatal_error: report.fatal_error.clone(),
    });
    report
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
