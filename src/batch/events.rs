//! Progress events emitted by a batch run.

use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedSender;

/// Lifecycle of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl BatchState {
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            BatchState::Completed | BatchState::Cancelled | BatchState::Failed
        )
    }
}

/// A message from the batch worker to whoever is watching it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum BatchEvent {
    Status {
        message: String,
    },
    Progress {
        index: usize,
        total: usize,
        percent: u8,
    },
    Error {
        file: PathBuf,
        message: String,
    },
    Finished {
        state: BatchState,
        processed: usize,
        skipped: usize,
        fatal_error: Option<String>,
    },
}

impl BatchEvent {
    pub fn status(message: impl Into<String>) -> Self {
        BatchEvent::Status {
            message: message.into(),
        }
    }

    /// Progress after `index` of `total` items, rounded down to whole percent.
    pub fn progress(index: usize, total: usize) -> Self {
        let percent = if total == 0 {
            100
        } else {
            (index.min(total) * 100 / total) as u8
        };
        BatchEvent::Progress {
            index,
            total,
            percent,
        }
    }
}

/// Receiver of batch events.
///
/// Called from the batch worker thread; implementations must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: BatchEvent);
}

impl EventSink for UnboundedSender<BatchEvent> {
    fn emit(&self, event: BatchEvent) {
        // A closed receiver means nobody is listening any more
        let _ = self.send(event);
    }
}

impl<F> EventSink for F
where
    F: Fn(BatchEvent) + Send + Sync,
{
    fn emit(&self, event: BatchEvent) {
        self(event)
    }
}

/// Sink that writes every event to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: BatchEvent) {
        log_event(&event);
    }
}

/// Log one event at the level matching its kind.
pub fn log_event(event: &BatchEvent) {
    match event {
        BatchEvent::Status { message } => tracing::info!("{}", message),
        BatchEvent::Progress {
            index,
            total,
            percent,
        } => tracing::info!(index, total, percent, "Progress"),
        BatchEvent::Error { file, message } => {
            tracing::error!(file = %file.display(), "{}", message)
        }
        BatchEvent::Finished {
            state,
            processed,
            skipped,
            fatal_error,
        } => match fatal_error {
            Some(error) => tracing::error!(?state, processed, skipped, error = %error, "Batch finished"),
            None => tracing::info!(?state, processed, skipped, "Batch finished"),
        },
    }
}
