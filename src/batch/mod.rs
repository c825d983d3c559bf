//! Batch processing of a folder of images.
//!
//! [`scan`] lists the images of a folder, [`processor`] watermarks them one
//! by one on a blocking worker and reports through an [`EventSink`]. A
//! [`CancelToken`] stops the run between images.

pub mod cancel;
pub mod events;
pub mod processor;
pub mod scan;

pub use cancel::CancelToken;
pub use events::{log_event, BatchEvent, BatchState, EventSink, TracingSink};
pub use processor::{BatchJob, BatchProcessor, BatchReport, ItemOutcome};
pub use scan::{image_files, is_supported_image, SUPPORTED_EXTENSIONS};
