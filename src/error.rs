// Error types module

use crate::output::OutputError;
use crate::watermark::WatermarkError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single image in a batch; the image is skipped
#[derive(Error, Debug)]
pub enum ItemError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to watermark {path}: {source}")]
    Render {
        path: PathBuf,
        #[source]
        source: WatermarkError,
    },

    #[error("Failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: OutputError,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: OutputError,
    },
}

impl ItemError {
    /// The source image the error refers to
    pub fn path(&self) -> &PathBuf {
        match self {
            ItemError::Read { path, .. }
            | ItemError::Decode { path, .. }
            | ItemError::Render { path, .. }
            | ItemError::Encode { path, .. }
            | ItemError::Write { path, .. } => path,
        }
    }
}

/// Failure that stops a batch before any image is processed
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{0}' is referenced but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
