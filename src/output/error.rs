//! Output encoding error types

use std::fmt;

/// Errors that can occur while writing a watermarked image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputError {
    /// Encoding to the output format failed
    EncodeFailed { format: String, message: String },
    /// Output file could not be written
    WriteFailed { path: String, message: String },
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputError::EncodeFailed { format, message } => {
                write!(f, "Failed to encode to {}: {}", format, message)
            }
            OutputError::WriteFailed { path, message } => {
                write!(f, "Failed to write {}: {}", path, message)
            }
        }
    }
}

impl std::error::Error for OutputError {}

impl OutputError {
    pub fn encode_failed(format: impl Into<String>, message: impl Into<String>) -> Self {
        OutputError::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn write_failed(path: impl Into<String>, message: impl Into<String>) -> Self {
        OutputError::WriteFailed {
            path: path.into(),
            message: message.into(),
        }
    }
}
