//! Error types for the redaction engine.
//!
//! Collaborator failures never surface here: strategies record them as
//! findings and carry on. A `RedactorError` means the container itself could
//! not be handled, and the orchestrator falls back to a verbatim copy.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for redaction operations.
pub type RedactorResult<T> = Result<T, RedactorError>;

/// Comprehensive error type for all redaction operations.
#[derive(Debug, Error)]
pub enum RedactorError {
    /// Error occurred while reading or writing files
    #[error("IO error for path '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The container could not be opened or parsed
    #[error("Failed to open {format} document '{}': {reason}", path.display())]
    DocumentOpen {
        format: String,
        path: PathBuf,
        reason: String,
    },

    /// The rebuilt container could not be serialized
    #[error("Failed to save {format} document '{}': {reason}", path.display())]
    DocumentSave {
        format: String,
        path: PathBuf,
        reason: String,
    },

    /// Error occurred during PDF processing
    #[error("PDF processing error{}: {message}", page.map(|p| format!(" on page {}", p)).unwrap_or_default())]
    PdfProcessing {
        message: String,
        page: Option<usize>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid configuration or parameters
    #[error("Invalid input for '{parameter}': {reason}")]
    InvalidInput { parameter: String, reason: String },

    /// Backend-specific error (MuPDF, LoPDF, zip, ...)
    #[error("{backend} backend error: {message}")]
    BackendError {
        backend: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl RedactorError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Builds an open failure for `format` at `path`.
    pub fn open(format: &str, path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::DocumentOpen {
            format: format.to_string(),
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Builds a save failure for `format` at `path`.
    pub fn save(format: &str, path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::DocumentSave {
            format: format.to_string(),
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
