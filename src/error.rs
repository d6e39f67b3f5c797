//! Error types for the report merger

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the report merger
///
/// Every variant aborts the whole merge; no output file is left behind.
#[derive(Error, Debug)]
pub enum Error {
    /// Input is missing, not a PDF, encrypted, or has a broken page tree
    #[error("Cannot read PDF {}: {reason}", .path.display())]
    UnreadableFile { path: PathBuf, reason: String },

    /// Footer does not fit on a page
    #[error("Cannot place footer on page {page_number} ({width:.1} x {height:.1} pt): {reason}")]
    Overlay {
        page_number: usize,
        width: f32,
        height: f32,
        reason: String,
    },

    /// Output could not be written
    #[error("Cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Main document has no pages and there are no trials
    #[error("Nothing to merge: {} has no pages and no trial documents were given", .0.display())]
    EmptyMerge(PathBuf),

    /// Cancelled by the caller between pages or stages
    #[error("Merge cancelled")]
    Cancelled,

    /// Request is malformed (e.g. run twice, zero page number)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// PDF processing error from the engine
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification reported to the presentation shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnreadableFile,
    Overlay,
    Write,
    EmptyMerge,
    Cancelled,
    InvalidRequest,
    Internal,
}

impl Error {
    /// Shorthand for an [`Error::UnreadableFile`]
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::UnreadableFile {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnreadableFile { .. } => ErrorKind::UnreadableFile,
            Error::Overlay { .. } => ErrorKind::Overlay,
            Error::Write { .. } => ErrorKind::Write,
            Error::EmptyMerge(_) => ErrorKind::EmptyMerge,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Error::Pdf(_) | Error::Io(_) => ErrorKind::Internal,
        }
    }
}
