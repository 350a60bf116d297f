use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfDeskError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("No pages selected")]
    EmptySelection,

    #[error("Page {index} does not exist (document has {page_count} pages)")]
    PageIndexOutOfRange { index: u32, page_count: u32 },

    #[error("Failed to parse PDF: {0}")]
    MalformedPdf(String),

    #[error("Invalid page selection: {0}")]
    InvalidSelection(String),

    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    #[error("Failed to read DOCX: {0}")]
    Docx(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),
}

/// A font that could not be used. Never propagated as an error: the renderer
/// falls back to the builtin face and keeps this around for inspection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to load font {}: {reason}", .path.display())]
pub struct FontLoadFailure {
    pub path: PathBuf,
    pub reason: String,
}

impl FontLoadFailure {
    pub(crate) fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
