use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChunkerError {
    #[error("failed to open document {}: {}", path.display(), reason)]
    DocumentOpen { path: PathBuf, reason: String },

    #[error("text layer extraction failed for page {page}: {reason}")]
    Extraction { page: usize, reason: String },

    #[error("OCR failed for page {page}: {reason}")]
    OcrEngine { page: usize, reason: String },

    #[error("invalid configuration: {0}")]
    Configuration(String),
}
