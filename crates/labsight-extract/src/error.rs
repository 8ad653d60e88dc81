//! Extraction errors.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The document decoded but yielded no text.
    #[error("{0}")]
    Unreadable(String),

    /// The bytes are not a valid PDF or image.
    #[error("Could not decode document: {0}")]
    DecodeFailure(String),

    /// The OCR/PDF backend itself failed (missing binary, crash).
    #[error("Extraction backend error: {0}")]
    Backend(String),
}

impl ExtractionError {
    /// True when the caller supplied an unusable document.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Backend(_))
    }
}
