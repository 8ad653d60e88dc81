//! Document text extraction — PDF text layer or grayscale OCR.

use std::sync::Arc;

use tracing::{debug, info};

use crate::document::{ExtractedText, MediaKind, SourceDocument};
use crate::error::ExtractionError;
use crate::ocr::OcrEngine;
use crate::pdf;

pub const NO_TEXT_IN_PDF: &str = "No readable text found in the PDF.";
pub const NO_TEXT_IN_IMAGE: &str = "No readable text found in the image.";

/// Converts a `SourceDocument` into plain text.
///
/// Extraction is deterministic, so failures are final for the given bytes.
pub struct DocumentExtractor {
    ocr: Arc<dyn OcrEngine>,
}

impl DocumentExtractor {
    pub fn new(ocr: Arc<dyn OcrEngine>) -> Self {
        Self { ocr }
    }

    pub fn extract(&self, document: &SourceDocument) -> Result<ExtractedText, ExtractionError> {
        let text = match document.kind() {
            MediaKind::Pdf => {
                let text = pdf::extract_pdf_text(document.bytes())?;
                if text.is_empty() {
                    return Err(ExtractionError::Unreadable(NO_TEXT_IN_PDF.into()));
                }
                text
            }
            MediaKind::Image => {
                let text = self.extract_image(document.bytes())?;
                if text.is_empty() {
                    return Err(ExtractionError::Unreadable(NO_TEXT_IN_IMAGE.into()));
                }
                text
            }
        };

        info!(
            "Extracted {} chars from {} document {}",
            text.len(),
            document.kind(),
            document.content_hash()
        );
        Ok(ExtractedText::new(text))
    }

    fn extract_image(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| ExtractionError::DecodeFailure(format!("unable to load image: {}", e)))?;
        let gray = decoded.to_luma8();
        debug!(
            "Running {} OCR on {}x{} image",
            self.ocr.name(),
            gray.width(),
            gray.height()
        );

        let tokens = self.ocr.recognize(&gray)?;
        Ok(tokens.join("\n").trim().to_string())
    }
}
