//! OCR backends.
//!
//! `OcrEngine` turns a grayscale raster into word tokens in reading order.
//! `TesseractOcr` drives the `tesseract` CLI in TSV mode; tests substitute
//! their own engine.

use std::process::Command;

use image::{GrayImage, ImageFormat};
use labsight_core::OcrSettings;
use tracing::debug;

use crate::error::ExtractionError;

/// Trait for OCR engines.
pub trait OcrEngine: Send + Sync {
    /// Recognize word tokens, left-to-right/top-to-bottom as the engine emits them.
    fn recognize(&self, image: &GrayImage) -> Result<Vec<String>, ExtractionError>;

    /// Engine name for logs.
    fn name(&self) -> &str;
}

/// Tesseract CLI engine.
pub struct TesseractOcr {
    settings: OcrSettings,
}

impl TesseractOcr {
    pub fn new(settings: OcrSettings) -> Self {
        Self { settings }
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &GrayImage) -> Result<Vec<String>, ExtractionError> {
        let input = tempfile::Builder::new()
            .prefix("labsight-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| ExtractionError::Backend(format!("temp file: {}", e)))?;
        image
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|e| ExtractionError::Backend(format!("writing OCR input: {}", e)))?;

        let output = Command::new(&self.settings.tesseract_cmd)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.settings.language)
            .arg("tsv")
            .output()
            .map_err(|e| {
                ExtractionError::Backend(format!(
                    "failed to run {}: {}",
                    self.settings.tesseract_cmd, e
                ))
            })?;

        if !output.status.success() {
            return Err(ExtractionError::Backend(format!(
                "tesseract exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        let tokens = parse_tsv_tokens(&tsv);
        debug!("tesseract produced {} tokens", tokens.len());
        Ok(tokens)
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

/// Pull the `text` column out of Tesseract's TSV output.
///
/// Structural rows (page/block/paragraph/line) carry an empty text cell; they
/// are kept so line breaks survive the newline join.
pub fn parse_tsv_tokens(tsv: &str) -> Vec<String> {
    let mut lines = tsv.lines();
    let text_col = match lines.next() {
        Some(header) => match header.split('\t').position(|h| h == "text") {
            Some(idx) => idx,
            None => return Vec::new(),
        },
        None => return Vec::new(),
    };

    lines
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.split('\t')
                .nth(text_col)
                .unwrap_or("")
                .to_string()
        })
        .collect()
}
