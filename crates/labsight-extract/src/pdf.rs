//! PDF text-layer extraction.

use lopdf::Document;
use tracing::{debug, warn};

use crate::error::ExtractionError;

/// Extract the text layer of every page, in page order, newline-joined and trimmed.
///
/// A page whose text cannot be decoded contributes an empty string rather than
/// failing the whole document.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| ExtractionError::DecodeFailure(format!("invalid pdf: {}", e)))?;

    // BTreeMap keys are page numbers, already ascending.
    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    debug!("PDF has {} pages", page_numbers.len());

    let pages = page_numbers.iter().map(|&page| match doc.extract_text(&[page]) {
        Ok(text) => text,
        Err(e) => {
            warn!("Skipping unreadable text layer on page {}: {}", page, e);
            String::new()
        }
    });

    Ok(join_pages(pages))
}

/// Join per-page text with newlines and trim the result.
fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = pages
        .into_iter()
        .map(|p| p.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("\n");
    joined.trim().to_string()
}
