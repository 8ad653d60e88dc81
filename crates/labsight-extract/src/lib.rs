//! LabSight Extract — document text extraction and abnormal lab value detection.
//!
//! Pipeline: `SourceDocument` → `DocumentExtractor` (PDF text layer or OCR) →
//! `ExtractedText` → `AbnormalValueDetector` → `FindingSet`.

pub mod detect;
pub mod document;
pub mod error;
pub mod extractor;
pub mod finding;
pub mod fuzzy;
pub mod ocr;
pub mod pdf;

pub use detect::{AbnormalValueDetector, HeaderColumnParser, RawRow, RegexRowParser, RowParser};
pub use document::{ExtractedText, MediaKind, SourceDocument};
pub use error::ExtractionError;
pub use extractor::DocumentExtractor;
pub use finding::{FindingSet, FindingStatus, LabFinding};
pub use fuzzy::FuzzyMatcher;
pub use ocr::{OcrEngine, TesseractOcr};
