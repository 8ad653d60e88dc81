//! LabSight Report — turns an uploaded document into a report payload.
//!
//! Runs extraction and detection off the async runtime, then asks the
//! narrative provider for a summary and, when abnormal values were found, for
//! possible conditions.

pub mod assembler;
pub mod prompts;
pub mod types;

pub use assembler::FindingAssembler;
pub use types::*;
