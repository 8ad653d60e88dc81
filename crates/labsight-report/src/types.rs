//! Report payload and assembly errors.

use labsight_extract::{ExtractionError, FindingSet};
use labsight_narrative::ProviderError;
use serde::Serialize;
use thiserror::Error;

/// Result of assembling one uploaded lab report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportPayload {
    pub summary: String,
    #[serde(rename = "abnormal_tests")]
    pub abnormal_findings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub possible_conditions: Option<String>,
    /// Structured values behind `abnormal_findings`.
    #[serde(skip)]
    pub finding_set: FindingSet,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssembleError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Narrative(#[from] ProviderError),
}
