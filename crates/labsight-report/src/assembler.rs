//! Finding assembler: document → findings → narrative payload.

use std::sync::Arc;
use std::time::Instant;

use labsight_extract::{
    AbnormalValueDetector, DocumentExtractor, ExtractedText, ExtractionError, FindingSet,
    SourceDocument,
};
use labsight_narrative::NarrativeProvider;
use tracing::{debug, info, warn};

use crate::prompts;
use crate::types::{AssembleError, ReportPayload};

/// Coordinates extraction, detection and the narrative requests for one report.
#[derive(Clone)]
pub struct FindingAssembler {
    extractor: Arc<DocumentExtractor>,
    detector: Arc<AbnormalValueDetector>,
}

impl FindingAssembler {
    pub fn new(extractor: Arc<DocumentExtractor>, detector: Arc<AbnormalValueDetector>) -> Self {
        Self {
            extractor,
            detector,
        }
    }

    /// Extract text on the blocking pool.
    pub async fn extract_text(&self, document: SourceDocument) -> Result<ExtractedText, ExtractionError> {
        let extractor = self.extractor.clone();
        tokio::task::spawn_blocking(move || extractor.extract(&document))
            .await
            .map_err(|e| ExtractionError::Backend(format!("extraction task failed: {}", e)))?
    }

    /// Extract and detect on the blocking pool.
    pub async fn findings(&self, document: SourceDocument) -> Result<FindingSet, ExtractionError> {
        let extractor = self.extractor.clone();
        let detector = self.detector.clone();
        tokio::task::spawn_blocking(move || {
            let text = extractor.extract(&document)?;
            Ok(detector.finding_set(text))
        })
        .await
        .map_err(|e| ExtractionError::Backend(format!("extraction task failed: {}", e)))?
    }

    /// Full lab report: summary always, possible conditions when abnormal
    /// values were found. A failed conditions request drops that field only.
    pub async fn assemble(
        &self,
        document: SourceDocument,
        provider: &dyn NarrativeProvider,
    ) -> Result<ReportPayload, AssembleError> {
        let start = Instant::now();
        let hash = document.content_hash();
        let finding_set = self.findings(document).await?;
        debug!(
            "Document {}: {} abnormal findings",
            hash,
            finding_set.findings.len()
        );

        let summary = provider
            .generate(prompts::report_summary(finding_set.extracted_text.as_str()))
            .await?;

        let abnormal_findings = finding_set.formatted_findings();
        let possible_conditions = if abnormal_findings.is_empty() {
            None
        } else {
            match provider
                .generate(prompts::possible_conditions(&abnormal_findings))
                .await
            {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!("Possible conditions unavailable for {}: {}", hash, e);
                    None
                }
            }
        };

        info!(
            "Assembled report {} in {}ms",
            hash,
            start.elapsed().as_millis()
        );
        Ok(ReportPayload {
            summary,
            abnormal_findings,
            possible_conditions,
            finding_set,
        })
    }

    /// Plain-language summary of a PDF, without value detection.
    pub async fn summarize_pdf(
        &self,
        document: SourceDocument,
        provider: &dyn NarrativeProvider,
    ) -> Result<String, AssembleError> {
        let text = self.extract_text(document).await?;
        Ok(provider.generate(prompts::pdf_summary(text.as_str())).await?)
    }
}
