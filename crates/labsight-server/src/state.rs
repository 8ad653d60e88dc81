//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use labsight_core::{LabsightConfig, Vocabulary};
use labsight_extract::{AbnormalValueDetector, DocumentExtractor, OcrEngine, TesseractOcr};
use labsight_narrative::{
    ConversationStore, DoctorTypeTagger, GeminiProvider, LLMConfig, NarrativeProvider,
    ProviderError,
};
use labsight_report::FindingAssembler;
use parking_lot::RwLock;
use tracing::info;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: LabsightConfig,
    pub vocabulary: Arc<Vocabulary>,
    pub assembler: FindingAssembler,
    pub tagger: DoctorTypeTagger,
    pub llm_config: RwLock<LLMConfig>,
    pub conversations: ConversationStore,
    pub http: reqwest::Client,
    ocr_engine: String,
    fixed_provider: Option<Arc<dyn NarrativeProvider>>,
}

impl AppState {
    /// State with the persisted LLM config and the Tesseract OCR engine.
    pub fn new(config: LabsightConfig, vocabulary: Vocabulary) -> Self {
        let llm_config = LLMConfig::load(&config.data_paths.llm_config_file);
        let ocr: Arc<dyn OcrEngine> = Arc::new(TesseractOcr::new(config.ocr.clone()));
        Self::with_parts(config, vocabulary, llm_config, ocr)
    }

    pub fn with_parts(
        config: LabsightConfig,
        vocabulary: Vocabulary,
        llm_config: LLMConfig,
        ocr: Arc<dyn OcrEngine>,
    ) -> Self {
        let vocabulary = Arc::new(vocabulary);
        let ocr_engine = ocr.name().to_string();
        let detector = AbnormalValueDetector::from_config(&config, vocabulary.clone());
        let assembler = FindingAssembler::new(
            Arc::new(DocumentExtractor::new(ocr)),
            Arc::new(detector),
        );
        let tagger = DoctorTypeTagger::new(&vocabulary);
        let conversations = ConversationStore::new(config.sessions);

        info!(
            "State ready: ocr={}, header_fallback={}, {} doctor types",
            ocr_engine,
            config.header_fallback,
            vocabulary.doctor_types.len()
        );

        Self {
            config,
            vocabulary,
            assembler,
            tagger,
            llm_config: RwLock::new(llm_config),
            conversations,
            http: reqwest::Client::new(),
            ocr_engine,
            fixed_provider: None,
        }
    }

    /// Serve every narrative request from `provider` instead of the stored
    /// Gemini settings.
    pub fn with_provider(mut self, provider: Arc<dyn NarrativeProvider>) -> Self {
        self.fixed_provider = Some(provider);
        self
    }

    /// Provider for the current settings; `NotConfigured` without a key.
    pub fn narrative_provider(&self) -> Result<Arc<dyn NarrativeProvider>, ProviderError> {
        if let Some(provider) = &self.fixed_provider {
            return Ok(provider.clone());
        }
        let llm_config = self.llm_config.read();
        let provider = GeminiProvider::from_config(
            &llm_config,
            self.http.clone(),
            Duration::from_secs(self.config.provider_timeout_secs),
        )?;
        Ok(Arc::new(provider))
    }

    pub fn ocr_engine(&self) -> &str {
        &self.ocr_engine
    }
}
