//! Narrative request types and the Gemini settings API surface.

use serde::{Deserialize, Serialize};

/// Chat message in conversation history. `role` is `user` or `assistant`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
        }
    }
}

/// What the user sends in the current turn.
#[derive(Debug, Clone, PartialEq)]
pub enum NarrativeContent {
    Text(String),
    /// An image plus the instruction that accompanies it.
    Image {
        mime_type: String,
        data: Vec<u8>,
        prompt: String,
    },
}

/// Sampling settings for one kind of request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationProfile {
    pub temperature: f64,
    pub max_tokens: usize,
}

impl GenerationProfile {
    /// Symptom diagnosis and report summaries.
    pub const DIAGNOSIS: Self = Self {
        temperature: 0.4,
        max_tokens: 500,
    };
    /// Clinician support chat.
    pub const SUPPORT: Self = Self {
        temperature: 0.8,
        max_tokens: 400,
    };
    /// Long-form document summaries.
    pub const REPORT: Self = Self {
        temperature: 0.4,
        max_tokens: 1024,
    };
}

impl Default for GenerationProfile {
    fn default() -> Self {
        Self::DIAGNOSIS
    }
}

/// One call to a narrative provider.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeRequest {
    pub system_context: String,
    pub history: Vec<ChatMessage>,
    pub content: NarrativeContent,
    pub profile: GenerationProfile,
}

impl NarrativeRequest {
    pub fn text(system_context: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system_context: system_context.into(),
            history: Vec::new(),
            content: NarrativeContent::Text(prompt.into()),
            profile: GenerationProfile::default(),
        }
    }

    pub fn image(
        system_context: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            system_context: system_context.into(),
            history: Vec::new(),
            content: NarrativeContent::Image {
                mime_type: mime_type.into(),
                data,
                prompt: prompt.into(),
            },
            profile: GenerationProfile::default(),
        }
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn with_profile(mut self, profile: GenerationProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Text of the current turn, used for logs and conversation records.
    pub fn prompt_text(&self) -> &str {
        match &self.content {
            NarrativeContent::Text(text) => text,
            NarrativeContent::Image { prompt, .. } => prompt,
        }
    }
}

/// Gemini settings as reported to clients. The key itself is never returned.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LLMConfigResponse {
    pub gemini_configured: bool,
    pub gemini_model: String,
}

/// Partial settings update; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LLMConfigUpdate {
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
}
