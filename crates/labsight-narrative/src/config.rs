//! Gemini credentials and model, persisted to llm-config.json.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{LLMConfigResponse, LLMConfigUpdate};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Stored LLM settings. Environment variables fill in what the file leaves out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    /// Alternate API root, e.g. a proxy. Defaults to Google's endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_base_url: Option<String>,
    #[serde(skip)]
    pub config_path: PathBuf,
}

fn default_gemini_model() -> String {
    DEFAULT_GEMINI_MODEL.into()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.into(),
            gemini_base_url: None,
            config_path: PathBuf::new(),
        }
    }
}

impl LLMConfig {
    /// Load from file, falling back to `GEMINI_*` env vars and defaults.
    pub fn load(config_path: &Path) -> Self {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    pub fn load_with<F>(config_path: &Path, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: LLMConfig = std::fs::read_to_string(config_path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();

        config.config_path = config_path.to_path_buf();
        config.gemini_api_key =
            non_empty(config.gemini_api_key.take()).or_else(|| non_empty(lookup("GEMINI_API_KEY")));
        config.gemini_base_url =
            non_empty(config.gemini_base_url.take()).or_else(|| non_empty(lookup("GEMINI_BASE_URL")));
        config
    }

    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(&self.config_path, json)?;
        info!("Saved LLM config to {}", self.config_path.display());
        Ok(())
    }

    /// Merge an update. An empty key clears the stored one.
    pub fn apply_update(&mut self, update: &LLMConfigUpdate) {
        if let Some(k) = &update.gemini_api_key {
            self.gemini_api_key = non_empty(Some(k.clone()));
        }
        if let Some(m) = non_empty(update.gemini_model.clone()) {
            self.gemini_model = m;
        }
    }

    /// `(model, api_key)` when a key is available.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.gemini_api_key
            .as_deref()
            .map(|key| (self.gemini_model.as_str(), key))
    }

    pub fn to_response(&self) -> LLMConfigResponse {
        LLMConfigResponse {
            gemini_configured: self.gemini_api_key.is_some(),
            gemini_model: self.gemini_model.clone(),
        }
    }
}
