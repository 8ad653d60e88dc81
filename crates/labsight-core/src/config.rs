//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Default similarity threshold for fuzzy label matching.
pub const DEFAULT_FUZZY_THRESHOLD: u8 = 70;

/// Paths to all LabSight data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Uploaded documents (`data/uploads/`).
    pub uploads: PathBuf,
    /// LLM configuration (`data/llm-config.json`).
    pub llm_config_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            uploads: root.join("uploads"),
            llm_config_file: root.join("llm-config.json"),
            root,
        };
        std::fs::create_dir_all(&paths.uploads)?;
        Ok(paths)
    }
}

/// OCR backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrSettings {
    /// Tesseract executable name or path.
    pub tesseract_cmd: String,
    /// Tesseract language pack (e.g. `eng`).
    pub language: String,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            tesseract_cmd: "tesseract".into(),
            language: "eng".into(),
        }
    }
}

/// Bounds on server-side conversation history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SessionLimits {
    /// Sessions kept at once; the least recently used is evicted beyond this.
    pub max_sessions: usize,
    /// Turns kept per session; oldest turns are dropped first.
    pub max_turns: usize,
    /// Idle seconds after which a session is discarded.
    pub idle_ttl_secs: u64,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_sessions: 256,
            max_turns: 20,
            idle_ttl_secs: 1800,
        }
    }
}

/// Top-level LabSight configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabsightConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Scores at or below this are treated as "no match" by the fuzzy matcher.
    pub fuzzy_threshold: u8,
    /// Run the header/column parser when the row regex finds nothing.
    pub header_fallback: bool,
    /// Upper bound on a single narrative provider call.
    pub provider_timeout_secs: u64,
    /// Maximum accepted upload size in megabytes.
    pub max_upload_mb: usize,
    /// Origin allowed by CORS (the web frontend).
    pub cors_origin: String,
    pub ocr: OcrSettings,
    pub sessions: SessionLimits,
    /// Optional JSON file replacing the built-in vocabulary tables.
    pub vocabulary_file: Option<PathBuf>,
}

impl LabsightConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        Self::from_lookup(data_dir, |key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(data_dir: impl AsRef<Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_paths = DataPaths::new(data_dir)?;

        let fuzzy_threshold: u8 = parse_or(&lookup, "LABSIGHT_FUZZY_THRESHOLD", DEFAULT_FUZZY_THRESHOLD)?;
        if fuzzy_threshold > 100 {
            return Err(Error::Config(format!(
                "LABSIGHT_FUZZY_THRESHOLD must be within 0..=100, got {}",
                fuzzy_threshold
            )));
        }

        let defaults = SessionLimits::default();
        let sessions = SessionLimits {
            max_sessions: parse_or(&lookup, "LABSIGHT_MAX_SESSIONS", defaults.max_sessions)?,
            max_turns: parse_or(&lookup, "LABSIGHT_MAX_TURNS", defaults.max_turns)?,
            idle_ttl_secs: parse_or(&lookup, "LABSIGHT_SESSION_TTL_SECS", defaults.idle_ttl_secs)?,
        };

        let ocr_defaults = OcrSettings::default();
        let ocr = OcrSettings {
            tesseract_cmd: lookup("LABSIGHT_TESSERACT_CMD").unwrap_or(ocr_defaults.tesseract_cmd),
            language: lookup("LABSIGHT_OCR_LANG").unwrap_or(ocr_defaults.language),
        };

        Ok(Self {
            port: parse_or(&lookup, "PORT", 5500)?,
            data_paths,
            fuzzy_threshold,
            header_fallback: parse_flag(lookup("LABSIGHT_HEADER_FALLBACK").as_deref()),
            provider_timeout_secs: parse_or(&lookup, "LABSIGHT_PROVIDER_TIMEOUT_SECS", 60)?,
            max_upload_mb: parse_or(&lookup, "LABSIGHT_MAX_UPLOAD_MB", 20)?,
            cors_origin: lookup("LABSIGHT_CORS_ORIGIN")
                .unwrap_or_else(|| "http://localhost:3000".into()),
            ocr,
            sessions,
            vocabulary_file: lookup("LABSIGHT_VOCABULARY_FILE").map(PathBuf::from),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("invalid value for {}: {:?}", key, raw))),
        None => Ok(default),
    }
}

fn parse_flag(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|s| s.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = LabsightConfig::from_lookup(dir.path(), lookup_from(&[])).unwrap();
        assert_eq!(config.port, 5500);
        assert_eq!(config.fuzzy_threshold, DEFAULT_FUZZY_THRESHOLD);
        assert!(!config.header_fallback);
        assert_eq!(config.provider_timeout_secs, 60);
        assert_eq!(config.ocr.tesseract_cmd, "tesseract");
        assert_eq!(config.sessions.max_turns, 20);
        assert!(config.data_paths.uploads.is_dir());
    }

    #[test]
    fn test_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let config = LabsightConfig::from_lookup(
            dir.path(),
            lookup_from(&[
                ("PORT", "8080"),
                ("LABSIGHT_FUZZY_THRESHOLD", "85"),
                ("LABSIGHT_HEADER_FALLBACK", "true"),
                ("LABSIGHT_OCR_LANG", "deu"),
                ("LABSIGHT_MAX_SESSIONS", "4"),
            ]),
        )
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.fuzzy_threshold, 85);
        assert!(config.header_fallback);
        assert_eq!(config.ocr.language, "deu");
        assert_eq!(config.sessions.max_sessions, 4);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let bad_port =
            LabsightConfig::from_lookup(dir.path(), lookup_from(&[("PORT", "eighty")]));
        assert!(matches!(bad_port, Err(Error::Config(_))));

        let bad_threshold = LabsightConfig::from_lookup(
            dir.path(),
            lookup_from(&[("LABSIGHT_FUZZY_THRESHOLD", "120")]),
        );
        assert!(matches!(bad_threshold, Err(Error::Config(_))));
    }
}
