//! LabSight Core — configuration, reference vocabulary, shared errors.

pub mod config;
pub mod error;
pub mod vocabulary;

pub use config::{DataPaths, LabsightConfig, OcrSettings, SessionLimits};
pub use error::{Error, Result};
pub use vocabulary::Vocabulary;
