//! Error types for LabSight.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Vocabulary error: {0}")]
    Vocabulary(String),
}

pub type Result<T> = std::result::Result<T, Error>;
