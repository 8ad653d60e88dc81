//! Mapping from pipeline errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use labsight_extract::ExtractionError;
use labsight_narrative::ProviderError;
use labsight_report::AssembleError;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    UnsupportedMedia(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("{0}")]
    Internal(String),
}

impl From<AssembleError> for ApiError {
    fn from(e: AssembleError) -> Self {
        match e {
            AssembleError::Extraction(e) => Self::Extraction(e),
            AssembleError::Narrative(e) => Self::Provider(e),
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        Self::Internal(format!("I/O error: {}", e))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedMedia(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Extraction(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Extraction(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Provider(ProviderError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Provider(ProviderError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            Self::Provider(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{} {}", status.as_u16(), self);
        } else {
            warn!("{} {}", status.as_u16(), self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
