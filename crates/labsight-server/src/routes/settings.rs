//! Gemini settings routes.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use labsight_narrative::{LLMConfigResponse, LLMConfigUpdate};

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/llm/config", get(get_config).put(update_config))
}

async fn get_config(State(state): State<Arc<AppState>>) -> Json<LLMConfigResponse> {
    let config = state.llm_config.read();
    Json(config.to_response())
}

async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(update): Json<LLMConfigUpdate>,
) -> Result<Json<LLMConfigResponse>, ApiError> {
    let mut config = state.llm_config.write();
    config.apply_update(&update);
    config
        .save()
        .map_err(|e| ApiError::Internal(format!("Failed to save config: {}", e)))?;
    Ok(Json(config.to_response()))
}
