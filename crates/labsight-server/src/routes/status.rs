//! Service status route.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/status", get(get_status))
}

async fn get_status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let model = state.llm_config.read().gemini_model.clone();

    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "llmAvailable": state.narrative_provider().is_ok(),
        "llmModel": model,
        "ocrEngine": state.ocr_engine(),
        "headerFallback": state.config.header_fallback,
        "fuzzyThreshold": state.config.fuzzy_threshold,
        "activeSessions": state.conversations.len(),
        "doctorTypes": state.vocabulary.doctor_types.len(),
    }))
}
