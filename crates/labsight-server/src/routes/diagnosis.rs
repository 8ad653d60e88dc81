//! Symptom chat routes: clinician support and patient diagnosis.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use labsight_narrative::{GenerationProfile, NarrativeProvider, NarrativeRequest};
use labsight_report::prompts;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/generate-doctor", post(generate_doctor))
        .route("/generate-diagnosis", post(generate_diagnosis))
}

/// Chat request body. `sessionId` continues an earlier conversation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct DiagnosisReply {
    pub response: String,
    pub doctor_type: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// POST /generate-doctor — support chat for medical professionals.
async fn generate_doctor(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PromptRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    let (session_id, response) =
        converse(&state, &req, prompts::SUPPORT_CONTEXT, GenerationProfile::SUPPORT).await?;
    Ok(Json(ChatReply {
        response,
        session_id,
    }))
}

/// POST /generate-diagnosis — symptom diagnosis with doctor-type tagging.
async fn generate_diagnosis(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PromptRequest>,
) -> Result<Json<DiagnosisReply>, ApiError> {
    let (session_id, response) = diagnose(&state, &req).await?;
    let doctor_type = state.tagger.describe(&response);
    debug!("Matched doctor types: {}", doctor_type);

    Ok(Json(DiagnosisReply {
        response,
        doctor_type,
        session_id,
    }))
}

/// Diagnosis conversation turn, shared with the scan endpoint's text mode.
pub(crate) async fn diagnose(
    state: &AppState,
    req: &PromptRequest,
) -> Result<(String, String), ApiError> {
    converse(state, req, prompts::DIAGNOSIS_CONTEXT, GenerationProfile::DIAGNOSIS).await
}

/// One turn in a session: validate, replay history, record the exchange.
async fn converse(
    state: &AppState,
    req: &PromptRequest,
    context: &str,
    profile: GenerationProfile,
) -> Result<(String, String), ApiError> {
    let prompt = req.prompt.trim();
    if prompt.is_empty() {
        return Err(ApiError::BadRequest("Prompt is required".into()));
    }

    let provider = state.narrative_provider()?;
    let session_id = state.conversations.open(req.session_id.as_deref());
    let history = state.conversations.history(&session_id);

    let start = Instant::now();
    let turns = history.len() / 2;
    let request = NarrativeRequest::text(context, prompt)
        .with_history(history)
        .with_profile(profile);
    let response = provider.generate(request).await?;

    state.conversations.record(&session_id, prompt, &response);
    info!(
        "Session {} turn {} answered in {}ms",
        session_id,
        turns + 1,
        start.elapsed().as_millis()
    );
    Ok((session_id, response))
}
