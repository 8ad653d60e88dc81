//! Document routes: PDF summaries, lab report findings and scan analysis.

use std::sync::Arc;

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::routing::post;
use axum::{Json, Router};
use labsight_extract::{MediaKind, SourceDocument};
use labsight_narrative::NarrativeProvider;
use labsight_report::{prompts, ReportPayload};
use serde::Serialize;
use tracing::info;

use super::diagnosis::{self, PromptRequest};
use crate::error::ApiError;
use crate::state::AppState;
use crate::upload::{self, UploadedFile};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/generate-report", post(generate_report))
        .route("/generate-image-report", post(generate_image_report))
        .route("/generate-scan-report", post(generate_scan_report))
}

#[derive(Debug, Serialize)]
pub struct SummaryReply {
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct ScanReply {
    pub response: String,
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

fn to_document(upload: &UploadedFile) -> Result<SourceDocument, ApiError> {
    SourceDocument::from_upload(
        upload.bytes.clone(),
        upload.filename_opt(),
        upload.content_type.as_deref(),
    )
    .ok_or_else(|| ApiError::UnsupportedMedia("Upload a PDF or an image file.".into()))
}

/// POST /generate-report — plain-language summary of a PDF.
async fn generate_report(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<SummaryReply>, ApiError> {
    let upload = upload::read_file_field(&mut multipart, "file").await?;
    upload.require_filename()?;
    let document = to_document(&upload)?;
    if document.kind() != MediaKind::Pdf {
        return Err(ApiError::UnsupportedMedia("Expected a PDF document.".into()));
    }

    upload::save_upload(&state.config.data_paths.uploads, &upload).await?;
    let provider = state.narrative_provider()?;
    let summary = state.assembler.summarize_pdf(document, provider.as_ref()).await?;

    Ok(Json(SummaryReply { summary }))
}

/// POST /generate-image-report — abnormal lab values plus narrative.
async fn generate_image_report(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ReportPayload>, ApiError> {
    let upload = upload::read_file_field(&mut multipart, "file").await?;
    upload.require_filename()?;
    let document = to_document(&upload)?;

    upload::save_upload(&state.config.data_paths.uploads, &upload).await?;
    let provider = state.narrative_provider()?;
    let payload = state.assembler.assemble(document, provider.as_ref()).await?;

    info!(
        "{}: {} abnormal tests",
        upload.filename,
        payload.abnormal_findings.len()
    );
    Ok(Json(payload))
}

/// POST /generate-scan-report — an `image` upload is sent to the model as is;
/// a JSON `{prompt}` continues the diagnosis conversation.
async fn generate_scan_report(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<ScanReply>, ApiError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        let upload = upload::read_file_field(&mut multipart, "image").await?;
        let document = to_document(&upload)?;
        if document.kind() != MediaKind::Image {
            return Err(ApiError::UnsupportedMedia(
                "Scan analysis needs an image file.".into(),
            ));
        }

        let provider = state.narrative_provider()?;
        let mime_type = document.mime_type();
        let response = provider
            .generate(prompts::scan_image(mime_type, upload.bytes))
            .await?;
        return Ok(Json(ScanReply {
            response,
            session_id: None,
        }));
    }

    if content_type.starts_with("application/json") {
        let Json(req) = Json::<PromptRequest>::from_request(request, &state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        let (session_id, response) = diagnosis::diagnose(&state, &req).await?;
        return Ok(Json(ScanReply {
            response,
            session_id: Some(session_id),
        }));
    }

    Err(ApiError::UnsupportedMedia(
        "Unsupported Media Type. Send JSON or an image file.".into(),
    ))
}
