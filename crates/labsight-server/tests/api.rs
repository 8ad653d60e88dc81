//! Router tests: drive the full axum app in memory. Without a provider the
//! tests check validation and error mapping; with a scripted provider and a
//! fixed OCR engine they check the success payloads.

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use image::{GrayImage, ImageFormat, Luma};
use labsight_core::{LabsightConfig, OcrSettings, Vocabulary};
use labsight_extract::{ExtractionError, OcrEngine, TesseractOcr};
use labsight_narrative::{LLMConfig, NarrativeProvider, NarrativeRequest, ProviderError};
use labsight_server::{build_router, AppState};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "labsight-test-boundary";

struct FixedOcr(Vec<String>);

impl OcrEngine for FixedOcr {
    fn recognize(&self, _image: &GrayImage) -> Result<Vec<String>, ExtractionError> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Answers with canned replies in order and keeps every request.
struct ScriptedProvider {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<NarrativeRequest>>,
}

impl ScriptedProvider {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<NarrativeRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl NarrativeProvider for ScriptedProvider {
    async fn generate(&self, request: NarrativeRequest) -> Result<String, ProviderError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(ProviderError::Empty)
    }
}

fn build_app(ocr: Arc<dyn OcrEngine>, provider: Option<Arc<dyn NarrativeProvider>>) -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = LabsightConfig::from_lookup(dir.path(), |_| None).unwrap();
    let llm_config = LLMConfig::load_with(&config.data_paths.llm_config_file, |_| None);
    let mut state = AppState::with_parts(config, Vocabulary::default(), llm_config, ocr);
    if let Some(provider) = provider {
        state = state.with_provider(provider);
    }
    (build_router(Arc::new(state)), dir)
}

fn test_app() -> (Router, TempDir) {
    build_app(Arc::new(TesseractOcr::new(OcrSettings::default())), None)
}

fn scripted_app(ocr_tokens: &[&str], replies: &[&str]) -> (Router, TempDir, Arc<ScriptedProvider>) {
    let ocr = FixedOcr(ocr_tokens.iter().map(|t| t.to_string()).collect());
    let provider = ScriptedProvider::new(replies);
    let (app, dir) = build_app(Arc::new(ocr), Some(provider.clone()));
    (app, dir, provider)
}

fn png_bytes() -> Vec<u8> {
    let img = GrayImage::from_pixel(4, 4, Luma([255u8]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Single-page PDF whose text layer is `text`.
fn pdf_bytes(text: &str) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(uri: &str, field: &str, filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_missing_prompt_is_bad_request() {
    let (app, _dir) = test_app();
    let (status, body) = send(app, json_request("POST", "/generate-diagnosis", "{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Prompt is required");
}

#[tokio::test]
async fn test_chat_without_provider_is_unavailable() {
    let (app, _dir) = test_app();
    let (status, body) = send(
        app,
        json_request("POST", "/generate-doctor", r#"{"prompt":"chest pain"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "No LLM provider configured");
}

#[tokio::test]
async fn test_scan_report_rejects_plain_text() {
    let (app, _dir) = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/generate-scan-report")
        .header("content-type", "text/plain")
        .body(Body::from("diagnose me"))
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"], "Unsupported Media Type. Send JSON or an image file.");
}

#[tokio::test]
async fn test_scan_report_json_requires_prompt() {
    let (app, _dir) = test_app();
    let (status, _) = send(app, json_request("POST", "/generate-scan-report", r#"{"prompt":""}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_image_report_without_file_field() {
    let (app, _dir) = test_app();
    let request = multipart_request("/generate-image-report", "attachment", "cbc.png", "image/png", b"x");
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn test_image_report_rejects_unknown_media() {
    let (app, dir) = test_app();
    let request = multipart_request("/generate-image-report", "file", "notes.txt", "text/plain", b"hello");
    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let saved = std::fs::read_dir(dir.path().join("uploads")).unwrap().count();
    assert_eq!(saved, 0);
}

#[tokio::test]
async fn test_pdf_report_rejects_images() {
    let (app, _dir) = test_app();
    let png_magic = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    let request = multipart_request("/generate-report", "file", "scan.png", "image/png", &png_magic);
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"], "Expected a PDF document.");
}

#[tokio::test]
async fn test_pdf_report_saves_upload_before_provider_check() {
    let (app, dir) = test_app();
    let request = multipart_request("/generate-report", "file", "cbc.pdf", "application/pdf", b"%PDF-1.4\n");
    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(dir.path().join("uploads").join("cbc.pdf").exists());
}

#[tokio::test]
async fn test_status_shape() {
    let (app, _dir) = test_app();
    let request = Request::builder().uri("/api/status").body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["llmAvailable"], false);
    assert_eq!(body["llmModel"], "gemini-2.5-flash");
    assert_eq!(body["ocrEngine"], "tesseract");
    assert_eq!(body["fuzzyThreshold"], 70);
    assert_eq!(body["headerFallback"], false);
    assert!(body["doctorTypes"].as_u64().unwrap() > 100);
}

#[tokio::test]
async fn test_llm_config_update_persists() {
    let (app, dir) = test_app();
    let (status, body) = send(
        app.clone(),
        json_request("PUT", "/api/llm/config", r#"{"geminiApiKey":"g-test"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["geminiConfigured"], true);
    assert_eq!(body["geminiModel"], "gemini-2.5-flash");
    assert!(body.get("geminiApiKey").is_none());
    assert!(dir.path().join("llm-config.json").exists());

    let request = Request::builder().uri("/api/llm/config").body(Body::empty()).unwrap();
    let (_, body) = send(app.clone(), request).await;
    assert_eq!(body["geminiConfigured"], true);

    let request = Request::builder().uri("/api/status").body(Body::empty()).unwrap();
    let (_, body) = send(app, request).await;
    assert_eq!(body["llmAvailable"], true);
}

#[tokio::test]
async fn test_cors_allows_frontend_origin() {
    let (app, _dir) = test_app();
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/generate-diagnosis")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://localhost:3000"
    );
}

#[tokio::test]
async fn test_image_report_with_abnormal_values() {
    let (app, dir, provider) = scripted_app(
        &["Glucose 140 mg/dL 70-110", "Hemoglobin 13.5 g/dL 12-16"],
        &["Mostly normal panel.", "Possible prediabetes."],
    );
    let request = multipart_request("/generate-image-report", "file", "cbc.png", "image/png", &png_bytes());
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "Mostly normal panel.");
    assert_eq!(
        body["abnormal_tests"],
        serde_json::json!(["Glucose (140.0 mg/dL) is **HIGH** (Normal: 70.0-110.0 mg/dL)"])
    );
    assert_eq!(body["possible_conditions"], "Possible prediabetes.");
    assert!(dir.path().join("uploads").join("cbc.png").exists());

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].prompt_text().contains("Hemoglobin 13.5 g/dL 12-16"));
    assert!(requests[1].prompt_text().contains("Glucose (140.0 mg/dL)"));
}

#[tokio::test]
async fn test_image_report_all_normal_omits_conditions() {
    let (app, _dir, provider) = scripted_app(&["Hemoglobin 13.5 g/dL 12-16"], &["All values normal."]);
    let request = multipart_request("/generate-image-report", "file", "cbc.png", "image/png", &png_bytes());
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "All values normal.");
    assert_eq!(body["abnormal_tests"], serde_json::json!([]));
    assert!(body.get("possible_conditions").is_none());
    assert_eq!(provider.requests().len(), 1);
}

#[tokio::test]
async fn test_image_report_provider_failure_is_bad_gateway() {
    let (app, _dir, _provider) = scripted_app(&["Glucose 140 mg/dL 70-110"], &[]);
    let request = multipart_request("/generate-image-report", "file", "cbc.png", "image/png", &png_bytes());
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Provider returned an empty response");
}

#[tokio::test]
async fn test_diagnosis_tags_doctor_and_keeps_session() {
    let (app, _dir, provider) = scripted_app(
        &[],
        &[
            "Likely kidney stones (80%). Please see a urologist within a week.",
            "Drink plenty of water.",
        ],
    );
    let (status, body) = send(
        app.clone(),
        json_request("POST", "/generate-diagnosis", r#"{"prompt":"sharp flank pain"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["doctor_type"], "Urologist");
    let session_id = body["sessionId"].as_str().unwrap().to_string();
    assert!(!session_id.is_empty());

    let follow_up = format!(r#"{{"prompt":"what should I do now?","sessionId":"{}"}}"#, session_id);
    let (status, body) = send(app, json_request("POST", "/generate-diagnosis", &follow_up)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["doctor_type"], "No doctor type found");
    assert_eq!(body["sessionId"], session_id.as_str());

    let requests = provider.requests();
    assert!(requests[0].history.is_empty());
    assert_eq!(requests[1].history.len(), 2);
    assert_eq!(requests[1].history[0].content, "sharp flank pain");
}

#[tokio::test]
async fn test_pdf_report_returns_summary() {
    let (app, _dir, provider) = scripted_app(&[], &["Your glucose is high."]);
    let pdf = pdf_bytes("Glucose 140 mg/dL 70-110");
    let request = multipart_request("/generate-report", "file", "panel.pdf", "application/pdf", &pdf);
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "Your glucose is high.");
    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].prompt_text().contains("Glucose 140"));
}

#[tokio::test]
async fn test_scan_image_sent_without_context() {
    let (app, _dir, provider) = scripted_app(&[], &["No fracture visible."]);
    let request = multipart_request("/generate-scan-report", "image", "xray.png", "image/png", &png_bytes());
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "No fracture visible.");
    assert!(body.get("sessionId").is_none());
    let requests = provider.requests();
    assert!(requests[0].system_context.is_empty());
    assert_eq!(requests[0].prompt_text(), "diagnose.");
}
