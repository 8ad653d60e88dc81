//! Gemini narrative provider.
//!
//! Requests go to `streamGenerateContent` with `alt=sse`; the token stream is
//! collected into one narrative under a timeout.

use std::pin::Pin;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures::Stream;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use thiserror::Error;
use tokio_stream::StreamExt;
use tracing::{debug, error, info};

use crate::config::LLMConfig;
use crate::types::{NarrativeContent, NarrativeRequest};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Why a narrative could not be produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("No LLM provider configured")]
    NotConfigured,

    #[error("Request failed: {0}")]
    Network(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Content rejected by provider: {0}")]
    Rejected(String),

    #[error("Provider did not respond within {0:?}")]
    Timeout(Duration),

    #[error("Provider returned an empty response")]
    Empty,
}

/// Source of narrative text for the pipeline.
#[async_trait]
pub trait NarrativeProvider: Send + Sync {
    async fn generate(&self, request: NarrativeRequest) -> Result<String, ProviderError>;
}

type BoxedStream = Pin<Box<dyn Stream<Item = StreamChunk> + Send>>;

#[derive(Debug, Clone, PartialEq)]
enum StreamChunk {
    Token(String),
    Done { tokens_used: usize },
    Error(ProviderError),
}

/// Outcome of one SSE `data:` payload.
#[derive(Debug, Clone, PartialEq)]
enum SseEvent {
    Token(String),
    Fail(ProviderError),
    Ignore,
}

/// Send the request and turn the SSE body into chunks.
fn drive_sse(builder: RequestBuilder) -> impl Stream<Item = StreamChunk> + Send + 'static {
    async_stream::stream! {
        let response = match builder.send().await {
            Ok(r) => r,
            Err(e) => {
                yield StreamChunk::Error(ProviderError::Network(e.to_string()));
                return;
            }
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            yield StreamChunk::Error(ProviderError::Api { status, body });
            return;
        }

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut token_count = 0usize;
        let mut finished = false;

        loop {
            match stream.next().await {
                Some(Ok(bytes)) => buffer.push_str(&String::from_utf8_lossy(&bytes)),
                Some(Err(e)) => {
                    yield StreamChunk::Error(ProviderError::Network(format!("Stream read error: {}", e)));
                    return;
                }
                None => {
                    // Flush a final line that arrived without a newline.
                    buffer.push('\n');
                    finished = true;
                }
            }

            for line in take_lines(&mut buffer) {
                let data = match line.strip_prefix("data:") {
                    Some(data) => data.trim(),
                    None => continue,
                };
                match parse_gemini_event(data) {
                    SseEvent::Token(text) => {
                        token_count += 1;
                        yield StreamChunk::Token(text);
                    }
                    SseEvent::Fail(e) => {
                        error!("Gemini stream failed: {}", e);
                        yield StreamChunk::Error(e);
                        return;
                    }
                    SseEvent::Ignore => {}
                }
            }

            if finished {
                break;
            }
        }

        yield StreamChunk::Done { tokens_used: token_count };
    }
}

/// Remove complete lines from `buffer`, skipping blanks and SSE comments.
fn take_lines(buffer: &mut String) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(end) = buffer.find('\n') {
        let line = buffer[..end].trim().to_string();
        buffer.drain(..=end);
        if !line.is_empty() && !line.starts_with(':') {
            lines.push(line);
        }
    }
    lines
}

fn gemini_body(request: &NarrativeRequest) -> Value {
    let mut contents: Vec<Value> = request
        .history
        .iter()
        .map(|m| {
            let role = if m.role == "assistant" { "model" } else { "user" };
            json!({"role": role, "parts": [{"text": m.content}]})
        })
        .collect();
    let parts = match &request.content {
        NarrativeContent::Text(text) => json!([{"text": text}]),
        NarrativeContent::Image {
            mime_type,
            data,
            prompt,
        } => json!([
            {"inline_data": {"mime_type": mime_type, "data": BASE64.encode(data)}},
            {"text": prompt},
        ]),
    };
    contents.push(json!({"role": "user", "parts": parts}));

    let mut body = json!({
        "contents": contents,
        "generationConfig": {
            "temperature": request.profile.temperature,
            "maxOutputTokens": request.profile.max_tokens,
        },
    });
    if !request.system_context.is_empty() {
        body["systemInstruction"] = json!({"parts": [{"text": request.system_context}]});
    }
    body
}

fn parse_gemini_event(data: &str) -> SseEvent {
    let Ok(parsed) = serde_json::from_str::<Value>(data) else {
        return SseEvent::Ignore;
    };
    if let Some(reason) = parsed["promptFeedback"]["blockReason"].as_str() {
        return SseEvent::Fail(ProviderError::Rejected(reason.to_string()));
    }
    if let Some(message) = parsed["error"]["message"].as_str() {
        let status = parsed["error"]["code"].as_u64().unwrap_or(500) as u16;
        return SseEvent::Fail(ProviderError::Api {
            status,
            body: message.to_string(),
        });
    }

    let candidate = &parsed["candidates"][0];
    let text: String = candidate["content"]["parts"]
        .as_array()
        .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
        .unwrap_or_default();
    if !text.is_empty() {
        return SseEvent::Token(text);
    }

    match candidate["finishReason"].as_str() {
        Some(reason @ ("SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" | "RECITATION")) => {
            SseEvent::Fail(ProviderError::Rejected(reason.to_string()))
        }
        _ => SseEvent::Ignore,
    }
}

async fn collect_stream(mut stream: BoxedStream) -> Result<(String, usize), ProviderError> {
    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        match chunk {
            StreamChunk::Token(t) => text.push_str(&t),
            StreamChunk::Done { tokens_used } => return Ok((text, tokens_used)),
            StreamChunk::Error(e) => return Err(e),
        }
    }
    Ok((text, 0))
}

/// `NarrativeProvider` backed by the Gemini API.
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiProvider {
    pub fn new(
        client: Client,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            api_key: api_key.into(),
            base_url: GEMINI_BASE_URL.into(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build from the stored credentials. Fails when no key is configured.
    pub fn from_config(
        config: &LLMConfig,
        client: Client,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let (model, api_key) = config.credentials().ok_or(ProviderError::NotConfigured)?;
        let provider = Self::new(client, model, api_key, timeout);
        Ok(match &config.gemini_base_url {
            Some(url) => provider.with_base_url(url.as_str()),
            None => provider,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:streamGenerateContent?alt=sse",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn stream(&self, request: &NarrativeRequest) -> BoxedStream {
        let builder = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&gemini_body(request));
        debug!("Streaming from Gemini model {}", self.model);
        Box::pin(drive_sse(builder))
    }
}

#[async_trait]
impl NarrativeProvider for GeminiProvider {
    async fn generate(&self, request: NarrativeRequest) -> Result<String, ProviderError> {
        let start = Instant::now();
        let stream = self.stream(&request);

        let (text, tokens_used) = tokio::time::timeout(self.timeout, collect_stream(stream))
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout))??;

        if text.trim().is_empty() {
            return Err(ProviderError::Empty);
        }

        info!(
            "Gemini narrative: {} chunks in {}ms",
            tokens_used,
            start.elapsed().as_millis()
        );
        Ok(text)
    }
}
