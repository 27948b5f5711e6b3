//! GeminiClient - streaming REST implementation for Gemini.
//!
//! Calls the Gemini `streamGenerateContent` endpoint with SSE framing
//! and forwards text fragments to the caller in arrival order.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{header::HeaderValue, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use studio_core::message::{Attachment, Message, MessageRole};

use crate::{ChunkSink, GenerationSource, InteractionError};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// System instruction that steers the model toward mobile mockup output.
pub const SYSTEM_INSTRUCTION: &str = r#"
You are an expert AI Mobile Full Stack Architect. Your goal is to assist developers in building high-quality mobile applications using React Native, Expo, and Node.js.

You have three main capabilities:
1. **Chat & Advice:** Answer questions about mobile dev patterns, libraries (React Navigation, TanStack Query, Supabase), and best practices.
2. **Code Generation:** When asked for code, provide clean, TypeScript-based React Native code.
3. **UI Preview:** When asked to "preview" or "show" a screen, you MUST generate a standard HTML string using Tailwind CSS that visually approximates the mobile screen.
4. **Vision:** You can analyze images provided by the user (wireframes, screenshots, or error logs) to generate code or provide feedback.

**CRITICAL OUTPUT RULES:**
- If the user asks for a UI preview, wrap the HTML/Tailwind code in a block labeled ```html-preview ... ```.
- If the user asks for React Native code, wrap it in ```tsx ... ```.
- If the user asks for backend analysis or complexity stats, provide a JSON block ```json-analysis ... ``` with an array of objects: [{ "name": "Metric", "value": 80, "fullMark": 100 }].

Example "html-preview":
```html-preview
<div class="flex flex-col h-full bg-white p-4">
  <h1 class="text-2xl font-bold text-gray-900">Welcome</h1>
</div>
```
"#;

/// Client that talks to the Gemini HTTP API with streamed responses.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    system_instruction: Option<String>,
}

impl GeminiClient {
    /// Creates a new client with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            system_instruction: Some(SYSTEM_INSTRUCTION.to_string()),
        }
    }

    /// Loads the API key from `GEMINI_API_KEY` (fallback `API_KEY`).
    ///
    /// Model name defaults to `gemini-2.5-flash`.
    pub fn try_from_env() -> Result<Self, InteractionError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(InteractionError::MissingApiKey)?;

        Ok(Self::new(api_key, DEFAULT_GEMINI_MODEL))
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        self
    }

    /// Replaces the system instruction sent alongside every request.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    fn build_request(
        &self,
        history: &[Message],
        new_message: &str,
        attachments: &[Attachment],
    ) -> GenerateContentRequest {
        // The trailing history entry is the optimistically appended
        // user message for this turn; it goes out as the current
        // message below, not as history.
        let history_to_use = &history[..history.len().saturating_sub(1)];

        let mut contents: Vec<Content> = history_to_use
            .iter()
            .map(|msg| Content {
                role: match msg.role {
                    MessageRole::User => "user".to_string(),
                    _ => "model".to_string(),
                },
                parts: message_parts(&msg.content, &msg.attachments),
            })
            .collect();

        contents.push(Content {
            role: "user".to_string(),
            parts: message_parts(new_message, attachments),
        });

        GenerateContentRequest {
            contents,
            system_instruction: self.system_instruction.as_ref().map(|text| Content {
                role: "system".to_string(),
                parts: vec![Part::Text { text: text.clone() }],
            }),
            generation_config: Some(GenerationConfig {
                temperature: DEFAULT_TEMPERATURE,
            }),
        }
    }
}

#[async_trait]
impl GenerationSource for GeminiClient {
    async fn stream_message(
        &self,
        history: &[Message],
        new_message: &str,
        attachments: &[Attachment],
        on_chunk: ChunkSink<'_>,
    ) -> Result<String, InteractionError> {
        let body = self.build_request(history, new_message, attachments);
        tracing::debug!(
            model = %self.model,
            turns = body.contents.len(),
            "Dispatching streaming generation request"
        );

        let url = format!(
            "{}/{model}:streamGenerateContent?alt=sse&key={api_key}",
            BASE_URL,
            model = self.model,
            api_key = self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|err| InteractionError::Request {
                message: format!("Gemini API request failed: {err}"),
                is_retryable: err.is_connect() || err.is_timeout(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text, retry_after));
        }

        let mut full_text = String::new();
        // Byte buffer so a multi-byte character split across network
        // chunks is never decoded in halves.
        let mut line_buf: Vec<u8> = Vec::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(|err| InteractionError::Request {
                message: format!("Gemini stream interrupted: {err}"),
                is_retryable: true,
            })?;
            line_buf.extend_from_slice(&bytes);

            // Consume complete lines; a partial line stays buffered
            // until the next chunk arrives.
            while let Some(newline) = line_buf.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = line_buf.drain(..=newline).collect();
                let line = String::from_utf8_lossy(&line);
                if let Some(text) = parse_sse_line(line.trim_end())? {
                    full_text.push_str(&text);
                    on_chunk(&text);
                }
            }
        }

        let tail = String::from_utf8_lossy(&line_buf);
        if let Some(text) = parse_sse_line(tail.trim_end())? {
            full_text.push_str(&text);
            on_chunk(&text);
        }

        if full_text.is_empty() {
            return Err(InteractionError::EmptyResponse);
        }

        Ok(full_text)
    }
}

/// Decodes one SSE line into its text fragment, if it carries one.
///
/// Non-data lines (blank keep-alives, `event:` markers) yield `None`.
/// A data line that is not valid JSON is an error.
fn parse_sse_line(line: &str) -> Result<Option<String>, InteractionError> {
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let data = data.trim();
    if data.is_empty() {
        return Ok(None);
    }

    let parsed: GenerateContentResponse = serde_json::from_str(data)
        .map_err(|err| InteractionError::Parse(format!("invalid stream chunk: {err}")))?;

    Ok(extract_chunk_text(parsed))
}

fn extract_chunk_text(response: GenerateContentResponse) -> Option<String> {
    response
        .candidates
        .and_then(|mut candidates| candidates.pop())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .filter(|text| !text.is_empty())
}

fn message_parts(text: &str, attachments: &[Attachment]) -> Vec<Part> {
    let mut parts = Vec::new();
    if !text.trim().is_empty() {
        parts.push(Part::Text {
            text: text.to_string(),
        });
    }
    for att in attachments {
        parts.push(Part::InlineData {
            inline_data: InlineDataPayload {
                mime_type: att.mime_type.clone(),
                // Attachment payloads are already base64 strings.
                data: att.data.clone(),
            },
        });
    }
    parts
}

fn map_http_error(
    status: StatusCode,
    body_text: String,
    retry_after: Option<Duration>,
) -> InteractionError {
    let message = serde_json::from_str::<ErrorWrapper>(&body_text)
        .ok()
        .and_then(|wrapper| wrapper.error.message.or(wrapper.error.status))
        .unwrap_or(body_text);

    InteractionError::Api {
        status: status.as_u16(),
        message,
        retry_after,
    }
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    header
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "systemInstruction")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "generationConfig")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    code: Option<i32>,
    message: Option<String>,
    status: Option<String>,
}
