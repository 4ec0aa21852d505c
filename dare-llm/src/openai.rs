//! OpenAI-compatible `/chat/completions` client.

use std::collections::VecDeque;
use std::env;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ModelError;
use crate::sse::SseDecoder;
use crate::{Model, PromptRequest, Reply};

const DONE_SENTINEL: &str = "[DONE]";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct OpenAiModel {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Deserialize, Default)]
struct Delta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenAiModel {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ModelError::MissingApiKey);
        }
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_base: api_base.into(),
            api_key,
            model: model.into(),
        })
    }

    /// Build with the key from `OPENAI_API_KEY`.
    pub fn from_env(api_base: impl Into<String>, model: impl Into<String>) -> Result<Self, ModelError> {
        let api_key = env::var("OPENAI_API_KEY").unwrap_or_default();
        Self::new(api_base, api_key, model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl Model for OpenAiModel {
    async fn prompt(&self, request: &PromptRequest) -> Result<Reply, ModelError> {
        let mut messages = Vec::with_capacity(2);
        if !request.system.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: &request.system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = ChatRequest {
            model: &self.model,
            messages,
            stream: request.stream,
            max_tokens: request.max_tokens,
        };

        let endpoint = self.endpoint();
        debug!(
            endpoint = %endpoint,
            model = %self.model,
            stream = request.stream,
            "sending chat request"
        );

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;

        if request.stream {
            return Ok(Reply::Stream(sse_fragments(response)));
        }

        let text = response.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| ModelError::decode("chat response", e))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ModelError::EmptyReply)?;

        Ok(Reply::Complete(content))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ModelError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    let message = match serde_json::from_str::<ErrorEnvelope>(&error_text) {
        Ok(envelope) => envelope.error.message,
        Err(_) => error_text,
    };

    Err(ModelError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Parse one SSE payload into its content delta (if any).
fn parse_chunk(data: &str) -> Result<Option<String>, ModelError> {
    let chunk: StreamChunk =
        serde_json::from_str(data).map_err(|e| ModelError::decode("stream chunk", e))?;

    if let Some(error) = chunk.error {
        return Err(ModelError::Api {
            status: 200,
            message: error.message,
        });
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty()))
}

struct SseState {
    body: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    decoder: SseDecoder,
    ready: VecDeque<Result<String, ModelError>>,
    finished: bool,
}

impl SseState {
    /// Queue the fragments carried by `payloads`; stop at `[DONE]` or an error.
    fn accept(&mut self, payloads: impl IntoIterator<Item = String>) {
        for data in payloads {
            if self.finished {
                return;
            }
            if data.trim() == DONE_SENTINEL {
                self.finished = true;
                return;
            }
            match parse_chunk(&data) {
                Ok(Some(content)) => self.ready.push_back(Ok(content)),
                Ok(None) => {}
                Err(err) => {
                    self.ready.push_back(Err(err));
                    self.finished = true;
                }
            }
        }
    }
}

/// Turn a streaming response body into a stream of content fragments.
fn sse_fragments(response: reqwest::Response) -> BoxStream<'static, Result<String, ModelError>> {
    let state = SseState {
        body: response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed(),
        decoder: SseDecoder::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.ready.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let payloads = state.decoder.push(&chunk);
                    state.accept(payloads);
                }
                Some(Err(err)) => {
                    state.ready.push_back(Err(ModelError::Http(err)));
                    state.finished = true;
                }
                None => {
                    let tail = state.decoder.finish();
                    state.accept(tail);
                    if !state.finished {
                        warn!("stream ended without [DONE]");
                        state.finished = true;
                    }
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chunk_content() {
        let data = r#"{"choices":[{"index":0,"delta":{"content":"print("}}]}"#;
        assert_eq!(parse_chunk(data).unwrap().as_deref(), Some("print("));
    }

    #[test]
    fn test_parse_chunk_role_only_delta() {
        let data = r#"{"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#;
        assert_eq!(parse_chunk(data).unwrap(), None);

        let data = r#"{"choices":[{"index":0,"delta":{"content":""},"finish_reason":"stop"}]}"#;
        assert_eq!(parse_chunk(data).unwrap(), None);
    }

    #[test]
    fn test_parse_chunk_error_object() {
        let data = r#"{"error":{"message":"overloaded","type":"server_error"}}"#;
        match parse_chunk(data) {
            Err(ModelError::Api { message, .. }) => assert_eq!(message, "overloaded"),
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_chunk_garbage() {
        assert!(matches!(
            parse_chunk("not json"),
            Err(ModelError::Decode { .. })
        ));
    }

    #[test]
    fn test_missing_api_key() {
        assert!(matches!(
            OpenAiModel::new("http://localhost", "  ", "m"),
            Err(ModelError::MissingApiKey)
        ));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let model = OpenAiModel::new("http://localhost:8080/v1/", "key", "m").unwrap();
        assert_eq!(model.endpoint(), "http://localhost:8080/v1/chat/completions");
        assert_eq!(model.model(), "m");
    }
}
