// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenRouter chat-completions client, used for the paid fallback models.
//!
//! One `OpenRouterClient` instance per model: the gateway's fallback chain
//! holds several of these, each pinned to its own model identifier.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use ostra_core::types::{ChatMessage, ToolCall, ToolSpec};
use ostra_core::OstraError;

use crate::provider::LlmProvider;
use crate::types::{GenerateRequest, LlmReply};

const API_BASE_URL: &str = "https://openrouter.ai";

#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    client: reqwest::Client,
    model: String,
    timeout: Duration,
    base_url: String,
}

impl OpenRouterClient {
    pub fn new(api_key: &str, model: String, timeout: Duration) -> Result<Self, OstraError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| OstraError::Config(format!("invalid OpenRouter API key: {e}")))?;
        headers.insert("authorization", bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| OstraError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            model,
            timeout,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    fn render_messages(system: &str, messages: &[ChatMessage]) -> Vec<WireMessage> {
        let mut wire = vec![WireMessage {
            role: "system".to_string(),
            content: Some(system.to_string()),
            ..WireMessage::default()
        }];
        for msg in messages {
            match msg {
                ChatMessage::User { content } => wire.push(WireMessage {
                    role: "user".to_string(),
                    content: Some(content.clone()),
                    ..WireMessage::default()
                }),
                ChatMessage::Assistant {
                    content,
                    tool_calls,
                } => wire.push(WireMessage {
                    role: "assistant".to_string(),
                    content: Some(content.clone()),
                    tool_calls: tool_calls.as_ref().map(|calls| {
                        calls
                            .iter()
                            .map(|call| WireToolCall {
                                id: call.id.clone(),
                                kind: "function".to_string(),
                                function: WireFunction {
                                    name: call.name.clone(),
                                    arguments: call.arguments.to_string(),
                                },
                            })
                            .collect()
                    }),
                    ..WireMessage::default()
                }),
                ChatMessage::Tool { name, content } => wire.push(WireMessage {
                    role: "tool".to_string(),
                    content: Some(content.clone()),
                    name: Some(name.clone()),
                    tool_call_id: Some(format!("call_{name}")),
                    ..WireMessage::default()
                }),
            }
        }
        wire
    }
}

#[async_trait]
impl LlmProvider for OpenRouterClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<LlmReply, OstraError> {
        let payload = CompletionRequest {
            model: self.model.clone(),
            messages: Self::render_messages(&request.system, &request.messages),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            tools: if request.tools.is_empty() {
                None
            } else {
                Some(
                    request
                        .tools
                        .iter()
                        .map(|spec| WireTool {
                            kind: "function".to_string(),
                            function: spec.clone(),
                        })
                        .collect(),
                )
            },
        };

        let url = format!("{}/api/v1/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OstraError::Timeout {
                        duration: self.timeout,
                    }
                } else {
                    OstraError::Provider {
                        message: format!("HTTP request failed: {e}"),
                        source: Some(Box::new(e)),
                    }
                }
            })?;

        let status = response.status();
        debug!(status = %status, model = %self.model, "openrouter response received");

        if status.as_u16() == 429 {
            let body = response.text().await.unwrap_or_default();
            return Err(OstraError::RateLimited(format!(
                "openrouter rate limit for {}: {body}",
                self.model
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OstraError::Provider {
                message: format!("openrouter returned {status}: {body}"),
                source: None,
            });
        }

        let data: CompletionResponse =
            response.json().await.map_err(|e| OstraError::Provider {
                message: format!("failed to parse openrouter response: {e}"),
                source: Some(Box::new(e)),
            })?;

        let message = data
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| OstraError::Provider {
                message: format!("no choices in response from {}", self.model),
                source: None,
            })?;

        let tool_calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall {
                id: call.id,
                name: call.function.name,
                arguments: serde_json::from_str(&call.function.arguments)
                    .unwrap_or(serde_json::Value::Null),
            })
            .collect();

        Ok(LlmReply {
            content: message.content.unwrap_or_default(),
            tool_calls,
            provider: self.model.clone(),
        })
    }
}

// --- Wire types ---

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
}

#[derive(Debug, Default, Serialize)]
struct WireMessage {
    role: String,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: WireFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    /// JSON-encoded arguments string, per the OpenAI wire convention.
    arguments: String,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: String,
    function: ToolSpec,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> OpenRouterClient {
        OpenRouterClient::new(
            "test-key",
            "deepseek/deepseek-chat".into(),
            Duration::from_secs(5),
        )
        .unwrap()
        .with_base_url(base_url.to_string())
    }

    fn test_request() -> GenerateRequest {
        GenerateRequest::new("Ты продавец.", vec![ChatMessage::user("Что есть в наличии?")])
    }

    #[tokio::test]
    async fn generate_returns_text_with_auth_header() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "Сегодня есть устрицы."}}]
        });
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "deepseek/deepseek-chat",
                "messages": [
                    {"role": "system", "content": "Ты продавец."},
                    {"role": "user", "content": "Что есть в наличии?"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;

        let reply = test_client(&server.uri())
            .generate(&test_request())
            .await
            .unwrap();
        assert_eq!(reply.content, "Сегодня есть устрицы.");
        assert_eq!(reply.provider, "deepseek/deepseek-chat");
    }

    #[tokio::test]
    async fn tool_call_arguments_string_is_parsed() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "choices": [{"message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "add_to_cart",
                                 "arguments": "{\"product_id\":\"p-1\",\"quantity\":2}"}
                }]
            }}]
        });
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let reply = test_client(&server.uri())
            .generate(&test_request())
            .await
            .unwrap();
        assert_eq!(reply.content, "");
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].arguments["quantity"], 2);
    }

    #[tokio::test]
    async fn rate_limit_maps_to_transient_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .generate(&test_request())
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn empty_choices_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .generate(&test_request())
            .await
            .unwrap_err();
        assert!(!err.is_transient());
        assert!(err.to_string().contains("no choices"), "got: {err}");
    }
}
