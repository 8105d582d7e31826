// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gemini `generateContent` client, the free-tier primary provider.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ostra_core::types::{ChatMessage, ToolCall, ToolSpec};
use ostra_core::OstraError;

use crate::provider::LlmProvider;
use crate::types::{GenerateRequest, LlmReply};

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const MODEL: &str = "gemini-2.0-flash";

/// Client for the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    timeout: Duration,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, OstraError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OstraError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            api_key,
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

    fn render_contents(messages: &[ChatMessage]) -> Vec<Content> {
        let mut contents = Vec::new();
        for msg in messages {
            match msg {
                ChatMessage::User { content } => {
                    if !content.is_empty() {
                        contents.push(Content::text("user", content));
                    }
                }
                ChatMessage::Assistant {
                    content: _,
                    tool_calls: Some(calls),
                } if !calls.is_empty() => {
                    // Gemini wants one functionCall part per content entry.
                    for call in calls {
                        contents.push(Content {
                            role: "model".to_string(),
                            parts: vec![Part {
                                function_call: Some(FunctionCall {
                                    name: call.name.clone(),
                                    args: call.arguments.clone(),
                                }),
                                ..Part::default()
                            }],
                        });
                    }
                }
                ChatMessage::Assistant { content, .. } => {
                    if !content.is_empty() {
                        contents.push(Content::text("model", content));
                    }
                }
                ChatMessage::Tool { name, content } => {
                    contents.push(Content {
                        role: "function".to_string(),
                        parts: vec![Part {
                            function_response: Some(FunctionResponse {
                                name: name.clone(),
                                response: serde_json::json!({ "result": content }),
                            }),
                            ..Part::default()
                        }],
                    });
                }
            }
        }
        contents
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
    fn name(&self) -> &str {
        MODEL
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<LlmReply, OstraError> {
        let payload = GeminiRequest {
            contents: Self::render_contents(&request.messages),
            system_instruction: SystemInstruction {
                parts: vec![TextPart {
                    text: request.system.clone(),
                }],
            },
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
            tools: if request.tools.is_empty() {
                None
            } else {
                Some(vec![ToolBlock {
                    function_declarations: request.tools.clone(),
                }])
            },
        };

        let url = format!(
            "{}/v1beta/models/{MODEL}:generateContent?key={}",
            self.base_url, self.api_key
        );
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
        debug!(status = %status, "gemini response received");

        if status.as_u16() == 429 {
            let body = response.text().await.unwrap_or_default();
            return Err(OstraError::RateLimited(format!(
                "gemini rate limit exceeded: {body}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OstraError::Provider {
                message: format!("gemini returned {status}: {body}"),
                source: None,
            });
        }

        let data: GeminiResponse = response.json().await.map_err(|e| OstraError::Provider {
            message: format!("failed to parse gemini response: {e}"),
            source: Some(Box::new(e)),
        })?;

        let candidate = data
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| OstraError::Provider {
                message: "no candidates in gemini response".to_string(),
                source: None,
            })?;

        let mut content = String::new();
        let mut tool_calls = Vec::new();
        for part in candidate.content.parts {
            if let Some(text) = part.text {
                content.push_str(&text);
            }
            if let Some(fc) = part.function_call {
                tool_calls.push(ToolCall {
                    id: format!("call_{}", fc.name),
                    name: fc.name,
                    arguments: fc.args,
                });
            }
        }

        Ok(LlmReply {
            content,
            tool_calls,
            provider: MODEL.to_string(),
        })
    }
}

// --- Wire types ---

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction")]
    system_instruction: SystemInstruction,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolBlock>>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ToolBlock {
    #[serde(rename = "functionDeclarations")]
    function_declarations: Vec<ToolSpec>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    role: String,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: &str, text: &str) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![Part {
                text: Some(text.to_string()),
                ..Part::default()
            }],
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "functionCall", skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(rename = "functionResponse", skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}
