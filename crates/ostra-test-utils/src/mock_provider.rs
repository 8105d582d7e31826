// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock LLM provider with pre-scripted replies.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use ostra_core::types::ToolCall;
use ostra_core::OstraError;
use ostra_llm::provider::LlmProvider;
use ostra_llm::types::{GenerateRequest, LlmReply};

/// A provider that pops replies from a FIFO script and records every
/// request it receives. When the script runs dry it returns a default
/// text reply.
pub struct MockProvider {
    replies: Mutex<VecDeque<LlmReply>>,
    requests: Arc<Mutex<Vec<GenerateRequest>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script a plain text reply.
    pub fn push_text(&self, text: &str) {
        self.replies.lock().unwrap().push_back(LlmReply {
            content: text.to_string(),
            tool_calls: Vec::new(),
            provider: "mock".to_string(),
        });
    }

    /// Script a reply that requests one tool call.
    pub fn push_tool_call(&self, name: &str, arguments: serde_json::Value) {
        self.replies.lock().unwrap().push_back(LlmReply {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: format!("call_{name}"),
                name: name.to_string(),
                arguments,
            }],
            provider: "mock".to_string(),
        });
    }

    /// All requests seen so far, in order.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<LlmReply, OstraError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| LlmReply {
                content: "mock reply".to_string(),
                tool_calls: Vec::new(),
                provider: "mock".to_string(),
            }))
    }
}
