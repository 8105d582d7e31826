// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider-neutral request/response shapes.
//!
//! Every provider translates [`GenerateRequest`] into its own wire format
//! and normalizes its reply back into [`LlmReply`], so nothing outside this
//! crate ever sees a provider's native representation.

use ostra_core::types::{ChatMessage, ToolCall, ToolSpec};

/// One generation request: system prompt, transcript, and the tool subset
/// the model is allowed to call. An empty `tools` disables tool use.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolSpec>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl GenerateRequest {
    pub fn new(system: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            system: system.into(),
            messages,
            tools: Vec::new(),
            max_tokens: 2048,
            temperature: 0.7,
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }
}

/// Normalized provider reply: free text plus any structured tool calls.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmReply {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    /// Model identifier of the provider that actually answered.
    pub provider: String,
}

impl LlmReply {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}
