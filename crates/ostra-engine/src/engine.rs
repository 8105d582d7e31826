// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The turn driver: supervisor routing plus the shared stage handler.
//!
//! Every stage runs the same two-phase tool protocol. One tool-enabled
//! model call; if the model requested tools, each call is executed and fed
//! back as a tool message, followed by one tools-disabled call for the
//! final wording. Tool use never loops.

use std::sync::Arc;

use ostra_core::OstraError;
use ostra_core::types::{ChatMessage, ConversationState, Stage, ToolCall};
use ostra_llm::{GenerateRequest, LlmGateway};
use ostra_tools::{ToolExecutor, tools_for_stage};

use crate::prompts;
use crate::supervisor;

/// Fixed reply when no assistant text survives the turn, and when a turn
/// terminally fails after dead-lettering.
pub const FALLBACK_REPLY: &str =
    "Извините, произошла ошибка. Попробуйте снова или напишите нам напрямую.";

const EMPTY_CART_REPLY: &str = "Корзина пуста.";
const HANDOFF_REPLY: &str =
    "Передаю диалог оператору, он свяжется с вами в ближайшее время.";
const ESCALATION_REASON: &str = "Покупатель попросил живого оператора";

pub struct ConversationEngine {
    gateway: Arc<LlmGateway>,
    executor: ToolExecutor,
    max_tokens: u32,
    temperature: f32,
}

impl ConversationEngine {
    pub fn new(gateway: Arc<LlmGateway>, executor: ToolExecutor) -> Self {
        Self {
            gateway,
            executor,
            max_tokens: 2048,
            temperature: 0.7,
        }
    }

    pub fn with_generation(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    /// Drive one turn to completion and return the reply text.
    pub async fn process(&self, state: &mut ConversationState) -> Result<String, OstraError> {
        let route = supervisor::route(state.last_user_text(), state.cart.is_empty());
        state.stage = route.stage;

        // A direct request for a human never reaches a model.
        if route.escalate || state.paused {
            return self.hand_off(state).await;
        }

        if state.stage == Stage::Checkout && state.cart.is_empty() {
            state.messages.push(ChatMessage::assistant(EMPTY_CART_REPLY));
            return Ok(EMPTY_CART_REPLY.to_string());
        }

        self.run_stage(state).await?;

        Ok(state
            .latest_assistant_text()
            .filter(|t| !t.is_empty())
            .unwrap_or(FALLBACK_REPLY)
            .to_string())
    }

    async fn hand_off(&self, state: &mut ConversationState) -> Result<String, OstraError> {
        if !state.paused {
            let call = ToolCall {
                id: "call_escalate_to_human".to_string(),
                name: "escalate_to_human".to_string(),
                arguments: serde_json::json!({ "reason": ESCALATION_REASON }),
            };
            self.executor.execute(state, &call).await?;
        }
        state.escalate = true;
        state.messages.push(ChatMessage::assistant(HANDOFF_REPLY));
        Ok(HANDOFF_REPLY.to_string())
    }

    async fn run_stage(&self, state: &mut ConversationState) -> Result<(), OstraError> {
        let system = prompts::system_prompt(state.stage, state);
        let mut request = GenerateRequest::new(&system, state.messages.clone())
            .with_tools(tools_for_stage(state.stage));
        request.max_tokens = self.max_tokens;
        request.temperature = self.temperature;

        let reply = self.gateway.generate(&request).await?;
        tracing::debug!(
            stage = %state.stage,
            provider = %reply.provider,
            tool_calls = reply.tool_calls.len(),
            "stage model call"
        );

        if !reply.has_tool_calls() {
            state.messages.push(ChatMessage::assistant(reply.content));
            return Ok(());
        }

        state.messages.push(ChatMessage::Assistant {
            content: reply.content,
            tool_calls: Some(reply.tool_calls.clone()),
        });

        for call in &reply.tool_calls {
            let result = self.executor.execute(state, call).await?;
            let rendered = serde_json::to_string(&result)
                .map_err(|e| OstraError::Internal(format!("tool result serialization: {e}")))?;
            state
                .messages
                .push(ChatMessage::tool_result(&call.name, rendered));
        }

        // The prompt context may have changed (cart, pause) but the system
        // prompt stays fixed within a turn, matching what the model saw.
        let mut followup = GenerateRequest::new(&system, state.messages.clone());
        followup.max_tokens = self.max_tokens;
        followup.temperature = self.temperature;
        let final_reply = self.gateway.generate(&followup).await?;
        state.messages.push(ChatMessage::assistant(final_reply.content));
        Ok(())
    }
}
