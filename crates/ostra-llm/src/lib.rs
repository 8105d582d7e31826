// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM provider clients and the fallback gateway.
//!
//! The gateway hides which model actually answered: callers hand it a
//! system prompt, a transcript, and a tool catalog, and get back a
//! normalized `{content, tool_calls}` reply from whichever provider in the
//! chain responded first.

pub mod gateway;
pub mod gemini;
pub mod openrouter;
pub mod provider;
pub mod types;

pub use gateway::LlmGateway;
pub use gemini::GeminiClient;
pub use openrouter::OpenRouterClient;
pub use provider::LlmProvider;
pub use types::{GenerateRequest, LlmReply};
