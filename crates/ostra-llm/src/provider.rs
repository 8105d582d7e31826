// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The provider seam the gateway's fallback chain is built on.

use async_trait::async_trait;
use ostra_core::OstraError;

use crate::types::{GenerateRequest, LlmReply};

/// A single LLM backend. Implementations make exactly one attempt per
/// `generate` call; retry and fallback policy live in the gateway.
///
/// Error contract: rate limits map to [`OstraError::RateLimited`], per-call
/// timeouts to [`OstraError::Timeout`], anything else to
/// [`OstraError::Provider`].
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Model identifier reported in [`crate::types::LlmReply::provider`].
    fn name(&self) -> &str;

    async fn generate(&self, request: &GenerateRequest) -> Result<LlmReply, OstraError>;
}
