// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider fallback chain with per-provider linear-backoff retries.
//!
//! Providers are tried in priority order: the free-tier Gemini model first,
//! then each configured OpenRouter model. Transient errors (rate limit,
//! timeout) retry the same provider up to `max_retries` attempts with a
//! linear `attempt * base` backoff; any other error abandons the provider
//! and advances the chain. Exhausting the whole chain is terminal for the
//! turn.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use ostra_config::model::LlmConfig;
use ostra_core::OstraError;

use crate::gemini::GeminiClient;
use crate::openrouter::OpenRouterClient;
use crate::provider::LlmProvider;
use crate::types::{GenerateRequest, LlmReply};

pub struct LlmGateway {
    providers: Vec<Arc<dyn LlmProvider>>,
    max_retries: u32,
    backoff_base: Duration,
}

impl std::fmt::Debug for LlmGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmGateway")
            .field(
                "providers",
                &self.providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("max_retries", &self.max_retries)
            .field("backoff_base", &self.backoff_base)
            .finish()
    }
}

impl LlmGateway {
    pub fn new(
        providers: Vec<Arc<dyn LlmProvider>>,
        max_retries: u32,
        backoff_base: Duration,
    ) -> Self {
        Self {
            providers,
            max_retries,
            backoff_base,
        }
    }

    /// Build the chain from configuration. Providers whose API key is
    /// missing are left out of the chain entirely.
    pub fn from_config(config: &LlmConfig) -> Result<Self, OstraError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let mut providers: Vec<Arc<dyn LlmProvider>> = Vec::new();

        if let Some(key) = &config.gemini_api_key {
            providers.push(Arc::new(GeminiClient::new(key.clone(), timeout)?));
        }
        if let Some(key) = &config.openrouter_api_key {
            for model in &config.openrouter_models {
                providers.push(Arc::new(OpenRouterClient::new(
                    key,
                    model.clone(),
                    timeout,
                )?));
            }
        }
        if providers.is_empty() {
            return Err(OstraError::Config(
                "no LLM providers configured: set an API key for gemini or openrouter".into(),
            ));
        }

        Ok(Self::new(
            providers,
            config.max_retries,
            Duration::from_millis(config.backoff_base_ms),
        ))
    }

    /// Generate a reply, walking the fallback chain.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<LlmReply, OstraError> {
        let mut last_error: Option<OstraError> = None;

        for provider in &self.providers {
            for attempt in 1..=self.max_retries {
                match provider.generate(request).await {
                    Ok(reply) => {
                        debug!(provider = provider.name(), attempt, "provider answered");
                        return Ok(reply);
                    }
                    Err(e) if e.is_transient() => {
                        warn!(
                            provider = provider.name(),
                            attempt,
                            error = %e,
                            "transient provider error"
                        );
                        last_error = Some(e);
                        if attempt < self.max_retries {
                            tokio::time::sleep(self.backoff_base * attempt).await;
                        }
                    }
                    Err(e) => {
                        warn!(
                            provider = provider.name(),
                            attempt,
                            error = %e,
                            "provider failed, advancing fallback chain"
                        );
                        last_error = Some(e);
                        break;
                    }
                }
            }
        }

        let detail = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "empty provider chain".to_string());
        Err(OstraError::ProvidersExhausted(detail))
    }
}
