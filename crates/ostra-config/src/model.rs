// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Ostra conversation service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Ostra configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OstraConfig {
    /// Service identity and worker settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// LLM provider chain settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Ingestion queue settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Telegram settings (operator alerts for escalations).
    #[serde(default)]
    pub telegram: TelegramConfig,
}

/// Service identity and worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the service.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Number of concurrent queue consumer workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            workers: default_workers(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "ostra".to_string()
}

fn default_workers() -> usize {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

/// LLM provider chain configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// Gemini API key. `None` disables the primary free-tier provider.
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    /// OpenRouter API key. `None` disables the paid fallback providers.
    #[serde(default)]
    pub openrouter_api_key: Option<String>,

    /// Fallback model identifiers tried via OpenRouter, in order.
    #[serde(default = "default_openrouter_models")]
    pub openrouter_models: Vec<String>,

    /// Maximum output tokens per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-call HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per provider before advancing the fallback chain.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Linear backoff base in milliseconds (delay = attempt x base).
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            openrouter_api_key: None,
            openrouter_models: default_openrouter_models(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

fn default_openrouter_models() -> Vec<String> {
    vec![
        "deepseek/deepseek-chat".to_string(),
        "qwen/qwen-2.5-72b-instruct".to_string(),
    ]
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "ostra.db".to_string()
}

/// Ingestion queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Name of the inbound message stream.
    #[serde(default = "default_stream")]
    pub stream: String,

    /// Competing-consumer group name.
    #[serde(default = "default_group")]
    pub group: String,

    /// Retries before an envelope is dead-lettered.
    #[serde(default = "default_queue_max_retries")]
    pub max_retries: u32,

    /// How long one consume call waits for new entries, in milliseconds.
    #[serde(default = "default_block_timeout_ms")]
    pub block_timeout_ms: u64,

    /// Entries claimed per consume call.
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            stream: default_stream(),
            group: default_group(),
            max_retries: default_queue_max_retries(),
            block_timeout_ms: default_block_timeout_ms(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_stream() -> String {
    "agents:incoming".to_string()
}

fn default_group() -> String {
    "agents-workers".to_string()
}

fn default_queue_max_retries() -> u32 {
    3
}

fn default_block_timeout_ms() -> u64 {
    5000
}

fn default_batch_size() -> i64 {
    10
}

/// Telegram configuration for escalation alerts.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Bot token used to post operator alerts. `None` disables alerting.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Chat id the alerts are posted to.
    #[serde(default)]
    pub admin_chat_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment_constants() {
        let config = OstraConfig::default();
        assert_eq!(config.agent.name, "ostra");
        assert_eq!(config.queue.max_retries, 3);
        assert_eq!(config.llm.max_retries, 3);
        assert_eq!(config.llm.openrouter_models.len(), 2);
        assert_eq!(config.queue.stream, "agents:incoming");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<OstraConfig, _> =
            toml::from_str("[agent]\nname = \"x\"\nnot_a_key = 1\n");
        assert!(result.is_err());
    }
}
