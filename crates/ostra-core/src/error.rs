// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Ostra conversation service.

use thiserror::Error;

/// The primary error type used across all Ostra crates.
#[derive(Debug, Error)]
pub enum OstraError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Messaging channel errors (delivery failure, unknown channel token).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A provider rejected the call with a rate limit. Retryable on the same provider.
    #[error("provider rate limited: {0}")]
    RateLimited(String),

    /// A provider call exceeded its per-call timeout. Retryable on the same provider.
    #[error("provider call timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Unexpected LLM provider failure. Aborts retries for the provider and
    /// advances the fallback chain to the next one.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Every provider in the fallback chain was exhausted. Terminal for the turn.
    #[error("all providers failed: {0}")]
    ProvidersExhausted(String),

    /// Invalid input to a tool or operation. Recoverable within the conversation.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced record vanished between read and write (e.g. a cart line's
    /// product no longer resolves at order creation). Hard fault, never retried.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl OstraError {
    /// True for errors the provider retry policy treats as transient.
    pub fn is_transient(&self) -> bool {
        matches!(self, OstraError::RateLimited(_) | OstraError::Timeout { .. })
    }
}
