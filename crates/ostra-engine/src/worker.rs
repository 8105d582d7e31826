// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue consumer: claims envelopes, drives turns, delivers replies.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use ostra_config::model::QueueConfig;
use ostra_core::OstraError;
use ostra_core::types::{ConversationState, QueueEnvelope};
use ostra_identity::IdentityResolver;
use ostra_storage::models::{QueueEntry, RetryOutcome};
use ostra_storage::{Database, queries::queue};

use crate::engine::{ConversationEngine, FALLBACK_REPLY};
use ostra_core::traits::ChannelSender;

/// How long a claimed entry stays locked before another worker may
/// reclaim it.
const LOCK_SECS: i64 = 60;

pub struct Worker {
    db: Database,
    config: QueueConfig,
    consumer: String,
    resolver: Arc<IdentityResolver>,
    engine: Arc<ConversationEngine>,
    sender: Arc<dyn ChannelSender>,
}

impl Worker {
    pub fn new(
        db: Database,
        config: QueueConfig,
        consumer: impl Into<String>,
        resolver: Arc<IdentityResolver>,
        engine: Arc<ConversationEngine>,
        sender: Arc<dyn ChannelSender>,
    ) -> Self {
        Self {
            db,
            config,
            consumer: consumer.into(),
            resolver,
            engine,
            sender,
        }
    }

    /// Consume the stream until cancelled. Empty reads sleep for the
    /// configured block timeout; entry-level failures go through the retry
    /// path and never stop the loop.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), OstraError> {
        queue::ensure_group(&self.db, &self.config.stream, &self.config.group).await?;
        tracing::info!(
            consumer = %self.consumer,
            stream = %self.config.stream,
            "worker started"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }
            let entries = match queue::dequeue_batch(
                &self.db,
                &self.config.stream,
                &self.consumer,
                self.config.batch_size,
                LOCK_SECS,
            )
            .await
            {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::error!(consumer = %self.consumer, error = %e, "dequeue failed");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(Duration::from_millis(self.config.block_timeout_ms)) => {}
                    }
                    continue;
                }
            };

            if entries.is_empty() {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_millis(self.config.block_timeout_ms)) => {}
                }
                continue;
            }

            for entry in &entries {
                // A storage error here leaves the entry locked; the lock
                // timeout returns it to the stream for redelivery.
                if let Err(e) = self.handle_entry(entry).await {
                    tracing::error!(id = entry.id, consumer = %self.consumer, error = %e, "entry handling failed");
                }
            }
        }

        tracing::info!(consumer = %self.consumer, "worker stopped");
        Ok(())
    }

    async fn handle_entry(&self, entry: &QueueEntry) -> Result<(), OstraError> {
        let envelope: QueueEnvelope = match serde_json::from_str(&entry.payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                // A payload that cannot deserialize will never succeed.
                tracing::error!(id = entry.id, error = %e, "malformed envelope, dead-lettering");
                queue::fail(&self.db, entry, &format!("malformed envelope: {e}"), 0).await?;
                return Ok(());
            }
        };

        match self.process_envelope(&envelope).await {
            Ok(reply) => {
                if let Err(e) = self
                    .sender
                    .deliver(envelope.channel, &envelope.external_id, &reply)
                    .await
                {
                    tracing::warn!(
                        message_id = %envelope.message_id,
                        error = %e,
                        "reply delivery failed"
                    );
                }
                queue::ack(&self.db, entry.id).await?;
            }
            Err(e) => {
                tracing::warn!(
                    message_id = %envelope.message_id,
                    retry_count = entry.retry_count,
                    error = %e,
                    "turn failed"
                );
                let outcome =
                    queue::fail(&self.db, entry, &e.to_string(), self.config.max_retries).await?;
                // Retries stay silent toward the customer; only the
                // terminal failure apologizes.
                if outcome == RetryOutcome::DeadLettered {
                    if let Err(de) = self
                        .sender
                        .deliver(envelope.channel, &envelope.external_id, FALLBACK_REPLY)
                        .await
                    {
                        tracing::warn!(
                            message_id = %envelope.message_id,
                            error = %de,
                            "apology delivery failed"
                        );
                    }
                }
            }
        }
        Ok(())
    }

    async fn process_envelope(&self, envelope: &QueueEnvelope) -> Result<String, OstraError> {
        let phone = envelope.metadata.get("phone").and_then(|v| v.as_str());
        let email = envelope.metadata.get("email").and_then(|v| v.as_str());
        let resolved = self
            .resolver
            .resolve(envelope.channel, &envelope.external_id, phone, email)
            .await?;

        let mut state =
            ConversationState::for_turn(resolved.unified_id, envelope.channel, &envelope.text);
        state.phone = resolved.phone;
        self.engine.process(&mut state).await
    }
}
