// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ingestion side of the queue: channel adapters call this to hand a
//! message to the worker pool.

use chrono::Utc;

use ostra_config::model::QueueConfig;
use ostra_core::OstraError;
use ostra_core::types::{QueueEnvelope, TurnRequest};
use ostra_storage::{Database, queries::queue};

/// Wrap an inbound message in an envelope and enqueue it durably. Returns
/// the envelope's idempotency key.
pub async fn submit_incoming_message(
    db: &Database,
    config: &QueueConfig,
    request: &TurnRequest,
) -> Result<String, OstraError> {
    let now = Utc::now();
    let envelope = QueueEnvelope {
        message_id: format!(
            "{}:{}:{}",
            request.channel,
            request.external_id,
            now.timestamp_millis()
        ),
        channel: request.channel,
        external_id: request.external_id.clone(),
        customer_id: None,
        text: request.text.clone(),
        metadata: request.metadata.clone(),
        retry_count: 0,
        enqueued_at: now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
    };
    let payload = serde_json::to_string(&envelope)
        .map_err(|e| OstraError::Internal(format!("envelope serialization: {e}")))?;

    let delivery_id = queue::enqueue(db, &config.stream, &envelope.message_id, &payload).await?;
    tracing::debug!(
        message_id = %envelope.message_id,
        delivery_id,
        stream = %config.stream,
        "message enqueued"
    );
    Ok(envelope.message_id)
}
