// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types owned by the storage layer.
//!
//! Domain types (products, orders, identities) live in `ostra-core`; these
//! structs mirror tables that no other crate reads directly.

use serde::{Deserialize, Serialize};

/// One row in the durable ingestion queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: i64,
    pub stream: String,
    pub message_id: String,
    pub payload: String,
    pub status: String,
    pub retry_count: u32,
    pub available_at: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A message that exhausted its retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub id: i64,
    pub stream: String,
    pub message_id: String,
    pub payload: String,
    pub error: String,
    pub failed_at: String,
}

/// What happened to a failed queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Re-enqueued with an exponential delay before it becomes visible again.
    Requeued { delay_secs: u64 },
    /// Moved to the dead-letter table; no further delivery attempts.
    DeadLettered,
}
