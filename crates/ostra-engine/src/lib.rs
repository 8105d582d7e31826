// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation engine: supervisor routing, stage handlers, and the queue
//! worker that connects the two to the durable ingestion queue.
//!
//! A turn flows producer → queue → worker → identity resolution → engine →
//! channel delivery. The engine itself is transport-agnostic; everything it
//! touches arrives through the `ostra-core` ports.

pub mod engine;
pub mod producer;
pub mod prompts;
pub mod supervisor;
pub mod worker;

pub use engine::{ConversationEngine, FALLBACK_REPLY};
pub use producer::submit_incoming_message;
pub use supervisor::{Route, route};
pub use worker::Worker;
