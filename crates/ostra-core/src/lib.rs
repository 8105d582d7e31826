// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Ostra omni-channel conversation service.
//!
//! This crate provides the error type, the domain types, and the port
//! traits used throughout the Ostra workspace. Concrete backends (SQLite
//! storage, LLM providers, channel adapters) implement the traits defined
//! here.

pub mod error;
pub mod traits;
pub mod types;

pub use error::OstraError;
pub use types::{
    CartLine, Channel, ChatMessage, ConversationState, CustomerIdentity, DeliveryAddress,
    QueueEnvelope, Stage, ToolCall, ToolSpec, TurnRequest,
};

pub use traits::{ChannelSender, EscalationNotifier, IdentityStore, OrderStore, ProductCatalog};
