// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared test doubles for the Ostra workspace.
//!
//! Provides:
//! - [`MockProvider`]: a scripted LLM provider that records requests
//! - in-memory implementations of the catalog, order, and identity ports
//! - a recording notifier and channel sender
//! - a small seeded product catalog

pub mod memory_ports;
pub mod mock_provider;

pub use memory_ports::{
    MemoryCatalog, MemoryIdentityStore, MemoryOrderStore, RecordingNotifier, RecordingSender,
    sample_products,
};
pub use mock_provider::MockProvider;
