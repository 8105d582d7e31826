// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation tools and their executor.
//!
//! A tool is a side effect the model can request by emitting a structured
//! call. The executor runs the call against the catalog, the order store,
//! and the conversation state, and hands the result back to the model as
//! a tool message. Recoverable problems become `{"error": ...}` results;
//! the one hard invariant is price integrity, enforced in [`order`].

pub mod cart;
pub mod escalate;
pub mod executor;
pub mod order;
pub mod specs;
pub mod stock;

pub use executor::ToolExecutor;
pub use specs::tools_for_stage;
