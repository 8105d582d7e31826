// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cross-channel customer identity resolution.
//!
//! The same person reaching the shop over Telegram today and WhatsApp
//! tomorrow should land on one customer record. Resolution is cache-first
//! and merge-happy: phone and email observed in message metadata join
//! channel-scoped identities into one unified id.

pub mod cache;
pub mod resolver;

pub use cache::IdentityCache;
pub use resolver::{IdentityResolver, ResolvedCustomer};
