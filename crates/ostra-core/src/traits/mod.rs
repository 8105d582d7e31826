// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Port traits the conversation core consumes. Concrete backends live in
//! their own crates (`ostra-storage` for the SQLite ports, channel adapters
//! outside the core).

pub mod catalog;
pub mod channel;
pub mod identity;
pub mod notifier;
pub mod orders;

pub use catalog::ProductCatalog;
pub use channel::ChannelSender;
pub use identity::IdentityStore;
pub use notifier::EscalationNotifier;
pub use orders::OrderStore;
