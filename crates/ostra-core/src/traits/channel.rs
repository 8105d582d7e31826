// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound delivery port toward channel adapters.

use async_trait::async_trait;

use crate::error::OstraError;
use crate::types::Channel;

/// Delivers reply text back to the customer on the originating channel.
///
/// Fire-and-forget from the core's perspective: the worker logs delivery
/// failures but does not retry them.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    async fn deliver(
        &self,
        channel: Channel,
        external_id: &str,
        text: &str,
    ) -> Result<(), OstraError>;
}
