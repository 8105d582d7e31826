// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Out-of-band operator alerting port.

use async_trait::async_trait;

use crate::error::OstraError;
use crate::types::EscalationAlert;

/// Sends a human-escalation alert to the operator channel.
///
/// Alerting is best-effort: a failed alert never fails the escalation that
/// triggered it.
#[async_trait]
pub trait EscalationNotifier: Send + Sync {
    async fn alert(&self, alert: &EscalationAlert) -> Result<(), OstraError>;
}
