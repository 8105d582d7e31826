// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hand-off to a human operator.

use chrono::Utc;
use serde_json::{Value, json};

use ostra_core::OstraError;
use ostra_core::traits::EscalationNotifier;
use ostra_core::types::{ChatMessage, ConversationState, EscalationAlert};

const CONTEXT_MESSAGES: usize = 5;

fn render_context(messages: &[ChatMessage]) -> String {
    let start = messages.len().saturating_sub(CONTEXT_MESSAGES);
    messages[start..]
        .iter()
        .map(|m| match m {
            ChatMessage::User { content } => format!("Покупатель: {content}"),
            ChatMessage::Assistant { content, .. } => format!("Агент: {content}"),
            ChatMessage::Tool { name, .. } => format!("[инструмент {name}]"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pause the conversation and alert the operator channel. The alert is
/// best-effort: a failed notification never blocks the hand-off itself.
pub async fn escalate_to_human(
    notifier: &dyn EscalationNotifier,
    state: &mut ConversationState,
    reason: &str,
) -> Result<Value, OstraError> {
    state.escalate = true;
    state.paused = true;

    let alert = EscalationAlert {
        customer_id: state.customer_id.clone(),
        channel: state.channel,
        phone: state.phone.clone(),
        reason: reason.to_string(),
        context: render_context(&state.messages),
        timestamp: Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
    };
    if let Err(e) = notifier.alert(&alert).await {
        tracing::warn!(customer_id = %state.customer_id, error = %e, "escalation alert failed");
    }

    Ok(json!({
        "escalated": true,
        "message": "Диалог передан оператору, он свяжется с вами в ближайшее время"
    }))
}
