// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Ostra workspace.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One messaging surface a customer message can arrive from.
///
/// Parsing is strict: an unknown channel token is rejected before any
/// identity lookup or queue write happens.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Telegram,
    Whatsapp,
    Vk,
    Instagram,
    Site,
}

/// Conversational mode for one turn. Every stage handler terminates the
/// turn; the next user message restarts at the supervisor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Greeting,
    Sales,
    Checkout,
    Support,
}

/// A structured action request emitted by the language model, executed by
/// the host system rather than answered in free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// One entry in the conversation transcript.
///
/// A tagged union instead of a role-string map so that role handling is
/// exhaustive at compile time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    User {
        content: String,
    },
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<ToolCall>>,
    },
    Tool {
        name: String,
        content: String,
    },
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage::Assistant {
            content: content.into(),
            tool_calls: None,
        }
    }

    pub fn tool_result(name: impl Into<String>, content: impl Into<String>) -> Self {
        ChatMessage::Tool {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Plain text content of the message, regardless of role.
    pub fn content(&self) -> &str {
        match self {
            ChatMessage::User { content }
            | ChatMessage::Assistant { content, .. }
            | ChatMessage::Tool { content, .. } => content,
        }
    }
}

/// One line of the conversation-scoped shopping cart.
///
/// The cart is never persisted to the order store before checkout succeeds,
/// and its `unit_price` is advisory only: order creation recomputes every
/// price from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit: String,
    pub unit_price: Decimal,
}

/// Structured delivery address collected during checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub street: String,
    pub house: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub porch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Immutable input to one conversation processing cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequest {
    pub channel: Channel,
    pub external_id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Mutable per-turn conversation state.
///
/// Created fresh at the start of each turn from the new user message (plus
/// any continuation history), mutated by stage handlers, and discarded at
/// turn end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub customer_id: String,
    pub channel: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub cart: Vec<CartLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<DeliveryAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_slot: Option<String>,
    pub stage: Stage,
    pub escalate: bool,
    pub paused: bool,
}

impl ConversationState {
    /// Build a fresh turn state seeded with the user's message.
    pub fn for_turn(customer_id: impl Into<String>, channel: Channel, text: &str) -> Self {
        Self {
            customer_id: customer_id.into(),
            channel,
            phone: None,
            messages: vec![ChatMessage::user(text)],
            cart: Vec::new(),
            delivery_address: None,
            delivery_date: None,
            delivery_slot: None,
            stage: Stage::Greeting,
            escalate: false,
            paused: false,
        }
    }

    /// Text of the most recent user message, if any.
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            ChatMessage::User { content } => Some(content.as_str()),
            _ => None,
        })
    }

    /// Content of the most recent assistant message, if any.
    pub fn latest_assistant_text(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            ChatMessage::Assistant { content, .. } => Some(content.as_str()),
            _ => None,
        })
    }

    /// Cart total at the advisory cart prices. Never used for order totals.
    pub fn cart_total(&self) -> Decimal {
        self.cart
            .iter()
            .map(|line| line.unit_price * Decimal::from(line.quantity))
            .sum()
    }
}

/// Durable queue payload carrying one inbound message from a channel
/// adapter to the conversation worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEnvelope {
    /// Idempotency key, `<channel>:<external_id>:<millis>`.
    pub message_id: String,
    pub channel: Channel,
    pub external_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub retry_count: u32,
    pub enqueued_at: String,
}

/// Declaration of a tool the model may call: name, human description, and
/// a JSON Schema for its arguments. Providers render this into their own
/// wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// One identity row binding a channel-scoped external id to a unified
/// customer id. Many rows may share one `unified_id` (one per channel).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerIdentity {
    pub id: String,
    pub unified_id: String,
    pub channel: Channel,
    pub external_id: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: String,
}

/// Lifecycle status of a catalog product. Only `Available` and `Preorder`
/// are orderable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Available,
    Preorder,
    Soon,
    Hidden,
}

impl ProductStatus {
    pub fn is_orderable(self) -> bool {
        matches!(self, ProductStatus::Available | ProductStatus::Preorder)
    }
}

/// A catalog product. The catalog is the only sanctioned price source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub unit: String,
    pub status: ProductStatus,
    pub short_description: Option<String>,
    pub display_order: i64,
}

/// An upcoming or active supply window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supply {
    pub id: String,
    pub name: String,
    pub supply_date: String,
    pub is_active: bool,
}

/// Per-product quantities within a supply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyItem {
    pub supply_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub reserved_qty: i64,
}

impl SupplyItem {
    pub fn available(&self) -> i64 {
        self.quantity - self.reserved_qty
    }
}

/// Order lifecycle status in the authoritative store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    Confirmed,
    Prep,
    InTransit,
    Delivered,
    Cancelled,
}

/// Coarse delivery slot for an order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliverySlot {
    Morning,
    Day,
    Evening,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Online,
}

/// One price-validated order line. `unit_price` comes from the catalog at
/// creation time, never from the cart or any LLM-produced value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedItem {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Input to the order store's atomic create operation. All prices are
/// already validated by the caller.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub customer_id: String,
    /// Contact phone collected at checkout. Used to bind the order to a
    /// pre-existing storefront customer for later status lookups.
    pub phone: Option<String>,
    pub channel: Channel,
    pub items: Vec<ValidatedItem>,
    pub total_amount: Decimal,
    pub address: DeliveryAddress,
    pub delivery_date: String,
    pub slot: DeliverySlot,
    pub payment_method: PaymentMethod,
}

/// An order as persisted by the authoritative store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedOrder {
    pub id: String,
    pub order_number: String,
    pub items: Vec<ValidatedItem>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub delivery_date: String,
    pub slot: DeliverySlot,
    pub created_at: String,
}

/// Condensed order view for status lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_number: String,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub delivery_date: String,
    pub created_at: String,
}

/// A pre-existing customer record in the storefront's own table, used as a
/// last-resort identity merge key and for phone-based order lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreCustomer {
    pub id: String,
    pub phone: String,
    pub user_id: Option<String>,
    pub name: Option<String>,
}

/// Payload for a human-escalation alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationAlert {
    pub customer_id: String,
    pub channel: Channel,
    pub phone: Option<String>,
    pub reason: String,
    /// Last few transcript lines, already rendered to text.
    pub context: String,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn channel_round_trips_through_tokens() {
        for channel in [
            Channel::Telegram,
            Channel::Whatsapp,
            Channel::Vk,
            Channel::Instagram,
            Channel::Site,
        ] {
            let token = channel.to_string();
            assert_eq!(Channel::from_str(&token).unwrap(), channel);
        }
    }

    #[test]
    fn unknown_channel_token_is_rejected() {
        assert!(Channel::from_str("fax").is_err());
    }

    #[test]
    fn chat_message_serializes_with_role_tag() {
        let msg = ChatMessage::tool_result("check_stock", r#"{"found":true}"#);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "tool");
        assert_eq!(json["name"], "check_stock");
    }

    #[test]
    fn latest_assistant_text_skips_tool_results() {
        let mut state = ConversationState::for_turn("cust-1", Channel::Telegram, "привет");
        state.messages.push(ChatMessage::assistant("Здравствуйте!"));
        state
            .messages
            .push(ChatMessage::tool_result("check_stock", "{}"));
        assert_eq!(state.latest_assistant_text(), Some("Здравствуйте!"));
    }

    #[test]
    fn orderable_statuses() {
        assert!(ProductStatus::Available.is_orderable());
        assert!(ProductStatus::Preorder.is_orderable());
        assert!(!ProductStatus::Soon.is_orderable());
        assert!(!ProductStatus::Hidden.is_orderable());
    }

    #[test]
    fn supply_item_available_subtracts_reservations() {
        let item = SupplyItem {
            supply_id: "sup-1".into(),
            product_id: "prod-1".into(),
            quantity: 40,
            reserved_qty: 12,
        };
        assert_eq!(item.available(), 28);
    }
}
