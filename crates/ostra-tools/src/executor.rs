// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch of model-issued tool calls against the conversation state.

use std::sync::Arc;

use serde_json::{Value, json};

use ostra_core::OstraError;
use ostra_core::traits::{EscalationNotifier, OrderStore, ProductCatalog};
use ostra_core::types::{CartLine, ConversationState, ToolCall};

use crate::{cart, escalate, order, stock};

fn arg_str<'a>(arguments: &'a Value, key: &str) -> Option<&'a str> {
    arguments.get(key).and_then(Value::as_str)
}

fn arg_bool(arguments: &Value, key: &str) -> bool {
    arguments.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Executes tool calls. Recoverable problems (unknown product, empty cart,
/// bad arguments) come back as `{"error": ...}` payloads that are fed to
/// the model as tool results; only integrity and infrastructure faults
/// surface as `Err`.
pub struct ToolExecutor {
    catalog: Arc<dyn ProductCatalog>,
    orders: Arc<dyn OrderStore>,
    notifier: Arc<dyn EscalationNotifier>,
}

impl ToolExecutor {
    pub fn new(
        catalog: Arc<dyn ProductCatalog>,
        orders: Arc<dyn OrderStore>,
        notifier: Arc<dyn EscalationNotifier>,
    ) -> Self {
        Self {
            catalog,
            orders,
            notifier,
        }
    }

    pub async fn execute(
        &self,
        state: &mut ConversationState,
        call: &ToolCall,
    ) -> Result<Value, OstraError> {
        tracing::debug!(tool = %call.name, customer_id = %state.customer_id, "executing tool");
        match call.name.as_str() {
            "check_stock" => {
                let Some(name) = arg_str(&call.arguments, "product_name") else {
                    return Ok(json!({ "error": "Не указано название товара" }));
                };
                stock::check_stock(
                    self.catalog.as_ref(),
                    name,
                    arg_str(&call.arguments, "delivery_date"),
                )
                .await
            }
            "get_product_price" => {
                let Some(id) = arg_str(&call.arguments, "product_id") else {
                    return Ok(json!({ "error": "Не указан идентификатор товара" }));
                };
                stock::get_product_price(self.catalog.as_ref(), id).await
            }
            "add_to_cart" => self.add_to_cart(state, &call.arguments).await,
            "create_order" => {
                order::create_order(
                    self.catalog.as_ref(),
                    self.orders.as_ref(),
                    state,
                    arg_bool(&call.arguments, "confirm"),
                )
                .await
            }
            "get_order_status" => {
                order::get_order_status(
                    self.orders.as_ref(),
                    state,
                    arg_str(&call.arguments, "order_number"),
                    arg_str(&call.arguments, "phone"),
                )
                .await
            }
            "escalate_to_human" => {
                let reason = arg_str(&call.arguments, "reason").unwrap_or("не указана");
                escalate::escalate_to_human(self.notifier.as_ref(), state, reason).await
            }
            other => {
                tracing::warn!(tool = other, "model requested an undeclared tool");
                Ok(json!({ "error": format!("Неизвестный инструмент {other}") }))
            }
        }
    }

    async fn add_to_cart(
        &self,
        state: &mut ConversationState,
        arguments: &Value,
    ) -> Result<Value, OstraError> {
        let Some(product_id) = arg_str(arguments, "product_id") else {
            return Ok(json!({ "error": "Не указан идентификатор товара" }));
        };
        let quantity = arguments
            .get("quantity")
            .and_then(Value::as_i64)
            .unwrap_or(1);
        // try_from also rejects values past u32::MAX instead of truncating.
        let Ok(quantity @ 1..) = u32::try_from(quantity) else {
            return Ok(json!({ "error": "Количество должно быть больше нуля" }));
        };
        let Some(product) = self.catalog.get_by_id(product_id).await? else {
            return Ok(json!({ "error": format!("Товар {product_id} не найден") }));
        };
        if !product.status.is_orderable() {
            return Ok(json!({
                "error": format!("Товар \"{}\" сейчас недоступен для заказа", product.name)
            }));
        }
        cart::merge_line(
            &mut state.cart,
            CartLine {
                product_id: product.id,
                name: product.name,
                quantity,
                unit: product.unit,
                unit_price: product.price,
            },
        );
        Ok(json!({
            "cart": state.cart,
            "cart_total": state.cart_total(),
        }))
    }
}
