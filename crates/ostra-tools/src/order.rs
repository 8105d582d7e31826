// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order creation and status lookup.
//!
//! Order totals are always recomputed from the catalog at creation time.
//! Cart prices are a display convenience and never reach the store.

use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use ostra_core::OstraError;
use ostra_core::traits::{OrderStore, ProductCatalog};
use ostra_core::types::{
    CartLine, ConversationState, DeliverySlot, NewOrder, OrderStatus, PaymentMethod,
    ValidatedItem,
};

const STATUS_LIMIT: i64 = 5;
const ORDER_CODE: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Human-facing number, `O<yymmdd>-<4 base36 chars>`. Uniqueness is
/// enforced by the store; a collision is retried once with a fresh number.
pub fn generate_order_number() -> String {
    let date = Utc::now().format("%y%m%d");
    let mut rng = rand::thread_rng();
    let code: String = (0..4)
        .map(|_| ORDER_CODE[rng.gen_range(0..ORDER_CODE.len())] as char)
        .collect();
    format!("O{date}-{code}")
}

/// Re-price every cart line from the catalog. A product missing from the
/// catalog at this point means the cart references something that no
/// longer exists, which is an integrity fault rather than a user error.
pub async fn validate_items(
    catalog: &dyn ProductCatalog,
    cart: &[CartLine],
) -> Result<(Vec<ValidatedItem>, Decimal), OstraError> {
    let mut items = Vec::with_capacity(cart.len());
    let mut total = Decimal::ZERO;
    for line in cart {
        let product = catalog.get_by_id(&line.product_id).await?.ok_or_else(|| {
            OstraError::Integrity(format!(
                "cart references unknown product {}",
                line.product_id
            ))
        })?;
        let line_total = product.price * Decimal::from(line.quantity);
        total += line_total;
        items.push(ValidatedItem {
            product_id: product.id,
            name: product.name,
            quantity: line.quantity,
            unit_price: product.price,
            line_total,
        });
    }
    Ok((items, total))
}

fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::New => "Новый",
        OrderStatus::Confirmed => "Подтверждён",
        OrderStatus::Prep => "Готовится",
        OrderStatus::InTransit => "В доставке",
        OrderStatus::Delivered => "Доставлен",
        OrderStatus::Cancelled => "Отменён",
    }
}

/// Create an order from the conversation cart, confirming prices against
/// the catalog. On success the cart is cleared.
pub async fn create_order(
    catalog: &dyn ProductCatalog,
    orders: &dyn OrderStore,
    state: &mut ConversationState,
    confirm: bool,
) -> Result<Value, OstraError> {
    if !confirm {
        return Ok(json!({ "error": "Заказ не подтверждён покупателем" }));
    }
    if state.cart.is_empty() {
        return Ok(json!({ "error": "Корзина пуста" }));
    }
    let Some(address) = state.delivery_address.clone() else {
        return Ok(json!({ "error": "Не указан адрес доставки" }));
    };
    let Some(delivery_date) = state.delivery_date.clone() else {
        return Ok(json!({ "error": "Не указана дата доставки" }));
    };
    let slot = state
        .delivery_slot
        .as_deref()
        .and_then(|s| s.parse::<DeliverySlot>().ok())
        .unwrap_or(DeliverySlot::Day);

    let (items, total_amount) = validate_items(catalog, &state.cart).await?;

    let mut order = NewOrder {
        order_number: generate_order_number(),
        customer_id: state.customer_id.clone(),
        phone: state.phone.clone(),
        channel: state.channel,
        items,
        total_amount,
        address,
        delivery_date,
        slot,
        payment_method: PaymentMethod::Cash,
    };

    let created = match orders.create_order(&order).await {
        Ok(created) => created,
        Err(first) => {
            tracing::warn!(
                order_number = %order.order_number,
                error = %first,
                "order create failed, retrying with a fresh number"
            );
            order.order_number = generate_order_number();
            orders.create_order(&order).await?
        }
    };

    state.cart.clear();
    Ok(json!({
        "order_number": created.order_number,
        "total_amount": created.total_amount,
        "status": created.status,
        "delivery_date": created.delivery_date,
        "slot": created.slot,
    }))
}

/// Recent orders by number or by phone, newest first. The phone of the
/// conversation's resolved identity is used when the model passes none.
pub async fn get_order_status(
    orders: &dyn OrderStore,
    state: &ConversationState,
    order_number: Option<&str>,
    phone: Option<&str>,
) -> Result<Value, OstraError> {
    let phone = phone.or(state.phone.as_deref());
    if order_number.is_none() && phone.is_none() {
        return Ok(json!({
            "error": "Нужен номер заказа или телефон, на который он оформлен"
        }));
    }
    let found = orders.find_orders(phone, order_number, STATUS_LIMIT).await?;
    if found.is_empty() {
        return Ok(json!({ "orders": [], "message": "Заказы не найдены" }));
    }
    let rendered: Vec<Value> = found
        .iter()
        .map(|o| {
            json!({
                "order_number": o.order_number,
                "status": o.status,
                "status_label": status_label(o.status),
                "total_amount": o.total_amount,
                "delivery_date": o.delivery_date,
                "created_at": o.created_at,
            })
        })
        .collect();
    Ok(json!({ "orders": rendered }))
}

#[cfg(test)]
mod tests {
    use ostra_core::types::{Channel, DeliveryAddress, Stage};
    use ostra_test_utils::{MemoryCatalog, MemoryOrderStore, sample_products};

    use super::*;

    fn checkout_state() -> ConversationState {
        let mut state =
            ConversationState::for_turn("cust-1", Channel::Telegram, "оформляем");
        state.stage = Stage::Checkout;
        state.delivery_address = Some(DeliveryAddress {
            street: "Невский проспект".to_string(),
            house: "12".to_string(),
            flat: Some("4".to_string()),
            porch: None,
            floor: None,
            comment: None,
        });
        state.delivery_date = Some("2026-09-05".to_string());
        state.delivery_slot = Some("evening".to_string());
        state
    }

    fn oyster_line(quantity: u32, unit_price: Decimal) -> CartLine {
        CartLine {
            product_id: "prod_oyster".to_string(),
            name: "Устрицы Хасанские".to_string(),
            quantity,
            unit: "шт".to_string(),
            unit_price,
        }
    }

    #[test]
    fn order_numbers_have_the_documented_shape() {
        let number = generate_order_number();
        assert_eq!(number.len(), 12);
        assert!(number.starts_with('O'));
        assert_eq!(&number[7..8], "-");
        assert!(number[8..].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn total_comes_from_catalog_not_cart() {
        let catalog = MemoryCatalog::with_products(sample_products());
        let orders = MemoryOrderStore::default();
        let mut state = checkout_state();
        // Cart claims 100 per unit; the catalog says 450.
        state.cart.push(oyster_line(6, Decimal::new(10000, 2)));

        let result = create_order(&catalog, &orders, &mut state, true)
            .await
            .unwrap();
        assert_eq!(result["total_amount"], "2700.00");
        assert!(state.cart.is_empty());

        let created = orders.created_orders();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].total_amount, Decimal::new(270000, 2));
        assert_eq!(created[0].items[0].unit_price, Decimal::new(45000, 2));
    }

    #[tokio::test]
    async fn unknown_cart_product_is_an_integrity_fault() {
        let catalog = MemoryCatalog::with_products(sample_products());
        let orders = MemoryOrderStore::default();
        let mut state = checkout_state();
        state.cart.push(CartLine {
            product_id: "prod_gone".to_string(),
            name: "Фантом".to_string(),
            quantity: 1,
            unit: "шт".to_string(),
            unit_price: Decimal::ONE,
        });

        let err = create_order(&catalog, &orders, &mut state, true)
            .await
            .unwrap_err();
        assert!(matches!(err, OstraError::Integrity(_)));
        assert!(orders.created_orders().is_empty());
    }

    #[tokio::test]
    async fn unconfirmed_or_empty_cart_is_a_soft_error() {
        let catalog = MemoryCatalog::with_products(sample_products());
        let orders = MemoryOrderStore::default();
        let mut state = checkout_state();
        state.cart.push(oyster_line(1, Decimal::new(45000, 2)));

        let result = create_order(&catalog, &orders, &mut state, false)
            .await
            .unwrap();
        assert!(result["error"].as_str().unwrap().contains("не подтверждён"));
        // The unconfirmed attempt must not touch the cart.
        assert_eq!(state.cart.len(), 1);

        state.cart.clear();
        let result = create_order(&catalog, &orders, &mut state, true)
            .await
            .unwrap();
        assert_eq!(result["error"], "Корзина пуста");
    }

    #[tokio::test]
    async fn status_lookup_labels_in_russian() {
        let catalog = MemoryCatalog::with_products(sample_products());
        let orders = MemoryOrderStore::default();
        let mut state = checkout_state();
        state.cart.push(oyster_line(2, Decimal::new(45000, 2)));
        let created = create_order(&catalog, &orders, &mut state, true)
            .await
            .unwrap();
        let number = created["order_number"].as_str().unwrap();

        let result = get_order_status(&orders, &state, Some(number), None)
            .await
            .unwrap();
        assert_eq!(result["orders"][0]["status_label"], "Новый");
        assert_eq!(result["orders"][0]["total_amount"], "900.00");
    }

    #[tokio::test]
    async fn lookup_without_any_key_is_a_soft_error() {
        let orders = MemoryOrderStore::default();
        let state = ConversationState::for_turn("cust-1", Channel::Site, "где заказ");
        let result = get_order_status(&orders, &state, None, None).await.unwrap();
        assert!(result["error"].as_str().unwrap().contains("номер заказа"));
    }
}
