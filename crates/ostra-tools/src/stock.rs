// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stock and price lookup tools.

use serde_json::{Value, json};

use ostra_core::OstraError;
use ostra_core::traits::ProductCatalog;
use ostra_core::types::Product;

const MAX_ALTERNATIVES: usize = 3;

fn product_json(product: &Product) -> Value {
    json!({
        "product_id": product.id,
        "name": product.name,
        "price": product.price,
        "unit": product.unit,
        "status": product.status,
    })
}

/// Look a product up by name fragment. When a delivery date is given and
/// the product sits in an active supply, availability is quantity minus
/// existing reservations.
pub async fn check_stock(
    catalog: &dyn ProductCatalog,
    product_name: &str,
    delivery_date: Option<&str>,
) -> Result<Value, OstraError> {
    let matches = catalog.find_by_name_substring(product_name).await?;
    let Some(product) = matches.first() else {
        let alternatives: Vec<String> = catalog
            .list_available(None, MAX_ALTERNATIVES as i64)
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect();
        return Ok(json!({
            "found": false,
            "message": format!("Товар \"{product_name}\" не найден"),
            "alternatives": alternatives,
        }));
    };

    let mut result = json!({
        "found": true,
        "product": product_json(product),
    });

    if let Some(date) = delivery_date {
        if let Some(item) = catalog.active_supply_for(&product.id).await? {
            result["supply"] = json!({
                "delivery_date": date,
                "available": item.available(),
            });
        } else {
            result["supply"] = json!({
                "delivery_date": date,
                "available": 0,
                "message": "Нет активной поставки на эту дату",
            });
        }
    }

    let alternatives: Vec<String> = matches
        .iter()
        .skip(1)
        .take(MAX_ALTERNATIVES)
        .map(|p| p.name.clone())
        .collect();
    if !alternatives.is_empty() {
        result["alternatives"] = json!(alternatives);
    }

    Ok(result)
}

/// The only sanctioned way to quote a price to the customer.
pub async fn get_product_price(
    catalog: &dyn ProductCatalog,
    product_id: &str,
) -> Result<Value, OstraError> {
    match catalog.get_by_id(product_id).await? {
        Some(product) => Ok(product_json(&product)),
        None => Ok(json!({ "error": format!("Товар {product_id} не найден") })),
    }
}
