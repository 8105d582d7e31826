// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Declarations of the tools exposed to the language model, and the
//! per-stage subsets the stage handlers offer.

use serde_json::json;

use ostra_core::types::{Stage, ToolSpec};

pub fn check_stock() -> ToolSpec {
    ToolSpec {
        name: "check_stock".to_string(),
        description: "Проверить наличие товара по названию. Возвращает цену, \
                      единицу измерения и доступность в ближайшей поставке."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "product_name": {
                    "type": "string",
                    "description": "Название товара или его часть"
                },
                "delivery_date": {
                    "type": "string",
                    "description": "Желаемая дата доставки в формате YYYY-MM-DD"
                }
            },
            "required": ["product_name"]
        }),
    }
}

pub fn get_product_price() -> ToolSpec {
    ToolSpec {
        name: "get_product_price".to_string(),
        description: "Получить актуальную цену товара по его идентификатору."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "product_id": {
                    "type": "string",
                    "description": "Идентификатор товара из каталога"
                }
            },
            "required": ["product_id"]
        }),
    }
}

pub fn add_to_cart() -> ToolSpec {
    ToolSpec {
        name: "add_to_cart".to_string(),
        description: "Добавить товар в корзину покупателя.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "product_id": {
                    "type": "string",
                    "description": "Идентификатор товара из каталога"
                },
                "quantity": {
                    "type": "integer",
                    "description": "Количество, по умолчанию 1"
                }
            },
            "required": ["product_id"]
        }),
    }
}

pub fn create_order() -> ToolSpec {
    ToolSpec {
        name: "create_order".to_string(),
        description: "Оформить заказ из текущей корзины. Вызывать только \
                      после явного подтверждения покупателя."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "confirm": {
                    "type": "boolean",
                    "description": "Покупатель подтвердил состав и сумму заказа"
                }
            },
            "required": ["confirm"]
        }),
    }
}

pub fn get_order_status() -> ToolSpec {
    ToolSpec {
        name: "get_order_status".to_string(),
        description: "Узнать статус заказа по номеру заказа или по телефону."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "order_number": {
                    "type": "string",
                    "description": "Номер заказа вида O240101-XXXX"
                },
                "phone": {
                    "type": "string",
                    "description": "Телефон покупателя"
                }
            }
        }),
    }
}

pub fn escalate_to_human() -> ToolSpec {
    ToolSpec {
        name: "escalate_to_human".to_string(),
        description: "Передать диалог живому оператору. Использовать при \
                      жалобах или по прямой просьбе покупателя."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "reason": {
                    "type": "string",
                    "description": "Краткая причина передачи оператору"
                }
            },
            "required": ["reason"]
        }),
    }
}

/// Tools offered to the model for a given stage. The greeting stage never
/// reaches a model call, so it carries no tools.
pub fn tools_for_stage(stage: Stage) -> Vec<ToolSpec> {
    match stage {
        Stage::Sales => vec![check_stock(), get_product_price(), add_to_cart()],
        Stage::Checkout => vec![create_order()],
        Stage::Support => vec![get_order_status(), escalate_to_human()],
        Stage::Greeting => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_subsets_match_stage_responsibilities() {
        let names =
            |stage| -> Vec<String> { tools_for_stage(stage).into_iter().map(|t| t.name).collect() };
        assert_eq!(
            names(Stage::Sales),
            ["check_stock", "get_product_price", "add_to_cart"]
        );
        assert_eq!(names(Stage::Checkout), ["create_order"]);
        assert_eq!(names(Stage::Support), ["get_order_status", "escalate_to_human"]);
        assert!(names(Stage::Greeting).is_empty());
    }

    #[test]
    fn every_spec_declares_an_object_schema() {
        for spec in [
            check_stock(),
            get_product_price(),
            add_to_cart(),
            create_order(),
            get_order_status(),
            escalate_to_human(),
        ] {
            assert_eq!(spec.parameters["type"], "object", "{}", spec.name);
        }
    }
}
