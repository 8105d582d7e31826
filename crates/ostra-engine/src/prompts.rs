// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System prompts for the stage handlers, with per-turn context blocks.

use std::fmt::Write;

use ostra_core::types::{ConversationState, Stage};

const SALES_PROMPT: &str = "\
Ты — консультант магазина морепродуктов. Помогаешь покупателям выбрать \
товар, отвечаешь на вопросы о наличии и ценах. Всегда проверяй наличие и \
цену через инструменты, никогда не называй цену по памяти. Отвечай кратко \
и дружелюбно, на русском языке. Если покупатель готов купить, добавь товар \
в корзину через add_to_cart.";

const CHECKOUT_PROMPT: &str = "\
Ты — помощник оформления заказа в магазине морепродуктов. Уточни адрес \
доставки, дату и удобный интервал, затем назови состав корзины и сумму и \
попроси подтверждение. Вызывай create_order только после явного \
подтверждения покупателя. Отвечай кратко, на русском языке.";

const SUPPORT_PROMPT: &str = "\
Ты — сотрудник поддержки магазина морепродуктов. Отвечаешь на вопросы о \
статусе заказов через get_order_status. Если покупатель недоволен или \
просит живого человека, передай диалог оператору через escalate_to_human. \
Отвечай кратко и вежливо, на русском языке.";

/// Base prompt for a stage plus cart, address, and phone context blocks.
/// The greeting stage never reaches a model call.
pub fn system_prompt(stage: Stage, state: &ConversationState) -> String {
    let mut prompt = match stage {
        Stage::Sales | Stage::Greeting => SALES_PROMPT.to_string(),
        Stage::Checkout => CHECKOUT_PROMPT.to_string(),
        Stage::Support => SUPPORT_PROMPT.to_string(),
    };

    if !state.cart.is_empty() {
        prompt.push_str("\n\nТекущая корзина покупателя:");
        for line in &state.cart {
            let _ = write!(
                prompt,
                "\n- {}: {} x {}₽",
                line.name, line.quantity, line.unit_price
            );
        }
        if stage == Stage::Checkout {
            let _ = write!(prompt, "\n\nИтого: {}₽", state.cart_total());
        }
    }

    if let Some(address) = &state.delivery_address {
        let _ = write!(
            prompt,
            "\n\nАдрес доставки: {}, д. {}",
            address.street, address.house
        );
        if let Some(flat) = &address.flat {
            let _ = write!(prompt, ", кв. {flat}");
        }
    }

    if let Some(phone) = &state.phone {
        let _ = write!(prompt, "\n\nТелефон покупателя: {phone}");
    }

    prompt
}
