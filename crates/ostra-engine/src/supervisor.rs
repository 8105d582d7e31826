// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword-based routing of a turn to its stage handler.
//!
//! The rules form an ordered table; the first matching rule wins and the
//! fallthrough is sales. Matching is a case-insensitive substring test, so
//! inflected forms catch on their stems ("оформ" matches "оформите").

use ostra_core::types::Stage;

/// What the supervisor decided for this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub stage: Stage,
    pub escalate: bool,
}

struct RouteInput<'a> {
    text: &'a str,
    cart_is_empty: bool,
}

struct Rule {
    name: &'static str,
    applies: fn(&RouteInput) -> bool,
    stage: Stage,
    escalate: bool,
}

const SUPPORT_KEYWORDS: &[&str] = &[
    "статус", "заказ", "где", "когда", "доставка", "жалоба", "проблема", "помощь",
    "оператор", "человек",
];

/// Narrower subset that distinguishes a status inquiry from sales chatter
/// that merely mentions delivery or help.
const STATUS_KEYWORDS: &[&str] = &["статус", "где", "заказ"];

const CHECKOUT_KEYWORDS: &[&str] = &[
    "адрес", "оформ", "заказать", "подтверд", "оплат", "доставить", "куда", "слот",
    "время",
];

const ESCALATE_KEYWORDS: &[&str] = &["человек", "оператор", "менеджер", "позвоните"];

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

fn status_inquiry(input: &RouteInput) -> bool {
    contains_any(input.text, SUPPORT_KEYWORDS) && contains_any(input.text, STATUS_KEYWORDS)
}

fn checkout_intent(input: &RouteInput) -> bool {
    !input.cart_is_empty && contains_any(input.text, CHECKOUT_KEYWORDS)
}

fn human_request(input: &RouteInput) -> bool {
    contains_any(input.text, ESCALATE_KEYWORDS)
}

const RULES: &[Rule] = &[
    Rule {
        name: "status-inquiry",
        applies: status_inquiry,
        stage: Stage::Support,
        escalate: false,
    },
    Rule {
        name: "checkout-intent",
        applies: checkout_intent,
        stage: Stage::Checkout,
        escalate: false,
    },
    Rule {
        name: "human-request",
        applies: human_request,
        stage: Stage::Support,
        escalate: true,
    },
];

/// Route a user message. `text` is the latest user message; an absent or
/// empty message defaults to sales.
pub fn route(text: Option<&str>, cart_is_empty: bool) -> Route {
    let Some(text) = text.filter(|t| !t.is_empty()) else {
        return Route {
            stage: Stage::Sales,
            escalate: false,
        };
    };
    let lowered = text.to_lowercase();
    let input = RouteInput {
        text: &lowered,
        cart_is_empty,
    };
    for rule in RULES {
        if (rule.applies)(&input) {
            tracing::debug!(rule = rule.name, stage = %rule.stage, "routed turn");
            return Route {
                stage: rule.stage,
                escalate: rule.escalate,
            };
        }
    }
    Route {
        stage: Stage::Sales,
        escalate: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_questions_go_to_sales() {
        let r = route(Some("Сколько стоят устрицы?"), true);
        assert_eq!(r.stage, Stage::Sales);
        assert!(!r.escalate);
    }

    #[test]
    fn status_inquiry_goes_to_support() {
        assert_eq!(route(Some("Где мой заказ?"), true).stage, Stage::Support);
        assert_eq!(route(Some("Какой статус доставки?"), true).stage, Stage::Support);
    }

    #[test]
    fn delivery_mention_alone_stays_in_sales() {
        // "доставка" is a support keyword but not a status keyword.
        assert_eq!(
            route(Some("Есть доставка на Васильевский?"), true).stage,
            Stage::Sales
        );
    }

    #[test]
    fn checkout_needs_a_non_empty_cart() {
        assert_eq!(route(Some("подтверждаю, оформляйте"), false).stage, Stage::Checkout);
        assert_eq!(route(Some("подтверждаю, оформляйте"), true).stage, Stage::Sales);
    }

    #[test]
    fn status_words_outrank_checkout_words() {
        // "заказ" matches the status rule before the checkout rule is tried.
        let r = route(Some("оформите заказ"), false);
        assert_eq!(r.stage, Stage::Support);
    }

    #[test]
    fn human_request_escalates() {
        let r = route(Some("Позовите менеджера"), true);
        assert_eq!(r.stage, Stage::Support);
        assert!(r.escalate);
    }

    #[test]
    fn human_word_with_status_word_is_a_plain_inquiry() {
        // "человек" sits in both keyword sets; the status rule wins.
        let r = route(Some("где заказ, нужен человек"), true);
        assert_eq!(r.stage, Stage::Support);
        assert!(!r.escalate);
    }

    #[test]
    fn empty_message_defaults_to_sales() {
        assert_eq!(route(None, true).stage, Stage::Sales);
        assert_eq!(route(Some(""), true).stage, Stage::Sales);
    }
}
