// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram Bot API adapter.
//!
//! Implements the outbound half of the Telegram channel: reply delivery
//! to customers and escalation alerts to the operator chat, both through
//! `sendMessage`. Inbound webhook handling lives outside this workspace
//! and feeds the queue through the producer.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use ostra_config::model::TelegramConfig;
use ostra_core::OstraError;
use ostra_core::traits::{ChannelSender, EscalationNotifier};
use ostra_core::types::{Channel, EscalationAlert};

const API_BASE_URL: &str = "https://api.telegram.org";
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Outbound Telegram client. One instance serves both customer replies and
/// operator alerts.
#[derive(Debug, Clone)]
pub struct TelegramApi {
    client: reqwest::Client,
    token: String,
    admin_chat_id: Option<String>,
    base_url: String,
}

impl TelegramApi {
    pub fn new(config: &TelegramConfig) -> Result<Self, OstraError> {
        let token = config
            .bot_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| OstraError::Config("telegram.bot_token is required".into()))?;

        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| OstraError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            token,
            admin_chat_id: config.admin_chat_id.clone(),
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), OstraError> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.token);
        let response = self
            .client
            .post(&url)
            .json(&SendMessage { chat_id, text })
            .send()
            .await
            .map_err(|e| OstraError::Channel {
                message: format!("telegram request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OstraError::Channel {
                message: format!("telegram sendMessage returned {status}: {body}"),
                source: None,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelSender for TelegramApi {
    async fn deliver(
        &self,
        channel: Channel,
        external_id: &str,
        text: &str,
    ) -> Result<(), OstraError> {
        if channel != Channel::Telegram {
            return Err(OstraError::Channel {
                message: format!("telegram adapter cannot deliver to {channel}"),
                source: None,
            });
        }
        tracing::debug!(external_id, "delivering telegram reply");
        self.send_message(external_id, text).await
    }
}

#[async_trait]
impl EscalationNotifier for TelegramApi {
    async fn alert(&self, alert: &EscalationAlert) -> Result<(), OstraError> {
        let Some(chat_id) = self.admin_chat_id.as_deref() else {
            return Err(OstraError::Config(
                "telegram.admin_chat_id is not set, cannot deliver escalation alerts".into(),
            ));
        };
        let text = format!(
            "Запрос оператора\nКлиент: {}\nКанал: {}\nТелефон: {}\nПричина: {}\n\n{}",
            alert.customer_id,
            alert.channel,
            alert.phone.as_deref().unwrap_or("не указан"),
            alert.reason,
            alert.context,
        );
        self.send_message(chat_id, &text).await
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config(admin: Option<&str>) -> TelegramConfig {
        TelegramConfig {
            bot_token: Some("123:abc".to_string()),
            admin_chat_id: admin.map(str::to_string),
        }
    }

    async fn api(server: &MockServer, admin: Option<&str>) -> TelegramApi {
        TelegramApi::new(&config(admin))
            .unwrap()
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn deliver_posts_send_message_with_chat_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_partial_json(serde_json::json!({
                "chat_id": "tg-1001",
                "text": "Добрый день!"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let api = api(&server, None).await;
        api.deliver(Channel::Telegram, "tg-1001", "Добрый день!")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn deliver_rejects_foreign_channels() {
        let server = MockServer::start().await;
        let api = api(&server, None).await;
        let err = api
            .deliver(Channel::Vk, "vk-1", "привет")
            .await
            .unwrap_err();
        assert!(matches!(err, OstraError::Channel { .. }));
    }

    #[tokio::test]
    async fn alert_goes_to_the_admin_chat() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_partial_json(serde_json::json!({"chat_id": "admin-7"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let api = api(&server, Some("admin-7")).await;
        api.alert(&EscalationAlert {
            customer_id: "cust-1".to_string(),
            channel: Channel::Telegram,
            phone: None,
            reason: "жалоба".to_string(),
            context: "Покупатель: где заказ".to_string(),
            timestamp: "2026-08-30T12:00:00.000Z".to_string(),
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn alert_without_admin_chat_is_a_config_error() {
        let server = MockServer::start().await;
        let api = api(&server, None).await;
        let err = api
            .alert(&EscalationAlert {
                customer_id: "cust-1".to_string(),
                channel: Channel::Telegram,
                phone: None,
                reason: "жалоба".to_string(),
                context: String::new(),
                timestamp: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, OstraError::Config(_)));
    }

    #[tokio::test]
    async fn api_error_status_surfaces_as_channel_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("bot blocked"))
            .mount(&server)
            .await;

        let api = api(&server, None).await;
        let err = api
            .deliver(Channel::Telegram, "tg-1001", "привет")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("403"));
    }
}
