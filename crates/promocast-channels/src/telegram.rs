//! Telegram Bot API transport — message/photo sending and chat probes.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use promocast_core::error::{PromoError, Result};
use promocast_core::traits::Transport;

/// Telegram transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,
}

fn default_send_timeout() -> u64 {
    30
}

impl TelegramConfig {
    pub fn new(bot_token: &str) -> Self {
        Self {
            bot_token: bot_token.to_string(),
            send_timeout_secs: default_send_timeout(),
        }
    }
}

/// Telegram Bot API client. Chat ids are kept as strings so numeric
/// ids and `@channelname` handles both work.
pub struct TelegramTransport {
    config: TelegramConfig,
    client: reqwest::Client,
    /// Overridable for tests against a local stub server.
    api_base: String,
}

impl TelegramTransport {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            api_base: "https://api.telegram.org".into(),
        }
    }

    pub fn with_api_base(config: TelegramConfig, api_base: &str) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            ..Self::new(config)
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.config.bot_token, method)
    }

    fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.config.send_timeout_secs)
    }

    /// Map a failed API response to the error taxonomy: chat-level
    /// rejections are `DestinationInvalid`, the rest `Transport`.
    fn api_error(chat_id: &str, description: Option<String>) -> PromoError {
        let description = description.unwrap_or_else(|| "unknown API error".into());
        let lowered = description.to_lowercase();
        if lowered.contains("chat not found")
            || lowered.contains("bot was kicked")
            || lowered.contains("bot was blocked")
            || lowered.contains("chat_id is empty")
            || lowered.contains("user is deactivated")
        {
            PromoError::DestinationInvalid(format!("{chat_id}: {description}"))
        } else {
            PromoError::Transport(description)
        }
    }

    async fn check<T: serde::de::DeserializeOwned>(
        chat_id: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| PromoError::Transport(format!("invalid Telegram response: {e}")))?;
        if !body.ok {
            return Err(Self::api_error(chat_id, body.description));
        }
        body.result
            .ok_or_else(|| PromoError::Transport("empty API result".into()))
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| PromoError::Transport(format!("sendMessage failed: {e}")))?;
        Self::check::<serde_json::Value>(chat_id, response).await?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: &str, photo: &Path, caption: &str) -> Result<()> {
        let bytes = tokio::fs::read(photo).await?;
        let file_name = photo
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo".into());
        tracing::debug!("sendPhoto {file_name} ({} bytes) to {chat_id}", bytes.len());

        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part(
                "photo",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );

        let response = self
            .client
            .post(self.api_url("sendPhoto"))
            .multipart(form)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| PromoError::Transport(format!("sendPhoto failed: {e}")))?;
        Self::check::<serde_json::Value>(chat_id, response).await?;
        Ok(())
    }

    async fn probe(&self, chat_id: &str) -> Result<String> {
        let response = self
            .client
            .get(self.api_url("getChat"))
            .query(&[("chat_id", chat_id)])
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| PromoError::Transport(format!("getChat failed: {e}")))?;
        let chat: TelegramChat = Self::check(chat_id, response).await?;
        Ok(chat.label())
    }
}

// --- Telegram API Types ---

#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
    pub title: Option<String>,
    pub username: Option<String>,
}

impl TelegramChat {
    /// Identifying label written into a destination's status field.
    pub fn label(&self) -> String {
        if let Some(title) = &self.title {
            title.clone()
        } else if let Some(username) = &self.username {
            format!("@{username}")
        } else {
            self.id.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_label_prefers_title() {
        let chat = TelegramChat {
            id: -100,
            chat_type: "supergroup".into(),
            title: Some("Promo Room".into()),
            username: Some("promo".into()),
        };
        assert_eq!(chat.label(), "Promo Room");

        let chat = TelegramChat {
            id: 42,
            chat_type: "private".into(),
            title: None,
            username: None,
        };
        assert_eq!(chat.label(), "42");
    }

    #[test]
    fn chat_not_found_is_destination_invalid() {
        let err = TelegramTransport::api_error("-100", Some("Bad Request: chat not found".into()));
        assert!(matches!(err, PromoError::DestinationInvalid(_)));

        let err = TelegramTransport::api_error("-100", Some("Internal Server Error".into()));
        assert!(matches!(err, PromoError::Transport(_)));
    }

    #[test]
    fn api_url_includes_token_and_method() {
        let transport =
            TelegramTransport::with_api_base(TelegramConfig::new("123:abc"), "http://localhost:1/");
        assert_eq!(
            transport.api_url("sendMessage"),
            "http://localhost:1/bot123:abc/sendMessage"
        );
    }
}
