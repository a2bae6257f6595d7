//! Telegram adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::application::errors::BotError;
use crate::domain::entities::{self, InboundEvent, IncomingMessage};
use crate::domain::traits::{Bot, BotInfo};

/// Telegram API base URL
const API_BASE: &str = "https://api.telegram.org";

/// Telegram update type
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    pub contact: Option<Contact>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Contact {
    pub phone_number: String,
    pub first_name: Option<String>,
    pub user_id: Option<i64>,
}

/// Envelope wrapping every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, BotError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err(BotError::Parse("response without result".to_string())),
            (false, _) => Err(BotError::Api(
                self.description.unwrap_or_else(|| "unknown error".to_string()),
            )),
        }
    }
}

impl From<Update> for InboundEvent {
    fn from(update: Update) -> Self {
        InboundEvent {
            message: update.message.map(|msg| IncomingMessage {
                from: msg.from.map(|u| entities::Sender {
                    id: u.id,
                    username: u.username,
                }),
                chat: Some(entities::ChatRef { id: msg.chat.id }),
                contact: msg.contact.map(|c| entities::Contact {
                    phone_number: c.phone_number,
                }),
            }),
        }
    }
}

/// Telegram bot adapter
pub struct TelegramAdapter {
    token: String,
    client: Client,
    info: BotInfo,
    parse_mode: Option<String>,
}

impl TelegramAdapter {
    pub fn new(token: impl Into<String>, parse_mode: Option<String>) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
            info: BotInfo {
                id: "unknown".to_string(),
                name: "relay-bot".to_string(),
                username: "relay_bot".to_string(),
            },
            parse_mode,
        }
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", API_BASE, self.token, method)
    }

    /// POST a JSON body to a Bot API method and unwrap the envelope
    async fn call<B: Serialize, T: DeserializeOwned>(&self, method: &str, body: &B) -> Result<T, BotError> {
        let response = self.client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| BotError::Network(e.without_url().to_string()))?;

        let status = response.status();
        let data: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| BotError::Parse(format!("{} ({})", e.without_url(), status)))?;

        data.into_result()
    }

    /// Fetch bot info from Telegram API; fails on a bad token
    pub async fn fetch_bot_info(&mut self) -> Result<(), BotError> {
        #[derive(Deserialize)]
        struct BotInfoResponse {
            id: i64,
            first_name: String,
            username: String,
        }

        let prefix: String = self.token.chars().take(8).collect();
        tracing::info!("Connecting to Telegram (token: {}...)", prefix);

        let me: BotInfoResponse = self.call("getMe", &serde_json::json!({})).await?;
        self.info = BotInfo {
            id: me.id.to_string(),
            name: me.first_name,
            username: me.username,
        };

        Ok(())
    }

    /// Get updates from Telegram using getUpdates API
    pub async fn get_updates(&self, offset: i64, timeout: i64) -> Result<Vec<Update>, BotError> {
        #[derive(Serialize)]
        struct GetUpdatesRequest {
            offset: i64,
            timeout: i64,
            allowed_updates: Vec<String>,
        }

        let request = GetUpdatesRequest {
            offset,
            timeout,
            allowed_updates: vec!["message".to_string()],
        };

        self.call("getUpdates", &request).await
    }

    /// Get the next update offset
    pub fn get_next_offset(updates: &[Update], current: i64) -> i64 {
        updates.iter()
            .map(|u| u.update_id + 1)
            .max()
            .unwrap_or(current)
    }

    /// Send a message with specific parse mode
    pub async fn send_message_with_format(&self, chat_id: i64, text: &str, parse_mode: Option<&str>) -> Result<String, BotError> {
        #[derive(Serialize)]
        struct SendMessageRequest<'a> {
            chat_id: i64,
            text: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            parse_mode: Option<&'a str>,
        }

        #[derive(Deserialize)]
        struct MessageResult {
            message_id: i64,
        }

        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode,
        };

        let result: MessageResult = self.call("sendMessage", &request).await?;
        Ok(result.message_id.to_string())
    }
}

#[async_trait]
impl Bot for TelegramAdapter {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<String, BotError> {
        tracing::debug!("Sending to {}: {}", chat_id, text);
        self.send_message_with_format(chat_id, text, self.parse_mode.as_deref()).await
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
