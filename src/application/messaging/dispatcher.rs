//! Message dispatcher - Routes inbound events and outbound sends

use std::sync::Arc;

use crate::application::errors::DispatchError;
use crate::application::services::UserRegistry;
use crate::domain::entities::InboundEvent;
use crate::domain::traits::Bot;

/// Default acknowledgment sent to newly registered users
pub const DEFAULT_ACK_MESSAGE: &str = "Your chat_id has been saved!";

/// What happened to an inbound event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No message, sender, or chat
    Ignored,
    Registered,
    AlreadyKnown,
}

/// Result of a broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub attempted: usize,
    pub failed: usize,
}

/// Message dispatcher - shares the registry between the update loop and HTTP
pub struct Dispatcher {
    registry: Arc<UserRegistry>,
    bot: Arc<dyn Bot>,
    ack_message: String,
}

impl Dispatcher {
    pub fn new(registry: Arc<UserRegistry>, bot: Arc<dyn Bot>) -> Self {
        Self {
            registry,
            bot,
            ack_message: DEFAULT_ACK_MESSAGE.to_string(),
        }
    }

    pub fn with_ack_message(mut self, ack_message: impl Into<String>) -> Self {
        self.ack_message = ack_message.into();
        self
    }

    pub fn registry(&self) -> &Arc<UserRegistry> {
        &self.registry
    }

    /// Register the sender of an inbound message and acknowledge new users
    pub async fn on_update(&self, event: &InboundEvent) -> UpdateOutcome {
        let Some(message) = &event.message else {
            tracing::debug!("Update without message, skipping");
            return UpdateOutcome::Ignored;
        };

        let (Some(from), Some(chat)) = (&message.from, &message.chat) else {
            tracing::debug!("Message without sender or chat, skipping");
            return UpdateOutcome::Ignored;
        };

        // Senders without a username share the empty key
        let username = from.username.as_deref().unwrap_or_default();
        if username.is_empty() {
            tracing::debug!("Sender {} has no username", from.id);
        }

        let contact = message.contact.as_ref().map(|c| c.phone_number.clone());

        if !self.registry.upsert_if_absent(username, chat.id, contact).await {
            return UpdateOutcome::AlreadyKnown;
        }

        if let Err(e) = self.bot.send_message(chat.id, &self.ack_message).await {
            tracing::warn!("Failed to send acknowledgment to chat_id {}: {}", chat.id, e);
        }

        UpdateOutcome::Registered
    }

    /// Send `text` to one registered user, returning their chat id
    pub async fn send_one(&self, username: &str, text: &str) -> Result<i64, DispatchError> {
        let record = self
            .registry
            .lookup(username)
            .await
            .ok_or_else(|| DispatchError::UserNotFound(username.to_string()))?;

        self.bot.send_message(record.chat_id, text).await?;
        tracing::info!("Message sent to {} (chat_id: {})", username, record.chat_id);

        Ok(record.chat_id)
    }

    /// Send `text` to every registered user; failures are logged, not fatal
    pub async fn send_all(&self, text: &str) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for (username, record) in self.registry.snapshot().await {
            report.attempted += 1;
            if let Err(e) = self.bot.send_message(record.chat_id, text).await {
                report.failed += 1;
                tracing::error!(
                    "Failed to send message to user {} (chat_id: {}): {}",
                    username,
                    record.chat_id,
                    e
                );
            }
        }

        tracing::info!(
            "Broadcast finished: {} attempted, {} failed",
            report.attempted,
            report.failed
        );
        report
    }
}
