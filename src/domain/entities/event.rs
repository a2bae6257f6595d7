//! Inbound events from the messaging platform's update stream

/// One unit of the update stream
#[derive(Debug, Clone, Default)]
pub struct InboundEvent {
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Default)]
pub struct IncomingMessage {
    pub from: Option<Sender>,
    pub chat: Option<ChatRef>,
    pub contact: Option<Contact>,
}

#[derive(Debug, Clone)]
pub struct Sender {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct ChatRef {
    pub id: i64,
}

/// Shared-contact payload
#[derive(Debug, Clone)]
pub struct Contact {
    pub phone_number: String,
}

#[cfg(test)]
impl InboundEvent {
    /// Build a plain message event from `username` in chat `chat_id`
    pub fn message(username: impl Into<String>, chat_id: i64) -> Self {
        Self {
            message: Some(IncomingMessage {
                from: Some(Sender {
                    id: chat_id,
                    username: Some(username.into()),
                }),
                chat: Some(ChatRef { id: chat_id }),
                contact: None,
            }),
        }
    }

    pub fn with_contact(mut self, phone_number: impl Into<String>) -> Self {
        if let Some(ref mut msg) = self.message {
            msg.contact = Some(Contact {
                phone_number: phone_number.into(),
            });
        }
        self
    }
}
