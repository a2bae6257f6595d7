use serde::{Deserialize, Serialize};
use std::fmt;

/// A registered recipient, keyed by username in the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub chat_id: i64,
    /// Phone number shared through a contact payload, if any
    #[serde(rename = "phone", default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

impl UserRecord {
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            contact: None,
        }
    }

    /// Attach a contact, treating an empty string as no contact
    pub fn with_contact(mut self, contact: Option<impl Into<String>>) -> Self {
        self.contact = contact
            .map(|c| c.into())
            .filter(|c| !c.trim().is_empty());
        self
    }
}

impl fmt::Display for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.contact {
            Some(ref phone) => write!(f, "chat_id: {}, phone: {}", self.chat_id, phone),
            None => write!(f, "chat_id: {}", self.chat_id),
        }
    }
}
