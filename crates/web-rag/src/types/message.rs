//! Chat message types shared by prompts and chat models

use serde::{Deserialize, Serialize};

/// Author of a chat message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message sent to the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

/// One raw increment of a streamed model reply
///
/// Carries the provider's framing (role announcements, finish reasons)
/// alongside the text delta; `StrOutputParser` reduces it to plain text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageChunk {
    /// Role, announced on the first increment only
    pub role: Option<Role>,
    /// Text delta, possibly empty
    pub content: String,
    /// Why generation stopped, on the last increment
    pub finish_reason: Option<String>,
}

impl MessageChunk {
    /// A plain text increment
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}
