//! Concierge conversation model
//!
//! Nothing here is persisted: the client resubmits its transcript every turn.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Speaker of a conversation turn
///
/// Anything other than `user` is treated as the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl From<String> for ChatRole {
    fn from(value: String) -> Self {
        if value == "user" {
            ChatRole::User
        } else {
            ChatRole::Assistant
        }
    }
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: ChatRole::User, text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, text: text.into() }
    }
}

/// Body of `POST /ai/chat`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

/// Where a reply came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Model,
    Fallback,
}

/// Outcome of a registration directive found in a model reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    pub event_id: Uuid,
    pub registered: bool,
    pub registration_id: Option<Uuid>,
    pub error: Option<String>,
}

/// Body returned by `POST /ai/chat`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Text to show the user
    pub reply: String,
    /// New assistant turns to append to the transcript
    pub turns: Vec<ChatTurn>,
    pub source: ReplySource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionOutcome>,
}
