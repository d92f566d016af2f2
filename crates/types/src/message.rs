//! Committed chat messages

use crate::utils::now_millis;
use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The visitor.
    #[serde(alias = "user")]
    Human,
    /// The language model.
    #[serde(alias = "assistant")]
    Ai,
}

/// A committed message of a conversation.
///
/// Append-only: once pushed to a message log it is never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the message.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// Creation time in unix milliseconds.
    pub timestamp: i64,
}

impl Message {
    /// Create a human message stamped with the current time.
    pub fn human(content: impl Into<String>) -> Self {
        Self::at(Role::Human, content, now_millis())
    }

    /// Create an AI message stamped with the current time.
    pub fn ai(content: impl Into<String>) -> Self {
        Self::at(Role::Ai, content, now_millis())
    }

    /// Create a message with an explicit timestamp (unix milliseconds).
    pub fn at(role: Role, content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }
}
