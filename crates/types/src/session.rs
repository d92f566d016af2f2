//! Server-side conversations.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A persisted conversation, as shown in the history list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Server-assigned chat identifier.
    pub chat_id: CompactString,
    /// Conversation title.
    pub title: String,
    /// Whether the conversation was started by a guest.
    pub is_guest: bool,
    /// Creation time in unix milliseconds.
    pub created_at: i64,
}
