//! Wire types exchanged with the chat backend.
//!
//! The chat endpoint answers with newline-delimited `data: {json}` records
//! (see [`crate::codec`]); the JSON payload is a [`StreamRecord`]. History
//! endpoints report timestamps in (possibly fractional) unix seconds, which
//! are converted to the client's millisecond convention on the way in.

use crate::{ChatSession, Credential, Message, Profile, Role, utils::seconds_to_millis};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// One decoded record of a chat response stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamRecord {
    /// The server accepted the turn; carries the conversation id.
    Start {
        /// Server-assigned chat id.
        #[serde(default)]
        chat_id: Option<CompactString>,
    },
    /// Incremental reply content.
    Chunk {
        /// Content to append verbatim.
        #[serde(default)]
        content: String,
    },
    /// The reply is complete.
    End,
    /// Any record type this client does not understand.
    #[serde(other)]
    Unknown,
}

/// Body of a chat turn request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The human message.
    pub message: String,
    /// Model selector.
    pub model: CompactString,
    /// Conversation to continue; absent on the first turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<CompactString>,
    /// Title for a new conversation; only sent when `chat_id` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_title: Option<String>,
}

/// Describes the client asking for a guest session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMetadata {
    /// Client application name.
    pub client: CompactString,
    /// Client application version.
    pub version: CompactString,
    /// Per-process device identifier.
    pub device_id: CompactString,
}

/// Body of a guest session issuance request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestSessionRequest {
    /// Tenant slug the guest is scoped to.
    pub tenant_id: CompactString,
    /// Who is asking.
    pub client_metadata: ClientMetadata,
}

/// Response of the guest session endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestSession {
    /// Guest bearer token.
    #[serde(alias = "token", alias = "access_token")]
    pub credential: Credential,
}

/// Response of the login and refresh endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokens {
    /// Access token.
    #[serde(alias = "token")]
    pub access_token: Credential,
    /// Refresh token; refresh responses may omit it.
    #[serde(default)]
    pub refresh_token: Option<Credential>,
    /// Profile of the logged-in visitor; refresh responses may omit it.
    #[serde(default)]
    pub profile: Option<Profile>,
}

/// A conversation as listed by the history endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteChat {
    /// Chat id.
    #[serde(alias = "id")]
    pub chat_id: CompactString,
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Whether a guest started it.
    #[serde(default)]
    pub is_guest: bool,
    /// Creation time in unix seconds.
    #[serde(default)]
    pub created_at: f64,
}

impl From<RemoteChat> for ChatSession {
    fn from(chat: RemoteChat) -> Self {
        Self {
            chat_id: chat.chat_id,
            title: chat.title,
            is_guest: chat.is_guest,
            created_at: seconds_to_millis(chat.created_at),
        }
    }
}

/// A message as returned by the hydrate endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteMessage {
    /// Author.
    pub role: Role,
    /// Text.
    #[serde(default)]
    pub content: String,
    /// Creation time in unix seconds.
    #[serde(default)]
    pub timestamp: f64,
}

impl From<RemoteMessage> for Message {
    fn from(msg: RemoteMessage) -> Self {
        Message::at(msg.role, msg.content, seconds_to_millis(msg.timestamp))
    }
}

/// Body of a rename request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRequest {
    /// New title.
    pub title: String,
}
