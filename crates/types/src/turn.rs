//! The turn state machine of a chat surface.
//!
//! ```text
//! Idle ──send──▶ AwaitingFirstByte ──start/chunk──▶ Streaming ──end──▶ Committed ──▶ Idle
//!                      │                               │
//!                      └──────── stream error ─────────┴──▶ Failed ──▶ Idle
//! ```
//!
//! Any state may be reset to `Idle` by a cancellation (identity switch,
//! hydrate, delete of the open conversation).

use serde::{Deserialize, Serialize};

/// State of the current turn. Exactly one is active per chat surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum TurnState {
    /// No turn in progress.
    #[default]
    Idle,
    /// Request sent, nothing received yet ("thinking").
    AwaitingFirstByte,
    /// Receiving chunks; holds the partial reply accumulated so far.
    Streaming(String),
    /// The reply was committed as a message.
    Committed,
    /// The turn failed; holds the reason.
    Failed(String),
}

impl TurnState {
    /// Whether a new turn may start from this state.
    pub fn accepts_send(&self) -> bool {
        matches!(self, Self::Idle | Self::Committed | Self::Failed(_))
    }

    /// Whether a turn is currently consuming a response stream.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::AwaitingFirstByte | Self::Streaming(_))
    }

    /// The partial reply, while streaming.
    pub fn partial(&self) -> Option<&str> {
        match self {
            Self::Streaming(partial) => Some(partial),
            _ => None,
        }
    }

    /// Whether `next` is a legal successor of this state.
    pub fn can_transition(&self, next: &TurnState) -> bool {
        match (self, next) {
            (_, Self::Idle) => true,
            (Self::Idle, Self::AwaitingFirstByte) => true,
            (Self::AwaitingFirstByte | Self::Streaming(_), Self::Streaming(_)) => true,
            (Self::Streaming(_), Self::Committed) => true,
            (Self::AwaitingFirstByte | Self::Streaming(_), Self::Failed(_)) => true,
            _ => false,
        }
    }

    /// Short name of the state, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingFirstByte => "awaiting_first_byte",
            Self::Streaming(_) => "streaming",
            Self::Committed => "committed",
            Self::Failed(_) => "failed",
        }
    }
}
