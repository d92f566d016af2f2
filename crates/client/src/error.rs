//! Client error taxonomy.
//!
//! Every variant is recoverable: the chat surface stays usable and the
//! caller may retry on the next user action.

use compact_str::CompactString;
use thiserror::Error;

/// Client result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the client components.
#[derive(Debug, Error)]
pub enum Error {
    /// Guest issuance, login or refresh was rejected or unreachable.
    #[error("identity unavailable: {0:#}")]
    Identity(anyhow::Error),

    /// The operation needs an authenticated identity.
    #[error("not authenticated")]
    NotAuthenticated,

    /// A request/response round-trip failed.
    #[error("transport error: {0:#}")]
    Transport(anyhow::Error),

    /// A history mutation was rejected and rolled back.
    #[error("history update failed: {0:#}")]
    History(anyhow::Error),

    /// The chat id is not in the local history list.
    #[error("unknown chat: {0}")]
    UnknownChat(CompactString),

    /// Configuration could not be loaded or applied.
    #[error("config error: {0:#}")]
    Config(anyhow::Error),
}

impl Error {
    /// Whether the surface can keep going after this error.
    pub fn is_recoverable(&self) -> bool {
        true
    }

    /// Whether retrying the same operation later may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::NotAuthenticated | Self::UnknownChat(_) | Self::Config(_)
        )
    }
}
