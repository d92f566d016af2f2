//! Parley chat client.
//!
//! Three cooperating components share one tenant context:
//!
//! - [`IdentityManager`] owns the single active caller identity (guest or
//!   authenticated) and announces identity switches.
//! - [`ChatClient`] runs one streamed turn at a time through an explicit
//!   [`TurnState`](types::TurnState) machine.
//! - [`ChatHistoryStore`] manages persisted conversations of authenticated
//!   visitors.
//!
//! Remote collaborators are reached through the traits in [`api`];
//! [`HttpBackend`] implements all of them over HTTP.

pub use api::{ByteStream, ChatRoute, ChatTransport, HistoryApi, IdentityApi, TurnResponse};
pub use chat::{ChatClient, DEFAULT_TITLE, FAILURE_MESSAGE, SendOutcome, TurnEvent, derive_title};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use history::ChatHistoryStore;
pub use http::HttpBackend;
pub use identity::{IdentityManager, SharedIdentity};

pub mod api;
mod chat;
pub mod config;
mod error;
mod history;
mod http;
mod identity;
