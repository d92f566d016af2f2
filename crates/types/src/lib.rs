//! Shared vocabulary of the Parley chat front end.
//!
//! Tenants, caller identities, chat sessions and messages, the turn state
//! machine, and the wire records exchanged with the chat backend. Nothing in
//! here performs I/O.

pub use codec::RecordDecoder;
pub use identity::{Credential, Identity, LoginCredentials, Profile};
pub use message::{Message, Role};
pub use protocol::{
    AuthTokens, ChatRequest, ClientMetadata, GuestSession, GuestSessionRequest, RemoteChat,
    RemoteMessage, RenameRequest, StreamRecord,
};
pub use session::ChatSession;
pub use tenant::Tenant;
pub use turn::TurnState;

pub mod codec;
mod identity;
mod message;
pub mod protocol;
mod session;
mod tenant;
mod turn;
pub mod utils;
