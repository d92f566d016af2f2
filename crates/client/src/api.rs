//! Collaborator interfaces for the remote chat backend.
//!
//! Traits use RPITIT (no dyn dispatch). Implementations report failures as
//! `anyhow::Error`; the client components classify them.

use bytes::Bytes;
use compact_str::CompactString;
use futures_core::Stream;
use std::{future::Future, pin::Pin};
use types::{AuthTokens, ChatRequest, ChatSession, Credential, LoginCredentials, Message, Tenant};

/// Raw response body of a streamed turn.
pub type ByteStream = Pin<Box<dyn Stream<Item = anyhow::Result<Bytes>> + Send>>;

/// Which chat endpoint a turn is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRoute {
    /// Authenticated callers.
    Member,
    /// Guests.
    Public,
}

/// An opened turn.
pub struct TurnResponse {
    /// Chat id announced through the response header, if any.
    pub chat_id: Option<CompactString>,
    /// Body bytes in arrival order.
    pub body: ByteStream,
}

impl TurnResponse {
    /// Wrap a byte stream with no header chat id.
    pub fn new(body: impl Stream<Item = anyhow::Result<Bytes>> + Send + 'static) -> Self {
        Self {
            chat_id: None,
            body: Box::pin(body),
        }
    }
}

/// Credential issuance.
pub trait IdentityApi: Send + Sync {
    /// Request a new guest credential scoped to `tenant`.
    fn issue_guest(&self, tenant: &Tenant) -> impl Future<Output = anyhow::Result<Credential>> + Send;

    /// Exchange login credentials for authenticated tokens.
    fn login(
        &self,
        tenant: &Tenant,
        credentials: &LoginCredentials,
    ) -> impl Future<Output = anyhow::Result<AuthTokens>> + Send;

    /// Exchange a refresh token for a new bearer token.
    fn refresh(
        &self,
        tenant: &Tenant,
        refresh_token: &Credential,
    ) -> impl Future<Output = anyhow::Result<AuthTokens>> + Send;
}

/// Opens streamed chat turns.
pub trait ChatTransport: Send + Sync {
    /// Send one turn request and return the streamed body.
    fn open_turn(
        &self,
        tenant: &Tenant,
        route: ChatRoute,
        credential: &Credential,
        request: &ChatRequest,
    ) -> impl Future<Output = anyhow::Result<TurnResponse>> + Send;
}

/// Persisted conversations of authenticated callers.
pub trait HistoryApi: Send + Sync {
    /// List the caller's conversations.
    fn list_chats(
        &self,
        tenant: &Tenant,
        credential: &Credential,
    ) -> impl Future<Output = anyhow::Result<Vec<ChatSession>>> + Send;

    /// Fetch the message log of one conversation.
    fn chat_messages(
        &self,
        tenant: &Tenant,
        credential: &Credential,
        chat_id: &str,
    ) -> impl Future<Output = anyhow::Result<Vec<Message>>> + Send;

    /// Set the title of a conversation.
    fn rename_chat(
        &self,
        tenant: &Tenant,
        credential: &Credential,
        chat_id: &str,
        title: &str,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Delete a conversation. Deleting a missing conversation succeeds.
    fn delete_chat(
        &self,
        tenant: &Tenant,
        credential: &Credential,
        chat_id: &str,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}
