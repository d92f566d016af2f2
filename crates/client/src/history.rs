//! Persisted conversations of authenticated callers.
//!
//! Rename and delete update the local list before the remote call and undo
//! the change when the call fails.

use crate::{
    ChatClient, Error, Result,
    api::{ChatTransport, HistoryApi, IdentityApi},
    identity::SharedIdentity,
};
use compact_str::CompactString;
use tokio::sync::watch;
use types::{ChatSession, Credential, Tenant};

/// Undo record of an optimistic mutation.
enum Compensation {
    Retitle { chat_id: CompactString, title: String },
    Reinsert { index: usize, session: ChatSession },
    Nothing,
}

/// Chat history of the authenticated caller.
pub struct ChatHistoryStore<H, A> {
    api: H,
    identity: SharedIdentity<A>,
    identity_rx: watch::Receiver<u64>,
    tenant: Tenant,
    sessions: Vec<ChatSession>,
}

impl<H: HistoryApi, A: IdentityApi> ChatHistoryStore<H, A> {
    /// Create a store for the tenant of `identity`.
    pub async fn new(api: H, identity: SharedIdentity<A>) -> Self {
        let (identity_rx, tenant) = {
            let manager = identity.lock().await;
            (manager.subscribe(), manager.tenant().clone())
        };
        Self {
            api,
            identity,
            identity_rx,
            tenant,
            sessions: Vec::new(),
        }
    }

    /// The locally known conversations, newest first.
    ///
    /// Empty once the caller identity changed since the last fetch.
    pub fn sessions(&mut self) -> &[ChatSession] {
        self.drop_stale();
        &self.sessions
    }

    /// Fetch the caller's conversations, newest first.
    ///
    /// Guests have no history: the list is empty and nothing is requested.
    pub async fn list(&mut self) -> Result<&[ChatSession]> {
        let credential = match self.credential().await {
            Ok(credential) => credential,
            Err(Error::NotAuthenticated) => {
                self.sessions.clear();
                return Ok(&self.sessions);
            }
            Err(err) => return Err(err),
        };
        let mut sessions = self
            .api
            .list_chats(&self.tenant, &credential)
            .await
            .map_err(Error::Transport)?;
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tracing::debug!("listed {} chats for {}", sessions.len(), self.tenant);
        self.sessions = sessions;
        Ok(&self.sessions)
    }

    /// Open a persisted conversation in `client`.
    ///
    /// Any in-flight turn of the client is cancelled first. On failure the
    /// client keeps its conversation.
    pub async fn hydrate<T: ChatTransport>(
        &mut self,
        chat_id: &str,
        client: &mut ChatClient<T, A>,
    ) -> Result<()> {
        let credential = self.credential().await?;
        client.cancel();
        let messages = self
            .api
            .chat_messages(&self.tenant, &credential, chat_id)
            .await
            .map_err(Error::Transport)?;
        tracing::info!("hydrated chat {chat_id} with {} messages", messages.len());
        client.load(chat_id, messages);
        Ok(())
    }

    /// Rename a listed conversation.
    pub async fn rename(&mut self, chat_id: &str, title: &str) -> Result<()> {
        let credential = self.credential().await?;
        let session = self
            .sessions
            .iter_mut()
            .find(|session| session.chat_id == chat_id)
            .ok_or_else(|| Error::UnknownChat(chat_id.into()))?;
        let undo = Compensation::Retitle {
            chat_id: session.chat_id.clone(),
            title: std::mem::replace(&mut session.title, title.to_owned()),
        };

        match self
            .api
            .rename_chat(&self.tenant, &credential, chat_id, title)
            .await
        {
            Ok(()) => {
                tracing::info!("renamed chat {chat_id}");
                Ok(())
            }
            Err(err) => {
                tracing::warn!("rename of chat {chat_id} failed, rolling back: {err:#}");
                self.compensate(undo);
                Err(Error::History(err))
            }
        }
    }

    /// Delete a conversation.
    ///
    /// Deleting the conversation open in `client` resets it to an empty
    /// conversation once the deletion succeeds.
    pub async fn delete<T: ChatTransport>(
        &mut self,
        chat_id: &str,
        client: &mut ChatClient<T, A>,
    ) -> Result<()> {
        let credential = self.credential().await?;
        let undo = match self
            .sessions
            .iter()
            .position(|session| session.chat_id == chat_id)
        {
            Some(index) => Compensation::Reinsert {
                index,
                session: self.sessions.remove(index),
            },
            None => Compensation::Nothing,
        };

        match self
            .api
            .delete_chat(&self.tenant, &credential, chat_id)
            .await
        {
            Ok(()) => {
                tracing::info!("deleted chat {chat_id}");
                if client.chat_id() == Some(chat_id) {
                    client.new_conversation();
                }
                Ok(())
            }
            Err(err) => {
                tracing::warn!("delete of chat {chat_id} failed, rolling back: {err:#}");
                self.compensate(undo);
                Err(Error::History(err))
            }
        }
    }

    async fn credential(&mut self) -> Result<Credential> {
        self.drop_stale();
        self.identity.lock().await.member_credential()
    }

    /// Forget the list fetched under a previous identity.
    fn drop_stale(&mut self) {
        if self.identity_rx.has_changed().unwrap_or(false) {
            let generation = *self.identity_rx.borrow_and_update();
            tracing::debug!("identity generation {generation}, dropping chat list");
            self.sessions.clear();
        }
    }

    fn compensate(&mut self, undo: Compensation) {
        match undo {
            Compensation::Retitle { chat_id, title } => {
                if let Some(session) = self.sessions.iter_mut().find(|s| s.chat_id == chat_id) {
                    session.title = title;
                }
            }
            Compensation::Reinsert { index, session } => {
                let index = index.min(self.sessions.len());
                self.sessions.insert(index, session);
            }
            Compensation::Nothing => {}
        }
    }
}
