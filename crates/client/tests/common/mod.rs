//! Scripted in-memory chat backend shared by the client tests.

#![allow(dead_code)]

use anyhow::{Result, bail};
use bytes::Bytes;
use compact_str::CompactString;
use futures_util::{StreamExt, stream};
use parley_client::{
    ChatClient, ChatHistoryStore, ChatRoute, ChatTransport, ClientConfig, HistoryApi, IdentityApi,
    IdentityManager, SharedIdentity, TurnResponse,
};
use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use types::{
    AuthTokens, ChatRequest, ChatSession, Credential, LoginCredentials, Message, Profile, Tenant,
};

/// One scripted turn response.
pub enum Script {
    /// Respond with these body pieces, optionally hanging afterwards.
    Stream {
        header: Option<String>,
        pieces: Vec<std::result::Result<Vec<u8>, String>>,
        hang: bool,
    },
    /// Refuse to open the turn.
    Refuse(String),
    /// Repeat `piece` every `every` after an initial `start` record, forever.
    Trickle { piece: Vec<u8>, every: Duration },
}

impl Script {
    /// A body made of `records`, delivered in one piece.
    pub fn records(records: &[&str]) -> Self {
        Self::Stream {
            header: None,
            pieces: vec![Ok(body(records))],
            hang: false,
        }
    }

    /// A body made of `records`, delivered in pieces of `size` bytes.
    pub fn chunked(records: &[&str], size: usize) -> Self {
        Self::Stream {
            header: None,
            pieces: body(records).chunks(size).map(|c| Ok(c.to_vec())).collect(),
            hang: false,
        }
    }
}

/// Encode JSON payloads as `data:` lines.
pub fn body(records: &[&str]) -> Vec<u8> {
    records
        .iter()
        .map(|record| format!("data: {record}\n"))
        .collect::<String>()
        .into_bytes()
}

pub const START: &str = r#"{"type":"start","chat_id":"c1"}"#;
pub const END: &str = r#"{"type":"end"}"#;

pub fn chunk(content: &str) -> String {
    serde_json::json!({ "type": "chunk", "content": content }).to_string()
}

#[derive(Default)]
pub struct State {
    pub guests_issued: usize,
    pub logins: usize,
    pub refreshes: usize,
    pub fail_guest: bool,
    pub fail_login: bool,
    pub turns: Vec<(ChatRoute, String, ChatRequest)>,
    pub scripts: VecDeque<Script>,
    pub chats: Vec<ChatSession>,
    pub messages: HashMap<String, Vec<Message>>,
    pub list_calls: usize,
    pub fail_rename: bool,
    pub fail_delete: bool,
    pub renamed: Vec<(String, String)>,
    pub deleted: Vec<String>,
}

/// In-memory backend implementing every collaborator trait.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<State>>,
}

impl MockBackend {
    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn script(&self, script: Script) {
        self.state().scripts.push_back(script);
    }

    pub fn turns(&self) -> usize {
        self.state().turns.len()
    }

    pub fn last_request(&self) -> ChatRequest {
        self.state().turns.last().unwrap().2.clone()
    }
}

impl IdentityApi for MockBackend {
    async fn issue_guest(&self, tenant: &Tenant) -> Result<Credential> {
        let mut state = self.state();
        if state.fail_guest {
            bail!("guest issuance unavailable");
        }
        state.guests_issued += 1;
        Ok(Credential::new(format!(
            "guest-{}-{}",
            tenant.slug, state.guests_issued
        )))
    }

    async fn login(&self, _tenant: &Tenant, credentials: &LoginCredentials) -> Result<AuthTokens> {
        let mut state = self.state();
        if state.fail_login || credentials.password != "secret" {
            bail!("invalid credentials");
        }
        state.logins += 1;
        Ok(AuthTokens {
            access_token: Credential::new(format!("user-{}", state.logins)),
            refresh_token: Some(Credential::new("refresh-1")),
            profile: Some(Profile {
                id: "u1".into(),
                email: credentials.email.clone(),
                name: None,
            }),
        })
    }

    async fn refresh(&self, _tenant: &Tenant, refresh_token: &Credential) -> Result<AuthTokens> {
        let mut state = self.state();
        if refresh_token.expose() != "refresh-1" {
            bail!("unknown refresh token");
        }
        state.refreshes += 1;
        Ok(AuthTokens {
            access_token: Credential::new(format!("rotated-{}", state.refreshes)),
            refresh_token: None,
            profile: None,
        })
    }
}

impl ChatTransport for MockBackend {
    async fn open_turn(
        &self,
        _tenant: &Tenant,
        route: ChatRoute,
        credential: &Credential,
        request: &ChatRequest,
    ) -> Result<TurnResponse> {
        let mut state = self.state();
        state
            .turns
            .push((route, credential.expose().to_owned(), request.clone()));
        let script = state
            .scripts
            .pop_front()
            .unwrap_or_else(|| Script::records(&[START, END]));
        match script {
            Script::Refuse(reason) => bail!(reason),
            Script::Trickle { piece, every } => {
                let start =
                    stream::once(async { Ok::<_, anyhow::Error>(Bytes::from(body(&[START]))) });
                let ticks = stream::unfold(piece, move |piece| async move {
                    tokio::time::sleep(every).await;
                    Some((Ok(Bytes::from(piece.clone())), piece))
                });
                Ok(TurnResponse::new(start.chain(ticks)))
            }
            Script::Stream {
                header,
                pieces,
                hang,
            } => {
                let pieces = stream::iter(
                    pieces
                        .into_iter()
                        .map(|piece| piece.map(Bytes::from).map_err(anyhow::Error::msg)),
                );
                let body = if hang {
                    pieces.chain(stream::pending()).boxed()
                } else {
                    pieces.boxed()
                };
                Ok(TurnResponse {
                    chat_id: header.map(CompactString::from),
                    body,
                })
            }
        }
    }
}

impl HistoryApi for MockBackend {
    async fn list_chats(&self, _tenant: &Tenant, credential: &Credential) -> Result<Vec<ChatSession>> {
        let mut state = self.state();
        if credential.expose().starts_with("guest") {
            bail!("guests have no history");
        }
        state.list_calls += 1;
        Ok(state.chats.clone())
    }

    async fn chat_messages(
        &self,
        _tenant: &Tenant,
        _credential: &Credential,
        chat_id: &str,
    ) -> Result<Vec<Message>> {
        match self.state().messages.get(chat_id) {
            Some(messages) => Ok(messages.clone()),
            None => bail!("chat {chat_id} not found"),
        }
    }

    async fn rename_chat(
        &self,
        _tenant: &Tenant,
        _credential: &Credential,
        chat_id: &str,
        title: &str,
    ) -> Result<()> {
        let mut state = self.state();
        if state.fail_rename {
            bail!("rename rejected");
        }
        state.renamed.push((chat_id.to_owned(), title.to_owned()));
        Ok(())
    }

    async fn delete_chat(&self, _tenant: &Tenant, _credential: &Credential, chat_id: &str) -> Result<()> {
        let mut state = self.state();
        if state.fail_delete {
            bail!("delete rejected");
        }
        state.deleted.push(chat_id.to_owned());
        Ok(())
    }
}

pub fn tenant() -> Tenant {
    Tenant::new("acme")
}

pub fn session(chat_id: &str, title: &str, created_at: i64) -> ChatSession {
    ChatSession {
        chat_id: chat_id.into(),
        title: title.to_owned(),
        is_guest: false,
        created_at,
    }
}

pub fn login() -> LoginCredentials {
    LoginCredentials::new("ada@example.com", "secret")
}

/// A chat surface over `backend`.
pub async fn surface(
    backend: &MockBackend,
) -> (SharedIdentity<MockBackend>, ChatClient<MockBackend, MockBackend>) {
    let identity = IdentityManager::new(backend.clone(), tenant()).shared();
    let client = ChatClient::new(backend.clone(), identity.clone(), &ClientConfig::default()).await;
    (identity, client)
}

/// A chat surface with a history store over `backend`.
pub async fn surface_with_history(
    backend: &MockBackend,
) -> (
    SharedIdentity<MockBackend>,
    ChatClient<MockBackend, MockBackend>,
    ChatHistoryStore<MockBackend, MockBackend>,
) {
    let (identity, client) = surface(backend).await;
    let store = ChatHistoryStore::new(backend.clone(), identity.clone()).await;
    (identity, client, store)
}
