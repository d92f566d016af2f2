//! Streaming chat client.
//!
//! One turn at a time: `send` opens the turn, `next_event` pulls decoded
//! records and drives the [`TurnState`] machine until the reply is committed
//! or the turn fails. Every turn is stamped with an epoch; cancelling,
//! switching identity or hydrating another conversation advances the epoch
//! so records of an abandoned turn are never applied.

use crate::{
    ClientConfig, Result,
    api::{ByteStream, ChatRoute, ChatTransport, IdentityApi, TurnResponse},
    identity::SharedIdentity,
};
use compact_str::CompactString;
use futures_util::StreamExt;
use std::{collections::VecDeque, time::Duration};
use tokio::{sync::watch, time::Instant};
use types::{ChatRequest, Message, RecordDecoder, StreamRecord, Tenant, TurnState};

/// Title used when the first message is too short to name a conversation.
pub const DEFAULT_TITLE: &str = "New Chat";

/// AI message appended when a turn fails.
pub const FAILURE_MESSAGE: &str =
    "Sorry, something went wrong while answering. Please try again.";

/// Result of [`ChatClient::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The turn was opened; pull events with [`ChatClient::next_event`].
    Started,
    /// A turn is already in flight; nothing was sent.
    Busy,
    /// The message was blank; nothing was sent.
    Empty,
}

/// Observable progress of a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    /// The server accepted the turn.
    Started {
        /// Conversation id, once known.
        chat_id: Option<CompactString>,
    },
    /// Reply content to append.
    Delta {
        /// The appended fragment.
        content: String,
    },
    /// The reply was committed to the log.
    Committed(Message),
    /// The turn failed; an apology was appended to the log.
    Failed {
        /// What went wrong.
        reason: String,
        /// The appended apology.
        message: Message,
    },
    /// The conversation was reset because the caller identity changed.
    Reset,
}

impl TurnEvent {
    /// Whether no further events follow for this turn.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Started { .. } | Self::Delta { .. })
    }
}

/// Name a new conversation after its first message.
///
/// Takes the first three words and capitalises the first letter. Falls back
/// to [`DEFAULT_TITLE`] when fewer than three characters remain.
pub fn derive_title(message: &str) -> String {
    let title = message.split_whitespace().take(3).collect::<Vec<_>>().join(" ");
    if title.chars().count() < 3 {
        return DEFAULT_TITLE.to_owned();
    }
    let mut chars = title.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => DEFAULT_TITLE.to_owned(),
    }
}

/// The response stream of the in-flight turn.
struct PendingTurn {
    epoch: u64,
    header_chat_id: Option<CompactString>,
    body: ByteStream,
    decoder: RecordDecoder,
    queue: VecDeque<StreamRecord>,
    closed: bool,
    deadline: Instant,
    limit: Duration,
}

impl PendingTurn {
    fn new(epoch: u64, response: TurnResponse, limit: Duration) -> Self {
        Self {
            epoch,
            deadline: Instant::now() + limit,
            limit,
            header_chat_id: response.chat_id,
            body: response.body,
            decoder: RecordDecoder::new(),
            queue: VecDeque::new(),
            closed: false,
        }
    }

    /// The next decoded record, `None` once the body is exhausted.
    ///
    /// Each read waits at most `timeout`, and no read outlives the turn
    /// deadline, so records the decoder skips cannot keep a turn open.
    async fn next_record(&mut self, timeout: Duration) -> std::result::Result<Option<StreamRecord>, String> {
        loop {
            if let Some(record) = self.queue.pop_front() {
                return Ok(Some(record));
            }
            if self.closed {
                return Ok(None);
            }
            if Instant::now() >= self.deadline {
                return Err(self.overdue());
            }
            let until = (Instant::now() + timeout).min(self.deadline);
            match tokio::time::timeout_at(until, self.body.next()).await {
                Ok(Some(Ok(bytes))) => {
                    tracing::trace!("read {} bytes", bytes.len());
                    self.queue.extend(self.decoder.push(&bytes));
                }
                Ok(Some(Err(err))) => return Err(format!("{err:#}")),
                Ok(None) => {
                    self.closed = true;
                    self.queue.extend(self.decoder.finish());
                    if self.decoder.skipped() > 0 {
                        tracing::debug!("skipped {} malformed lines", self.decoder.skipped());
                    }
                }
                Err(_) if until == self.deadline => return Err(self.overdue()),
                Err(_) => {
                    return Err(format!("no response within {}s", timeout.as_secs_f32()));
                }
            }
        }
    }

    fn overdue(&self) -> String {
        format!("reply not complete within {}s", self.limit.as_secs_f32())
    }
}

/// A chat surface bound to one tenant.
pub struct ChatClient<T, A> {
    transport: T,
    identity: SharedIdentity<A>,
    identity_rx: watch::Receiver<u64>,
    tenant: Tenant,
    model: CompactString,
    stream_timeout: Duration,
    turn_timeout: Duration,
    state: TurnState,
    chat_id: Option<CompactString>,
    messages: Vec<Message>,
    epoch: u64,
    pending: Option<PendingTurn>,
    notice: Option<String>,
}

impl<T: ChatTransport, A: IdentityApi> ChatClient<T, A> {
    /// Create a client for the tenant of `identity`.
    pub async fn new(transport: T, identity: SharedIdentity<A>, config: &ClientConfig) -> Self {
        let (identity_rx, tenant) = {
            let manager = identity.lock().await;
            (manager.subscribe(), manager.tenant().clone())
        };
        Self {
            transport,
            identity,
            identity_rx,
            tenant,
            model: config.model.clone(),
            stream_timeout: config.stream_timeout(),
            turn_timeout: config.turn_timeout(),
            state: TurnState::Idle,
            chat_id: None,
            messages: Vec::new(),
            epoch: 0,
            pending: None,
            notice: None,
        }
    }

    /// Override the stream read timeout.
    pub fn with_stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }

    /// Override the bound on a whole turn.
    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = timeout;
        self
    }

    /// The shared identity manager.
    pub fn identity(&self) -> &SharedIdentity<A> {
        &self.identity
    }

    /// The tenant this surface serves.
    pub fn tenant(&self) -> &Tenant {
        &self.tenant
    }

    /// The current turn state.
    pub fn state(&self) -> &TurnState {
        &self.state
    }

    /// The open conversation, once the server assigned one.
    pub fn chat_id(&self) -> Option<&str> {
        self.chat_id.as_deref()
    }

    /// The message log of the open conversation.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The user-visible notice left by the last recoverable failure.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Send a human message and open a turn.
    ///
    /// Does nothing while a turn is in flight. Identity failures keep the
    /// client idle and leave a notice; transport failures surface as a
    /// [`TurnEvent::Failed`] from the next pull.
    pub async fn send(&mut self, text: &str) -> Result<SendOutcome> {
        self.sync_identity();
        if !self.state.accepts_send() {
            tracing::debug!("turn in flight, ignoring send");
            return Ok(SendOutcome::Busy);
        }
        let text = text.trim();
        if text.is_empty() {
            return Ok(SendOutcome::Empty);
        }

        let resolved = {
            let mut identity = self.identity.lock().await;
            identity.ensure_guest(&self.tenant).await.map(|credential| {
                let route = if identity.is_authenticated() {
                    ChatRoute::Member
                } else {
                    ChatRoute::Public
                };
                (credential, route)
            })
        };
        let (credential, route) = match resolved {
            Ok(resolved) => resolved,
            Err(err) => {
                tracing::warn!("cannot send without an identity: {err}");
                self.notice = Some(err.to_string());
                return Err(err);
            }
        };
        self.sync_identity();
        self.notice = None;

        self.transition(TurnState::Idle);
        self.transition(TurnState::AwaitingFirstByte);
        self.messages.push(Message::human(text));
        self.epoch += 1;

        let request = ChatRequest {
            message: text.to_owned(),
            model: self.model.clone(),
            chat_id: self.chat_id.clone(),
            chat_title: self.chat_id.is_none().then(|| derive_title(text)),
        };
        tracing::debug!(
            "opening turn {} on {route:?} for {}",
            self.epoch,
            self.tenant
        );
        let response = match self
            .transport
            .open_turn(&self.tenant, route, &credential, &request)
            .await
        {
            Ok(response) => response,
            Err(err) => TurnResponse::new(futures_util::stream::once(async move { Err(err) })),
        };
        self.pending = Some(PendingTurn::new(self.epoch, response, self.turn_timeout));
        Ok(SendOutcome::Started)
    }

    /// Pull the next event of the in-flight turn.
    ///
    /// Returns `None` when no turn is in flight; a committed or failed turn
    /// settles back to [`TurnState::Idle`] at that point.
    pub async fn next_event(&mut self) -> Option<TurnEvent> {
        if self.sync_identity() {
            return Some(TurnEvent::Reset);
        }
        loop {
            let Some(pending) = self.pending.as_mut() else {
                if !self.state.is_in_flight() {
                    self.transition(TurnState::Idle);
                }
                return None;
            };
            let epoch = pending.epoch;
            let next = pending.next_record(self.stream_timeout).await;
            if self.sync_identity() {
                return Some(TurnEvent::Reset);
            }
            match next {
                Ok(Some(record)) => {
                    if let Some(event) = self.apply(epoch, record) {
                        return Some(event);
                    }
                }
                Ok(None) => {
                    return Some(self.fail("stream ended before the reply was complete".into()));
                }
                Err(reason) => return Some(self.fail(reason)),
            }
        }
    }

    /// Pull events until the turn ends, passing each to `on_event`.
    ///
    /// Returns the terminal event, or `None` if no turn was in flight.
    pub async fn complete(&mut self, mut on_event: impl FnMut(&TurnEvent)) -> Option<TurnEvent> {
        while let Some(event) = self.next_event().await {
            on_event(&event);
            if event.is_terminal() {
                return Some(event);
            }
        }
        None
    }

    /// Abandon the in-flight turn, keeping the conversation.
    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            tracing::debug!("cancelled turn {}", self.epoch);
        }
        self.epoch += 1;
        self.transition(TurnState::Idle);
    }

    /// Abandon the in-flight turn and start an empty conversation.
    pub fn new_conversation(&mut self) {
        self.cancel();
        self.chat_id = None;
        self.messages.clear();
    }

    /// Replace the conversation with a hydrated one.
    pub(crate) fn load(&mut self, chat_id: &str, messages: Vec<Message>) {
        self.cancel();
        self.chat_id = Some(chat_id.into());
        self.messages = messages;
    }

    /// Reset the conversation if the identity generation moved.
    fn sync_identity(&mut self) -> bool {
        if !self.identity_rx.has_changed().unwrap_or(false) {
            return false;
        }
        let generation = *self.identity_rx.borrow_and_update();
        tracing::info!("identity generation {generation}, resetting conversation");
        self.new_conversation();
        true
    }

    fn apply(&mut self, epoch: u64, record: StreamRecord) -> Option<TurnEvent> {
        if epoch != self.epoch {
            tracing::debug!("discarding record of stale turn {epoch}");
            return None;
        }
        match record {
            StreamRecord::Start { chat_id } => {
                let header = self.pending.as_ref().and_then(|p| p.header_chat_id.clone());
                if let Some(chat_id) = chat_id.or(header) {
                    self.adopt_chat_id(chat_id);
                }
                if matches!(self.state, TurnState::AwaitingFirstByte) {
                    self.transition(TurnState::Streaming(String::new()));
                }
                Some(TurnEvent::Started {
                    chat_id: self.chat_id.clone(),
                })
            }
            StreamRecord::Chunk { content } => {
                if let TurnState::Streaming(partial) = &mut self.state {
                    partial.push_str(&content);
                } else {
                    self.transition(TurnState::Streaming(content.clone()));
                }
                Some(TurnEvent::Delta { content })
            }
            StreamRecord::End => {
                if self.chat_id.is_none() {
                    let header = self.pending.as_ref().and_then(|p| p.header_chat_id.clone());
                    if let Some(chat_id) = header {
                        self.adopt_chat_id(chat_id);
                    }
                }
                if matches!(self.state, TurnState::AwaitingFirstByte) {
                    self.transition(TurnState::Streaming(String::new()));
                }
                let reply = self.state.partial().unwrap_or_default().to_owned();
                self.transition(TurnState::Committed);
                self.pending = None;
                let message = Message::ai(reply);
                self.messages.push(message.clone());
                tracing::debug!("committed turn {epoch}");
                Some(TurnEvent::Committed(message))
            }
            StreamRecord::Unknown => None,
        }
    }

    fn adopt_chat_id(&mut self, chat_id: CompactString) {
        match &self.chat_id {
            None => {
                tracing::debug!("conversation {chat_id} assigned");
                self.chat_id = Some(chat_id);
            }
            Some(current) if *current != chat_id => {
                tracing::warn!("server announced chat {chat_id}, keeping {current}");
            }
            Some(_) => {}
        }
    }

    fn fail(&mut self, reason: String) -> TurnEvent {
        tracing::warn!("turn {} failed: {reason}", self.epoch);
        self.pending = None;
        self.transition(TurnState::Failed(reason.clone()));
        let message = Message::ai(FAILURE_MESSAGE);
        self.messages.push(message.clone());
        TurnEvent::Failed { reason, message }
    }

    fn transition(&mut self, next: TurnState) {
        if self.state == next {
            return;
        }
        if !self.state.can_transition(&next) {
            tracing::warn!(
                "ignoring turn transition {} -> {}",
                self.state.name(),
                next.name()
            );
            return;
        }
        tracing::debug!("turn {} -> {}", self.state.name(), next.name());
        self.state = next;
    }
}
