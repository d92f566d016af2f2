//! A chat surface over the HTTP backend.

use anyhow::{Context, Result};
use client::{
    ChatClient, ChatHistoryStore, ClientConfig, HttpBackend, IdentityManager, SharedIdentity,
    TurnEvent,
};
use std::io::Write;

/// Identity, chat client and history of one tenant.
pub struct Surface {
    /// Shared identity manager.
    pub identity: SharedIdentity<HttpBackend>,
    /// Streaming chat client.
    pub client: ChatClient<HttpBackend, HttpBackend>,
    /// Chat history store.
    pub history: ChatHistoryStore<HttpBackend, HttpBackend>,
}

impl Surface {
    /// Resolve the tenant behind `host` and wire the components.
    pub async fn connect(host: &str, config: ClientConfig) -> Result<Self> {
        let tenant =
            tenant::resolve(host).with_context(|| format!("{host} does not name a tenant"))?;
        tracing::info!("chatting with {tenant} at {}", config.base_url);

        let backend = HttpBackend::from_config(config)?;
        let identity = IdentityManager::new(backend.clone(), tenant).shared();
        let client = ChatClient::new(backend.clone(), identity.clone(), backend.config()).await;
        let history = ChatHistoryStore::new(backend, identity.clone()).await;
        Ok(Self {
            identity,
            client,
            history,
        })
    }
}

/// Print the events of the in-flight turn as they arrive.
///
/// Ctrl+C abandons the turn.
pub async fn stream_turn(client: &mut ChatClient<HttpBackend, HttpBackend>) -> Result<()> {
    let mut out = std::io::stdout();
    loop {
        let event = tokio::select! {
            event = client.next_event() => event,
            _ = tokio::signal::ctrl_c() => {
                client.cancel();
                println!("\n(cancelled)");
                return Ok(());
            }
        };
        match event {
            Some(TurnEvent::Started { .. }) => {}
            Some(TurnEvent::Delta { content }) => {
                print!("{content}");
                out.flush().ok();
            }
            Some(TurnEvent::Committed(_)) => {
                println!();
                return Ok(());
            }
            Some(TurnEvent::Failed { reason, message }) => {
                tracing::debug!("turn failed: {reason}");
                println!("\n{}", message.content);
                return Ok(());
            }
            Some(TurnEvent::Reset) => {
                println!("\n(conversation reset)");
                return Ok(());
            }
            None => return Ok(()),
        }
    }
}
