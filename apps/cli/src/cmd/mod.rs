//! CLI argument parsing and subcommand dispatch.

use crate::config::resolve_config;
use anyhow::Result;
use clap::{Parser, Subcommand};
use client::ClientConfig;
use compact_str::CompactString;

pub mod chat;
pub mod resolve;
pub mod send;

/// Chat with a Parley tenant.
#[derive(Parser, Debug)]
#[command(name = "parley", about = "Chat with a Parley tenant")]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path to the client configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Model selector override.
    #[arg(long, global = true)]
    pub model: Option<CompactString>,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the tenant a host name resolves to.
    Resolve(resolve::Resolve),
    /// Send a one-shot message and print the reply.
    Send(send::Send),
    /// Start an interactive chat REPL.
    Chat(chat::Chat),
}

impl Cli {
    /// Run the selected subcommand.
    pub async fn run(self) -> Result<()> {
        let Cli {
            command,
            config,
            model,
        } = self;
        let client_config = || -> Result<ClientConfig> {
            let mut client_config = resolve_config(config.as_deref())?;
            if let Some(model) = model {
                client_config.model = model;
            }
            Ok(client_config)
        };
        match command {
            Command::Resolve(resolve) => resolve.run(),
            Command::Send(send) => send.run(client_config()?).await,
            Command::Chat(chat) => chat.run(client_config()?).await,
        }
    }
}
