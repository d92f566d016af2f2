//! One-shot message command.

use crate::surface::{Surface, stream_turn};
use anyhow::{Result, bail};
use clap::Args;
use client::{ClientConfig, SendOutcome};

/// Send a one-shot message and print the reply.
#[derive(Args, Debug)]
pub struct Send {
    /// Host name of the tenant's site.
    #[arg(long)]
    pub host: String,
    /// Message content.
    pub content: String,
}

impl Send {
    /// Send a message as a guest and stream the reply.
    pub async fn run(self, config: ClientConfig) -> Result<()> {
        let mut surface = Surface::connect(&self.host, config).await?;
        match surface.client.send(&self.content).await? {
            SendOutcome::Started => stream_turn(&mut surface.client).await,
            SendOutcome::Empty => bail!("message is empty"),
            SendOutcome::Busy => bail!("a turn is already in flight"),
        }
    }
}
