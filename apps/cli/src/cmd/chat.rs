//! Interactive chat REPL command.

use crate::{repl::ChatRepl, surface::Surface};
use anyhow::Result;
use clap::Args;
use client::ClientConfig;

/// Start an interactive chat REPL.
#[derive(Args, Debug)]
pub struct Chat {
    /// Host name of the tenant's site.
    #[arg(long)]
    pub host: String,
}

impl Chat {
    /// Enter the interactive REPL for the tenant behind `host`.
    pub async fn run(self, config: ClientConfig) -> Result<()> {
        let surface = Surface::connect(&self.host, config).await?;
        ChatRepl::new(surface)?.run().await
    }
}
