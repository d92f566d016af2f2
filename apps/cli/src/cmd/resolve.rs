//! Host resolution command.

use anyhow::{Result, bail};
use clap::Args;

/// Show the tenant a host name resolves to.
#[derive(Args, Debug)]
pub struct Resolve {
    /// Host name, optionally with a port.
    pub host: String,
}

impl Resolve {
    /// Print the resolved tenant.
    pub fn run(self) -> Result<()> {
        let Some(tenant) = tenant::resolve(&self.host) else {
            bail!("{} does not name a tenant", self.host);
        };
        println!("tenant: {}", tenant.slug);
        if let Some(environment) = &tenant.environment {
            println!("environment: {environment}");
        }
        Ok(())
    }
}
