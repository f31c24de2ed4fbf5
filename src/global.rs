//! Process-wide client, set up explicitly once at startup.

use std::sync::OnceLock;

use anyhow::{Context, Result};
use log::debug;

use crate::config::ClientConfig;
use crate::http::Client;

static CLIENT: OnceLock<Client> = OnceLock::new();

/// Builds the process-wide client. Fails if it was already initialized.
pub fn init(config: ClientConfig) -> Result<&'static Client> {
    if CLIENT.get().is_some() {
        anyhow::bail!("Process-wide client is already initialized");
    }

    debug!("Initializing process-wide client with {:?}", config);
    let client = Client::new(config)?;
    CLIENT
        .set(client)
        .map_err(|_| anyhow::anyhow!("Process-wide client is already initialized"))?;

    CLIENT
        .get()
        .context("Process-wide client missing after initialization")
}

/// The process-wide client, if [`init`] has run.
pub fn client() -> Option<&'static Client> {
    CLIENT.get()
}
