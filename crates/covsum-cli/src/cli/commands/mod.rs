//! CLI command handlers.

pub mod config;
pub mod download;
pub mod history;
pub mod submit;

use anyhow::Result;
use covsum_core::Config;
use covsum_core::api::ApiClient;
use covsum_page::{PageRuntime, PageSettings};

use crate::host::TerminalHost;

/// Page runtime talking to the configured backend.
fn open_page(
    config: &Config,
    base_url: Option<&str>,
    host: TerminalHost,
) -> Result<PageRuntime<TerminalHost>> {
    let client = ApiClient::from_config(config, base_url)?;
    let settings = PageSettings::from_config(config, Some(client.base_url().to_string()));
    PageRuntime::new(client, settings, host)
}
