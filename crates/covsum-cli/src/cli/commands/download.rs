//! Download command handler.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use covsum_core::Config;
use covsum_core::api::ApiClient;
use covsum_core::format::format_file_size;

pub async fn run(
    config: &Config,
    base_url: Option<&str>,
    filename: &str,
    out: Option<PathBuf>,
) -> Result<()> {
    let client = ApiClient::from_config(config, base_url)?;
    let bytes = client
        .download(filename)
        .await
        .with_context(|| format!("download '{filename}'"))?;

    let path = out.unwrap_or_else(|| PathBuf::from(filename));
    fs::write(&path, &bytes).with_context(|| format!("write {}", path.display()))?;
    println!(
        "Saved {} ({})",
        path.display(),
        format_file_size(bytes.len() as u64)
    );
    Ok(())
}
