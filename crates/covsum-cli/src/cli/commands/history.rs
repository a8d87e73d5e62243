//! History command handlers.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use covsum_core::Config;
use covsum_core::api::{ApiClient, PipelineType};
use covsum_core::render::HistoryCardView;
use covsum_page::PageEvent;
use covsum_page::update::FEEDBACK_SENT;

use super::open_page;
use crate::host::TerminalHost;

pub async fn list(config: &Config, base_url: Option<&str>, pipeline: Option<PipelineType>) -> Result<()> {
    let client = ApiClient::from_config(config, base_url)?;
    let list = client
        .list_summaries(pipeline)
        .await
        .context("list summaries")?;

    if list.summaries.is_empty() {
        println!("Nenhum resumo encontrado.");
        return Ok(());
    }
    for item in &list.summaries {
        let card = HistoryCardView::from(item);
        println!(
            "{}  {}  [{}]  {}  {}",
            card.id, card.title, card.pipeline, card.date, card.stats
        );
    }
    Ok(())
}

pub async fn show(config: &Config, base_url: Option<&str>, id: &str, out: &Path) -> Result<()> {
    let mut page = open_page(config, base_url, TerminalHost::new())?;
    page.run(PageEvent::SummaryRequested {
        summary_id: id.to_string(),
    })
    .await?;

    let state = page.state();
    let Some(result) = state.result.as_ref() else {
        anyhow::bail!("Summary '{id}' could not be shown");
    };
    println!("Status: {}", result.status.as_str());

    if !state.feedback.is_empty() {
        println!("Feedback:");
        for entry in &state.feedback {
            println!("- [{}] {}", entry.feedback_type, entry.message);
            if let Some(response) = entry.response.as_deref() {
                println!("  ↳ {response}");
            }
        }
    }

    let document = page.render_document()?;
    fs::write(out, document).with_context(|| format!("write {}", out.display()))?;
    println!("Saved page to {}", out.display());
    Ok(())
}

pub async fn feedback(
    config: &Config,
    base_url: Option<&str>,
    id: String,
    feedback_type: Option<String>,
    message: Option<String>,
) -> Result<()> {
    let host = TerminalHost::new().with_answers([feedback_type, message]);
    let mut page = open_page(config, base_url, host)?;
    page.run(PageEvent::FeedbackRequested { summary_id: id })
        .await?;

    match page.host().alerts().last() {
        Some(alert) if alert == FEEDBACK_SENT => Ok(()),
        Some(_) => anyhow::bail!("Feedback was not sent"),
        None => anyhow::bail!("Feedback cancelled"),
    }
}
