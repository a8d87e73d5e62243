//! Submit command: one job from input to rendered page.

use std::fs;

use anyhow::{Context, Result};
use covsum_core::Config;
use covsum_core::api::ExportFormat;
use covsum_page::state::InputMode;
use covsum_page::{PageEvent, SummaryExport};
use tracing::debug;

use super::open_page;
use crate::cli::SubmitArgs;
use crate::host::TerminalHost;

pub async fn run(config: &Config, base_url: Option<&str>, args: SubmitArgs) -> Result<()> {
    let host = TerminalHost::new().save_to(args.final_summary.clone());
    let mut page = open_page(config, base_url, host)?;

    if let Some(text) = args.text {
        page.dispatch(PageEvent::TabSelected(InputMode::Text));
        page.dispatch(PageEvent::TextChanged(text));
    } else if let Some(path) = args.file {
        let size = fs::metadata(&path)
            .with_context(|| format!("read {}", path.display()))?
            .len();
        page.dispatch(PageEvent::FileSelected { path, size });
    }
    if !args.export.is_empty() {
        for format in [ExportFormat::Md, ExportFormat::Pdf] {
            page.dispatch(PageEvent::ExportToggled {
                format,
                checked: args.export.contains(&format),
            });
        }
    }

    page.run(PageEvent::SubmitRequested).await?;
    if page.state().job.is_none() {
        anyhow::bail!("Job was not submitted");
    }

    if args.final_summary.is_some() {
        page.run(PageEvent::ExportFinalSummary(SummaryExport::Markdown))
            .await?;
    }
    if args.copy {
        page.run(PageEvent::CopyFinalSummary).await?;
    }

    let document = page.render_document()?;
    fs::write(&args.out, document).with_context(|| format!("write {}", args.out.display()))?;
    println!("Saved page to {}", args.out.display());

    match page.state().result.as_ref() {
        Some(result) if result.status.is_pass() => {
            debug!(verified = result.verified, "job passed");
            let suffix = if result.verified { " (verified)" } else { "" };
            println!("Status: PASS{suffix}");
            Ok(())
        }
        Some(_) => anyhow::bail!("Coverage validation failed; see {}", args.out.display()),
        None => anyhow::bail!("Job failed; see {}", args.out.display()),
    }
}
