//! Contexts for the page chrome: input form, progress bar, history list and
//! the document shell.

use serde::Serialize;

use crate::api::HistoryItem;
use crate::format::{format_timestamp, history_stats_line};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputView {
    /// `file` or `text`
    pub mode: &'static str,
    pub file_label: Option<String>,
    pub text: String,
    pub char_count: String,
    pub export_md: bool,
    pub export_pdf: bool,
    pub submit_label: &'static str,
    pub submit_disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressView {
    pub percentage: String,
    pub message: String,
    pub pulsing: bool,
}

impl ProgressView {
    /// Whole percentages print without a fraction (`10`, not `10.0`).
    pub fn new(percentage: f64, message: impl Into<String>, pulsing: bool) -> Self {
        Self {
            percentage: percentage.to_string(),
            message: message.into(),
            pulsing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryCardView {
    pub id: String,
    pub title: String,
    pub pipeline: String,
    pub date: String,
    pub stats: String,
}

impl From<&HistoryItem> for HistoryCardView {
    fn from(item: &HistoryItem) -> Self {
        Self {
            id: item.summary_id.clone(),
            title: item.display_title().to_string(),
            pipeline: item.pipeline_type.clone(),
            date: item
                .created_at
                .as_deref()
                .map(format_timestamp)
                .unwrap_or_default(),
            stats: history_stats_line(
                item.total_words_input,
                item.total_words_output,
                item.processing_time,
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryView {
    /// `loading`, `failed` or `loaded`
    pub state: &'static str,
    pub error: Option<String>,
    pub items: Vec<HistoryCardView>,
}

impl HistoryView {
    pub const LOAD_ERROR: &str = "Erro ao carregar histórico. Tente novamente.";

    pub fn loading() -> Self {
        Self {
            state: "loading",
            error: None,
            items: Vec::new(),
        }
    }

    pub fn failed() -> Self {
        Self {
            state: "failed",
            error: Some(Self::LOAD_ERROR.to_string()),
            items: Vec::new(),
        }
    }

    pub fn loaded(items: &[HistoryItem]) -> Self {
        Self {
            state: "loaded",
            error: None,
            items: items.iter().map(HistoryCardView::from).collect(),
        }
    }
}

/// One `<section>` of the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView<'a> {
    pub id: &'static str,
    pub heading: Option<&'static str>,
    pub visible: bool,
    pub html: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentView<'a> {
    pub title: &'a str,
    /// Relative download links resolve against this.
    pub base_url: Option<String>,
    pub sections: Vec<SectionView<'a>>,
}

/// `<base href>` must end in `/` for relative links to keep the base path.
pub fn base_href(base_url: &str) -> String {
    if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    }
}
