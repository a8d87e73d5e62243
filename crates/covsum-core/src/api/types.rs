//! Request and response types of the summarization API.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::result::{
    AddendumMetrics, CoverageReport, ResultPayload, ResultStatus, Summaries, null_default,
};

/// Export format requested from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Md,
    Pdf,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Md => "md",
            Self::Pdf => "pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "md" | "markdown" => Ok(Self::Md),
            "pdf" => Ok(Self::Pdf),
            other => Err(format!("Unknown export format: {other}")),
        }
    }
}

/// The two export checkboxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSelection {
    pub md: bool,
    pub pdf: bool,
}

impl Default for ExportSelection {
    fn default() -> Self {
        Self {
            md: true,
            pdf: false,
        }
    }
}

impl ExportSelection {
    pub const NONE: Self = Self {
        md: false,
        pdf: false,
    };

    pub fn from_formats(formats: &[ExportFormat]) -> Self {
        Self {
            md: formats.contains(&ExportFormat::Md),
            pdf: formats.contains(&ExportFormat::Pdf),
        }
    }

    pub fn set(&mut self, format: ExportFormat, checked: bool) {
        match format {
            ExportFormat::Md => self.md = checked,
            ExportFormat::Pdf => self.pdf = checked,
        }
    }

    pub fn is_empty(self) -> bool {
        !self.md && !self.pdf
    }

    /// Comma-joined wire value, `md` before `pdf`.
    pub fn wire_value(self) -> String {
        let mut formats = Vec::with_capacity(2);
        if self.md {
            formats.push(ExportFormat::Md.as_str());
        }
        if self.pdf {
            formats.push(ExportFormat::Pdf.as_str());
        }
        formats.join(",")
    }
}

/// What gets uploaded for a new job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitSource {
    File(PathBuf),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub source: SubmitSource,
    pub exports: ExportSelection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionCreated {
    pub session_id: String,
}

/// Accepted upload extensions, lowercase and without the dot.
pub const ACCEPTED_EXTENSIONS: [&str; 2] = ["pdf", "txt"];

/// True when the file name ends in `.pdf` or `.txt`, in any case.
pub fn is_accepted_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|ok| ext.eq_ignore_ascii_case(ok))
        })
}

/// Feedback categories accepted by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedbackType {
    Question,
    Error,
    Suggestion,
    Praise,
}

impl FeedbackType {
    pub const ALL: [Self; 4] = [Self::Question, Self::Error, Self::Suggestion, Self::Praise];

    /// Value sent on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Question => "dúvida",
            Self::Error => "erro",
            Self::Suggestion => "sugestão",
            Self::Praise => "elogio",
        }
    }

    /// Menu text used by the feedback prompt.
    pub fn prompt_text() -> String {
        let options: Vec<String> = Self::ALL
            .iter()
            .enumerate()
            .map(|(i, kind)| format!("{}. {}", i + 1, kind.wire_name()))
            .collect();
        format!(
            "Tipo de feedback:\n{}\n\nDigite o número ou o nome:",
            options.join("\n")
        )
    }
}

impl fmt::Display for FeedbackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for FeedbackType {
    type Err = String;

    /// Accepts the menu number, the Portuguese name (with or without
    /// accents) or the English name.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "1" | "dúvida" | "duvida" | "question" => Ok(Self::Question),
            "2" | "erro" | "error" => Ok(Self::Error),
            "3" | "sugestão" | "sugestao" | "suggestion" => Ok(Self::Suggestion),
            "4" | "elogio" | "praise" => Ok(Self::Praise),
            other => Err(format!("Unknown feedback type: {other}")),
        }
    }
}

/// Resolves a prompt answer to the wire value; unknown answers pass through
/// verbatim and the backend decides.
pub fn feedback_wire_value(answer: &str) -> String {
    answer
        .parse::<FeedbackType>()
        .map_or_else(|_| answer.trim().to_string(), |kind| kind.wire_name().to_string())
}

/// Pipeline that produced a stored summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineType {
    Robust,
    Standard,
    Experimental,
}

impl PipelineType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Robust => "robust",
            Self::Standard => "standard",
            Self::Experimental => "experimental",
        }
    }
}

impl FromStr for PipelineType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "robust" => Ok(Self::Robust),
            "standard" => Ok(Self::Standard),
            "experimental" => Ok(Self::Experimental),
            other => Err(format!("Unknown pipeline type: {other}")),
        }
    }
}

/// Metadata row of `GET /api/summaries`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HistoryItem {
    pub summary_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Kept as text so unknown pipelines still list.
    #[serde(default, deserialize_with = "null_default")]
    pub pipeline_type: String,
    #[serde(default, deserialize_with = "null_default")]
    pub total_words_input: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub total_words_output: u64,
    #[serde(default)]
    pub processing_time: Option<f64>,
}

impl HistoryItem {
    pub fn display_title(&self) -> &str {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title,
            _ => "Resumo sem título",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HistoryList {
    #[serde(default, deserialize_with = "null_default")]
    pub summaries: Vec<HistoryItem>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// Full stored summary from `GET /api/summaries/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StoredSummary {
    pub summary_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub pipeline_type: String,
    #[serde(default)]
    pub summaries: Option<Summaries>,
    #[serde(default)]
    pub coverage_report: Option<CoverageReport>,
    #[serde(default)]
    pub addendum_metrics: Option<AddendumMetrics>,
    #[serde(default, deserialize_with = "null_default")]
    pub exported_files: BTreeMap<String, String>,
}

impl StoredSummary {
    /// Rebuilds a renderable result; `None` when nothing was stored to show.
    ///
    /// The status comes from the history rule, which treats entries without
    /// a coverage report as PASS.
    pub fn into_result(self) -> Option<ResultPayload> {
        let summaries = self.summaries?;
        let status = ResultStatus::from_history_coverage(self.coverage_report.as_ref());
        Some(ResultPayload {
            session_id: Some(self.summary_id),
            status: Some(status.as_str().to_string()),
            coverage_report: self.coverage_report,
            addendum_metrics: self.addendum_metrics,
            summaries: Some(summaries),
            errors: Vec::new(),
            exported_files: self.exported_files,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeedbackEntry {
    #[serde(default)]
    pub feedback_id: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub feedback_type: String,
    #[serde(default, deserialize_with = "null_default")]
    pub message: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SummaryDetail {
    /// Kept raw so a malformed entry can still be reported as "not found".
    #[serde(default)]
    pub summary: Option<Value>,
    #[serde(default, deserialize_with = "null_default")]
    pub feedback: Vec<FeedbackEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeedbackReceipt {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub feedback_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn export_selection_wire_order() {
        assert_eq!(ExportSelection::default().wire_value(), "md");
        let both = ExportSelection { md: true, pdf: true };
        assert_eq!(both.wire_value(), "md,pdf");
        assert!(ExportSelection::NONE.is_empty());
        assert_eq!(
            ExportSelection::from_formats(&[ExportFormat::Pdf]).wire_value(),
            "pdf"
        );
    }

    #[test]
    fn accepted_extensions_ignore_case() {
        assert!(is_accepted_file(Path::new("livro.PDF")));
        assert!(is_accepted_file(Path::new("notas.txt")));
        assert!(!is_accepted_file(Path::new("planilha.docx")));
        assert!(!is_accepted_file(Path::new("sem_extensao")));
    }

    #[test]
    fn feedback_answers_map_to_wire_names() {
        assert_eq!(feedback_wire_value("1"), "dúvida");
        assert_eq!(feedback_wire_value(" Sugestao "), "sugestão");
        assert_eq!(feedback_wire_value("praise"), "elogio");
        assert_eq!(feedback_wire_value("outro"), "outro");
        assert!(FeedbackType::prompt_text().contains("3. sugestão"));
    }

    #[test]
    fn stored_summary_uses_history_status() {
        let stored: StoredSummary = serde_json::from_value(json!({
            "summary_id": "abc",
            "pipeline_type": "robust",
            "summaries": {"curto": "x"},
            "coverage_report": null
        }))
        .unwrap();
        let result = stored.into_result().unwrap();
        assert_eq!(result.status(), ResultStatus::Pass);
        assert_eq!(result.session_id.as_deref(), Some("abc"));

        let failing: StoredSummary = serde_json::from_value(json!({
            "summary_id": "def",
            "summaries": {"curto": "x"},
            "coverage_report": {"overall_coverage_percentage": 99.9}
        }))
        .unwrap();
        assert_eq!(failing.into_result().unwrap().status(), ResultStatus::Fail);
    }

    #[test]
    fn stored_summary_without_summaries_is_not_renderable() {
        let stored: StoredSummary =
            serde_json::from_value(json!({"summary_id": "abc", "summaries": null})).unwrap();
        assert!(stored.into_result().is_none());
    }

    #[test]
    fn history_item_title_fallback() {
        let item: HistoryItem = serde_json::from_value(json!({
            "summary_id": "1", "title": "  ", "pipeline_type": null
        }))
        .unwrap();
        assert_eq!(item.display_title(), "Resumo sem título");
        assert_eq!(item.pipeline_type, "");
    }
}
