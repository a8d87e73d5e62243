//! Result payloads returned by the backend.
//!
//! The backend is loose about types: chapter numbers and page references
//! arrive as JSON numbers or strings, optional collections arrive as `null`,
//! and the summaries object comes in two shapes distinguished by the
//! `estrutura` field. Everything here decodes into one strict model so the
//! renderer never has to guess.

mod status;

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
pub use status::ResultStatus;

/// `estrutura` value that marks the chapter-based summaries shape.
pub const CHAPTER_LAYOUT: &str = "capitulos";

/// Treats an explicit JSON `null` like a missing field.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A chapter number or page reference, normalized to text.
///
/// `1`, `1.0` and `"1"` all decode to the same label, which is what the
/// coverage report cross-reference relies on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
            Float(f64),
        }

        let label = match Option::<Raw>::deserialize(deserializer)? {
            None => String::new(),
            Some(Raw::Text(text)) => text.trim().to_string(),
            Some(Raw::Int(n)) => n.to_string(),
            Some(Raw::Float(f)) if f.is_finite() && f.fract() == 0.0 => {
                format!("{}", f as i64)
            }
            Some(Raw::Float(f)) => f.to_string(),
        };
        Ok(Self(label))
    }
}

/// Full result of a finished job, as served by `GET /api/result/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResultPayload {
    #[serde(default)]
    pub session_id: Option<String>,
    /// Explicit verdict; wins over the coverage report when it is PASS/FAIL.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub coverage_report: Option<CoverageReport>,
    #[serde(default)]
    pub addendum_metrics: Option<AddendumMetrics>,
    #[serde(default)]
    pub summaries: Option<Summaries>,
    #[serde(default, deserialize_with = "null_default")]
    pub errors: Vec<Value>,
    /// Export format (`markdown`, `pdf`) to server-side file path.
    #[serde(default, deserialize_with = "null_default")]
    pub exported_files: BTreeMap<String, String>,
}

impl ResultPayload {
    pub fn status(&self) -> ResultStatus {
        ResultStatus::derive(self.status.as_deref(), self.coverage_report.as_ref())
    }

    /// Reported errors as display text.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|err| match err {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect()
    }

    pub fn chapter_summaries(&self) -> Option<&ChapterSummaries> {
        match &self.summaries {
            Some(Summaries::ChapterBased(chapters)) => Some(chapters),
            _ => None,
        }
    }
}

/// The two summary layouts. Exactly one is active per result.
#[derive(Debug, Clone, PartialEq)]
pub enum Summaries {
    Simple(SimpleSummaries),
    ChapterBased(ChapterSummaries),
}

impl<'de> Deserialize<'de> for Summaries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let layout = value.get("estrutura").and_then(Value::as_str);
        if layout == Some(CHAPTER_LAYOUT) {
            ChapterSummaries::deserialize(value)
                .map(Summaries::ChapterBased)
                .map_err(de::Error::custom)
        } else {
            SimpleSummaries::deserialize(value)
                .map(Summaries::Simple)
                .map_err(de::Error::custom)
        }
    }
}

/// Four fixed-length variants of one summary.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimpleSummaries {
    #[serde(default, deserialize_with = "null_default")]
    pub curto: String,
    #[serde(default, deserialize_with = "null_default")]
    pub medio: String,
    #[serde(default, deserialize_with = "null_default")]
    pub longo: String,
    #[serde(default, deserialize_with = "null_default")]
    pub bullets: String,
    #[serde(default)]
    pub validation_report: Option<Value>,
}

impl SimpleSummaries {
    /// Validation report as preformatted text, if the backend sent one.
    pub fn validation_text(&self) -> Option<String> {
        match self.validation_report.as_ref()? {
            Value::Null => None,
            Value::String(text) if text.trim().is_empty() => None,
            Value::String(text) => Some(text.clone()),
            other => serde_json::to_string_pretty(other).ok(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChapterSummaries {
    #[serde(default, deserialize_with = "null_default")]
    pub resumo_executivo: ExecutiveSummary,
    /// Display order is the order received.
    #[serde(default, deserialize_with = "null_default")]
    pub capitulos: Vec<Chapter>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExecutiveSummary {
    #[serde(default, deserialize_with = "null_default")]
    pub curto: String,
    #[serde(default, deserialize_with = "null_default")]
    pub medio: String,
    #[serde(default, deserialize_with = "null_default")]
    pub longo: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Chapter {
    #[serde(default)]
    pub numero: Label,
    #[serde(default, deserialize_with = "null_default")]
    pub titulo: String,
    #[serde(default, deserialize_with = "null_default")]
    pub resumo: String,
    /// Word count of the original chapter.
    #[serde(default, deserialize_with = "null_default")]
    pub palavras: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub palavras_resumo: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub paginas: Vec<Label>,
    #[serde(default, deserialize_with = "null_default")]
    pub pontos_chave: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub citacoes: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub exemplos: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CoverageReport {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub overall_coverage_percentage: Option<f64>,
    #[serde(default)]
    pub passed: Option<bool>,
    #[serde(default, deserialize_with = "null_default")]
    pub chapters: Vec<ChapterCoverage>,
    #[serde(default, deserialize_with = "null_default")]
    pub summary: CoverageSummary,
}

impl CoverageReport {
    /// Overall coverage, zero when absent.
    pub fn overall(&self) -> f64 {
        self.overall_coverage_percentage.unwrap_or(0.0)
    }

    /// Audit outcome for a chapter; a later entry for the same number wins.
    pub fn audit_for(&self, chapter: &Label) -> Option<&AuditResult> {
        self.chapters
            .iter()
            .rev()
            .find(|ch| &ch.chapter_number == chapter)
            .and_then(|ch| ch.audit_result.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChapterCoverage {
    #[serde(default)]
    pub chapter_number: Label,
    #[serde(default)]
    pub chapter_title: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub total_chunks: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub processed_chunks: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub chunk_coverage_percentage: f64,
    #[serde(default)]
    pub audit_result: Option<AuditResult>,
}

static EMPTY_AUDIT: AuditResult = AuditResult {
    passed: None,
    regeneration_count: 0,
    addendum_count: 0,
    missing_markers: Vec::new(),
};

impl ChapterCoverage {
    pub fn audit(&self) -> &AuditResult {
        self.audit_result.as_ref().unwrap_or(&EMPTY_AUDIT)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AuditResult {
    #[serde(default)]
    pub passed: Option<bool>,
    #[serde(default, deserialize_with = "null_default")]
    pub regeneration_count: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub addendum_count: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub missing_markers: Vec<Value>,
}

impl AuditResult {
    /// A missing flag counts as passed.
    pub fn passed(&self) -> bool {
        self.passed.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CoverageSummary {
    #[serde(deserialize_with = "null_default")]
    pub total_chapters: u64,
    #[serde(deserialize_with = "null_default")]
    pub chapters_with_100_percent: u64,
    #[serde(deserialize_with = "null_default")]
    pub chapters_failed: u64,
    #[serde(deserialize_with = "null_default")]
    pub chapters_using_addendum: u64,
    #[serde(deserialize_with = "null_default")]
    pub total_addendums_used: u64,
    #[serde(deserialize_with = "null_default")]
    pub avg_addendums_per_chapter: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AddendumMetrics {
    #[serde(deserialize_with = "null_default")]
    pub chapters_using_addendum: u64,
    #[serde(deserialize_with = "null_default")]
    pub total_addendums_used: u64,
    #[serde(deserialize_with = "null_default")]
    pub avg_addendums_per_chapter: f64,
}
