//! Template contexts built from a result payload.
//!
//! Everything here is plain data; escaping happens in the templates, except
//! for `*_html` fields, which come out of [`format_summary`] already escaped.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::format::{
    chapter_metric_text, download_basename, format_summary, percent_1, round_half_up,
    strip_markers,
};
use crate::result::{
    AddendumMetrics, Chapter, ChapterSummaries, CoverageReport, ResultStatus, SimpleSummaries,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BannerView {
    pub class: &'static str,
    pub title: &'static str,
    pub subtitle: String,
}

impl BannerView {
    /// Only a PASS at exactly 100% coverage gets the verified banner.
    pub fn build(status: ResultStatus, report: Option<&CoverageReport>) -> Self {
        let coverage = report.map_or(0.0, CoverageReport::overall);
        if status.is_pass() && coverage == 100.0 {
            Self {
                class: "pass",
                title: "✅ Coverage: 100% — VERIFIED",
                subtitle: "All critical items covered | Summary available".to_string(),
            }
        } else {
            Self {
                class: "fail",
                title: "❌ Coverage Failed — Missing critical items",
                subtitle: format!("Coverage: {}% | Summary not available", percent_1(coverage)),
            }
        }
    }

    pub fn is_verified(&self) -> bool {
        self.class == "pass"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterStatusView {
    pub number: String,
    pub passed: bool,
    pub addendum_count: u64,
    pub regeneration_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageView {
    pub overall: String,
    pub total_chapters: u64,
    pub chapters_using_addendum: u64,
    pub total_addendums: u64,
    pub chapters: Vec<ChapterStatusView>,
}

impl CoverageView {
    pub fn build(report: &CoverageReport, metrics: Option<&AddendumMetrics>) -> Self {
        let metrics = metrics.cloned().unwrap_or_default();
        let total_chapters = if report.summary.total_chapters > 0 {
            report.summary.total_chapters
        } else {
            report.chapters.len() as u64
        };

        Self {
            overall: percent_1(report.overall()),
            total_chapters,
            chapters_using_addendum: metrics.chapters_using_addendum,
            total_addendums: metrics.total_addendums_used,
            chapters: report
                .chapters
                .iter()
                .map(|ch| {
                    let audit = ch.audit();
                    ChapterStatusView {
                        number: ch.chapter_number.to_string(),
                        passed: audit.passed(),
                        addendum_count: audit.addendum_count,
                        regeneration_count: audit.regeneration_count,
                    }
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadLink {
    pub filename: String,
    pub icon: &'static str,
    pub label: &'static str,
}

/// One link per exported file; `markdown` is labelled as such, anything else as PDF.
pub fn download_links(files: &BTreeMap<String, String>) -> Vec<DownloadLink> {
    files
        .iter()
        .map(|(format, path)| {
            let (icon, label) = if format == "markdown" {
                ("📄", "Markdown")
            } else {
                ("📕", "PDF")
            };
            DownloadLink {
                filename: download_basename(path).to_string(),
                icon,
                label,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardView {
    pub id: &'static str,
    pub title: &'static str,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimpleView {
    pub cards: Vec<CardView>,
    pub validation_report: Option<String>,
}

impl SimpleView {
    pub fn build(summaries: &SimpleSummaries) -> Self {
        let card = |id, title, text: &str| CardView {
            id,
            title,
            html: format_summary(text),
        };
        Self {
            cards: vec![
                card("short", "📝 Resumo Curto", &summaries.curto),
                card("medium", "📄 Resumo Médio", &summaries.medio),
                card("long", "📚 Resumo Longo", &summaries.longo),
                card("bullets", "🎯 Pontos Principais", &summaries.bullets),
            ],
            validation_report: summaries.validation_text(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterView {
    pub number: String,
    pub title: String,
    pub metric: String,
    pub pages: String,
    pub passed: bool,
    pub addendum_count: u64,
    pub regeneration_count: u64,
    pub summary_html: String,
    pub key_points: Vec<String>,
    pub quotes: Vec<String>,
    pub examples: Vec<String>,
}

impl ChapterView {
    fn build(chapter: &Chapter, report: Option<&CoverageReport>) -> Self {
        let audit = report.and_then(|r| r.audit_for(&chapter.numero));
        let pages = chapter
            .paginas
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            number: chapter.numero.to_string(),
            title: chapter.titulo.clone(),
            metric: chapter_metric_text(chapter.palavras, chapter.palavras_resumo),
            pages,
            passed: audit.is_none_or(|a| a.passed()),
            addendum_count: audit.map_or(0, |a| a.addendum_count),
            regeneration_count: audit.map_or(0, |a| a.regeneration_count),
            summary_html: format_summary(&chapter.resumo),
            key_points: chapter.pontos_chave.clone(),
            quotes: chapter.citacoes.clone(),
            examples: chapter.exemplos.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChaptersView {
    pub executive: String,
    pub items: Vec<ChapterView>,
}

impl ChaptersView {
    pub fn build(summaries: &ChapterSummaries, report: Option<&CoverageReport>) -> Self {
        Self {
            executive: strip_markers(&summaries.resumo_executivo.medio).into_owned(),
            items: summaries
                .capitulos
                .iter()
                .map(|ch| ChapterView::build(ch, report))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReliabilityView {
    pub addendum_line: Option<String>,
    pub reinforced: bool,
}

impl ReliabilityView {
    pub fn build(metrics: Option<&AddendumMetrics>) -> Self {
        let metrics = metrics.cloned().unwrap_or_default();
        let reinforced = metrics.total_addendums_used > 0;
        let addendum_line = reinforced.then(|| {
            let n = metrics.chapters_using_addendum;
            let plural = if n == 1 { "" } else { "s" };
            format!("Addendum usado em {n} capítulo{plural}")
        });

        Self {
            addendum_line,
            reinforced,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub icon: &'static str,
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterMetricView {
    pub number: String,
    pub title: String,
    pub passed: bool,
    pub regenerations: u64,
    pub addendums: u64,
    pub coverage: String,
    pub missing_markers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservabilityView {
    pub cards: Vec<MetricCard>,
    pub chapters: Vec<ChapterMetricView>,
}

impl ObservabilityView {
    pub fn build(report: &CoverageReport) -> Self {
        let summary = &report.summary;
        let card = |icon, label, value: String| MetricCard { icon, label, value };

        Self {
            cards: vec![
                card("📊", "Cobertura Geral", format!("{}%", percent_1(report.overall()))),
                card("📚", "Capítulos Processados", summary.total_chapters.to_string()),
                card(
                    "✅",
                    "Capítulos com 100%",
                    summary.chapters_with_100_percent.to_string(),
                ),
                card(
                    "🔧",
                    "Capítulos com Addendum",
                    summary.chapters_using_addendum.to_string(),
                ),
                card("📝", "Total de Addendums", summary.total_addendums_used.to_string()),
                card(
                    "📈",
                    "Média Addendums/Capítulo",
                    format!("{:.2}", round_half_up(summary.avg_addendums_per_chapter, 2)),
                ),
            ],
            chapters: report
                .chapters
                .iter()
                .map(|ch| {
                    let audit = ch.audit();
                    ChapterMetricView {
                        number: ch.chapter_number.to_string(),
                        title: ch
                            .chapter_title
                            .clone()
                            .filter(|t| !t.is_empty())
                            .unwrap_or_else(|| "Sem título".to_string()),
                        passed: audit.passed(),
                        regenerations: audit.regeneration_count,
                        addendums: audit.addendum_count,
                        coverage: ch.chunk_coverage_percentage.to_string(),
                        missing_markers: audit.missing_markers.len(),
                    }
                })
                .collect(),
        }
    }
}
