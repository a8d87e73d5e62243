//! HTML rendering of results, history and the page shell.
//!
//! Rendering is a pure function of its input. Templates use HTML
//! auto-escaping, so backend text can be passed through untouched.

mod final_summary;
mod page;
mod views;

use minijinja::{Environment, HtmlEscape, context};
use tracing::debug;

pub use final_summary::{FINAL_SUMMARY_FILENAME, FinalChapterView, FinalSummaryView};
pub use page::{
    DocumentView, HistoryCardView, HistoryView, InputView, ProgressView, SectionView, base_href,
};
pub use views::{
    BannerView, ChapterView, ChaptersView, CoverageView, DownloadLink, ObservabilityView,
    ReliabilityView, SimpleView, download_links,
};

use crate::result::{ResultPayload, ResultStatus, SimpleSummaries, Summaries};

pub type RenderResult<T> = Result<T, minijinja::Error>;

const TEMPLATES: [(&str, &str); 14] = [
    ("banner.html", include_str!("../../templates/banner.html")),
    ("coverage.html", include_str!("../../templates/coverage.html")),
    ("failure.html", include_str!("../../templates/failure.html")),
    ("error.html", include_str!("../../templates/error.html")),
    ("downloads.html", include_str!("../../templates/downloads.html")),
    ("simple.html", include_str!("../../templates/simple.html")),
    ("chapters.html", include_str!("../../templates/chapters.html")),
    ("reliability.html", include_str!("../../templates/reliability.html")),
    ("final_summary.html", include_str!("../../templates/final_summary.html")),
    ("observability.html", include_str!("../../templates/observability.html")),
    ("input.html", include_str!("../../templates/input.html")),
    ("progress.html", include_str!("../../templates/progress.html")),
    ("history.html", include_str!("../../templates/history.html")),
    ("page.html", include_str!("../../templates/page.html")),
];

/// Rendered final summary: HTML for the page, Markdown for copy/export.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFinalSummary {
    pub html: String,
    pub markdown: String,
}

/// Status-dependent part of a rendered result.
///
/// A failed result carries no summary content at all.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultBody {
    Failed {
        html: String,
    },
    Simple {
        html: String,
    },
    Chapters {
        html: String,
        reliability: Option<String>,
        final_summary: Option<RenderedFinalSummary>,
        observability: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedResult {
    pub status: ResultStatus,
    pub verified: bool,
    pub banner: String,
    /// Present when the payload had a coverage report.
    pub coverage: Option<String>,
    pub body: ResultBody,
}

impl RenderedResult {
    pub fn final_summary(&self) -> Option<&RenderedFinalSummary> {
        match &self.body {
            ResultBody::Chapters { final_summary, .. } => final_summary.as_ref(),
            _ => None,
        }
    }
}

/// Template environment with every page fragment registered.
#[derive(Debug)]
pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    /// # Errors
    /// Returns an error if a bundled template fails to compile.
    pub fn new() -> RenderResult<Self> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> RenderResult<String> {
        self.env.get_template(name)?.render(ctx)
    }

    /// Renders a finished job or a stored history entry.
    pub fn render_result(&self, payload: &ResultPayload) -> RenderResult<RenderedResult> {
        let status = payload.status();
        let report = payload.coverage_report.as_ref();
        debug!(%status, layout = ?payload.summaries.as_ref().map(layout_name), "rendering result");

        let banner_view = BannerView::build(status, report);
        let banner = self.render("banner.html", context! { banner => &banner_view })?;
        let coverage = report
            .map(|r| {
                let view = CoverageView::build(r, payload.addendum_metrics.as_ref());
                self.render("coverage.html", context! { coverage => view })
            })
            .transpose()?;

        let downloads = download_links(&payload.exported_files);
        let body = match (status, &payload.summaries) {
            (ResultStatus::Fail, _) => ResultBody::Failed {
                html: self.render(
                    "failure.html",
                    context! { errors => payload.error_messages() },
                )?,
            },
            (ResultStatus::Pass, Some(Summaries::ChapterBased(chapters))) => {
                let html = self.render(
                    "chapters.html",
                    context! {
                        chapters => ChaptersView::build(chapters, report),
                        downloads => &downloads,
                    },
                )?;
                let final_summary = FinalSummaryView::build(chapters)
                    .map(|view| {
                        let html = self.render("final_summary.html", context! { summary => &view })?;
                        Ok::<_, minijinja::Error>(RenderedFinalSummary {
                            html,
                            markdown: view.markdown,
                        })
                    })
                    .transpose()?;
                let reliability = report
                    .map(|_| {
                        let view = ReliabilityView::build(payload.addendum_metrics.as_ref());
                        self.render("reliability.html", context! { reliability => view })
                    })
                    .transpose()?;
                let observability = report
                    .map(|r| {
                        let view = ObservabilityView::build(r);
                        self.render("observability.html", context! { observability => view })
                    })
                    .transpose()?;

                ResultBody::Chapters {
                    html,
                    reliability,
                    final_summary,
                    observability,
                }
            }
            (ResultStatus::Pass, summaries) => {
                let simple = match summaries {
                    Some(Summaries::Simple(simple)) => SimpleView::build(simple),
                    _ => SimpleView::build(&SimpleSummaries::default()),
                };
                ResultBody::Simple {
                    html: self.render(
                        "simple.html",
                        context! { simple => simple, downloads => &downloads },
                    )?,
                }
            }
        };

        Ok(RenderedResult {
            status,
            verified: banner_view.is_verified(),
            banner,
            coverage,
            body,
        })
    }

    /// Inline error panel with a restart action.
    pub fn render_error(&self, message: &str) -> RenderResult<String> {
        self.render("error.html", context! { message => message })
    }

    pub fn render_input(&self, view: &InputView) -> RenderResult<String> {
        self.render("input.html", context! { input => view })
    }

    pub fn render_progress(&self, view: &ProgressView) -> RenderResult<String> {
        self.render("progress.html", context! { progress => view })
    }

    pub fn render_history(&self, view: &HistoryView) -> RenderResult<String> {
        self.render("history.html", context! { history => view })
    }

    /// Full standalone HTML document.
    pub fn render_document(&self, view: &DocumentView<'_>) -> RenderResult<String> {
        self.render(
            "page.html",
            context! {
                title => view.title,
                base_url => view.base_url.as_deref(),
                sections => &view.sections,
            },
        )
    }
}

/// Error panel built without templates, for when rendering itself failed.
pub fn fallback_error_html(message: &str) -> String {
    format!(
        "<div class=\"section error-panel\">\n  <h2>❌ Erro</h2>\n  <p>{}</p>\n</div>",
        HtmlEscape(message)
    )
}

fn layout_name(summaries: &Summaries) -> &'static str {
    match summaries {
        Summaries::Simple(_) => "simple",
        Summaries::ChapterBased(_) => "chapters",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payload(value: serde_json::Value) -> ResultPayload {
        serde_json::from_value(value).unwrap()
    }

    fn chapter_payload(status: &str, overall: f64) -> ResultPayload {
        payload(json!({
            "session_id": "abc",
            "status": status,
            "coverage_report": {
                "overall_coverage_percentage": overall,
                "passed": overall == 100.0,
                "chapters": [
                    {"chapter_number": 1, "chapter_title": "Origem", "chunk_coverage_percentage": 100,
                     "audit_result": {"passed": true, "addendum_count": 2, "regeneration_count": 1}}
                ],
                "summary": {"total_chapters": 1, "chapters_with_100_percent": 1,
                            "chapters_using_addendum": 1, "total_addendums_used": 2,
                            "avg_addendums_per_chapter": 2.0}
            },
            "addendum_metrics": {"chapters_using_addendum": 1, "total_addendums_used": 2},
            "summaries": {
                "estrutura": "capitulos",
                "resumo_executivo": {"medio": "Visão <geral>."},
                "capitulos": [
                    {"numero": 1, "titulo": "Origem", "resumo": "Intro.[[RS:cap1:ab12|chunks:3]] More.",
                     "palavras": 200, "palavras_resumo": 50, "paginas": [1, 2],
                     "pontos_chave": ["Chave"], "citacoes": ["Frase"], "exemplos": ["Caso"]}
                ]
            },
            "exported_files": {"markdown": "output/resumo.md"}
        }))
    }

    #[test]
    fn pass_chapter_result_renders_every_panel() {
        let renderer = Renderer::new().unwrap();
        let rendered = renderer
            .render_result(&chapter_payload("PASS", 100.0))
            .unwrap();

        assert!(rendered.verified);
        assert!(rendered.banner.contains("✅ Coverage: 100% — VERIFIED"));
        let coverage = rendered.coverage.as_deref().unwrap();
        assert!(coverage.contains("100.0%"));
        assert!(coverage.contains("Chapter 1:"));
        assert!(coverage.contains("Addendum: 2"));

        let ResultBody::Chapters {
            html,
            reliability,
            final_summary,
            observability,
        } = &rendered.body
        else {
            panic!("expected chapter body, got {:?}", rendered.body);
        };
        assert!(html.contains("Capítulo 1: Origem"));
        assert!(html.contains("Intro. More."));
        assert!(!html.contains("[[RS:"));
        assert!(html.contains("25,00%"));
        assert!(html.contains("Visão &lt;geral&gt;."));
        assert!(html.contains("<blockquote>\"Frase\"</blockquote>"));
        assert!(html.contains("href=\"#chapter-0\""));
        assert!(html.contains("📝 Addendum: 2"));
        assert!(html.contains("🔄 Regenerações: 1"));
        assert!(html.contains("resumo.md"));
        assert!(html.contains("Download Markdown"));

        let reliability = reliability.as_deref().unwrap();
        assert!(reliability.contains("Addendum usado em 1 capítulo<"));
        assert!(reliability.contains("🔧 Reforço Automático Aplicado"));

        let final_summary = final_summary.as_ref().unwrap();
        assert!(final_summary.markdown.starts_with("# Capítulo 1: Origem\n\n"));
        assert!(final_summary.html.contains("<h3>Pontos-Chave</h3>"));

        assert!(observability.as_deref().unwrap().contains("Cobertura Geral"));
        assert!(rendered.final_summary().is_some());
    }

    #[test]
    fn fail_result_never_renders_summary_content() {
        let renderer = Renderer::new().unwrap();
        let mut failed = chapter_payload("FAIL", 100.0);
        failed.errors = vec![json!("Capítulo 2 sem cobertura")];

        let rendered = renderer.render_result(&failed).unwrap();

        assert!(!rendered.verified);
        assert!(rendered.banner.contains("Coverage: 100.0% | Summary not available"));
        let ResultBody::Failed { html } = &rendered.body else {
            panic!("expected failure body");
        };
        assert!(html.contains("❌ Coverage Validation Failed"));
        assert!(html.contains("<li>Capítulo 2 sem cobertura</li>"));
        assert!(html.contains("Try Again"));
        assert!(!html.contains("Intro."));
        assert_eq!(rendered.final_summary(), None);
    }

    #[test]
    fn derived_fail_without_explicit_status() {
        let renderer = Renderer::new().unwrap();
        let mut partial = chapter_payload("", 99.9);
        partial.status = None;

        let rendered = renderer.render_result(&partial).unwrap();

        assert_eq!(rendered.status, ResultStatus::Fail);
        assert!(matches!(rendered.body, ResultBody::Failed { .. }));
    }

    #[test]
    fn unknown_status_hides_summaries_despite_full_coverage() {
        let renderer = Renderer::new().unwrap();
        let rendered = renderer
            .render_result(&chapter_payload("ERROR", 100.0))
            .unwrap();

        assert_eq!(rendered.status, ResultStatus::Fail);
        let ResultBody::Failed { html } = &rendered.body else {
            panic!("expected failure body, got {:?}", rendered.body);
        };
        assert!(!html.contains("Intro."));
        assert_eq!(rendered.final_summary(), None);
    }

    #[test]
    fn pass_below_full_coverage_uses_fail_banner() {
        let renderer = Renderer::new().unwrap();
        let rendered = renderer
            .render_result(&chapter_payload("PASS", 97.5))
            .unwrap();

        assert_eq!(rendered.status, ResultStatus::Pass);
        assert!(!rendered.verified);
        assert!(rendered.banner.contains("Coverage: 97.5% | Summary not available"));
    }

    #[test]
    fn simple_result_renders_cards() {
        let renderer = Renderer::new().unwrap();
        let simple = payload(json!({
            "status": "PASS",
            "summaries": {"curto": "• Um\n\n• Dois", "medio": "", "longo": "Texto <b>", "bullets": "- x",
                          "validation_report": "ok"}
        }));

        let rendered = renderer.render_result(&simple).unwrap();

        assert_eq!(rendered.coverage, None);
        let ResultBody::Simple { html } = &rendered.body else {
            panic!("expected simple body");
        };
        assert!(html.contains("<li>Um</li>"));
        assert!(html.contains("Não disponível"));
        assert!(html.contains("Texto &lt;b&gt;"));
        assert!(html.contains("<pre>ok</pre>"));
        assert!(!html.contains("download-section"));
    }

    #[test]
    fn error_panel_escapes_message() {
        let renderer = Renderer::new().unwrap();
        let html = renderer
            .render_error("Erro ao carregar resultados: <timeout>")
            .unwrap();

        assert!(html.contains("❌ Erro"));
        assert!(html.contains("&lt;timeout&gt;"));
        assert!(html.contains("Tentar Novamente"));
    }

    #[test]
    fn fallback_error_escapes_message() {
        let html = fallback_error_html("<falha>");
        assert!(html.contains("<p>&lt;falha&gt;</p>"));
    }

    #[test]
    fn history_states_render() {
        let renderer = Renderer::new().unwrap();

        let empty = renderer.render_history(&HistoryView::loaded(&[])).unwrap();
        assert!(empty.contains("Nenhum resumo encontrado."));

        let failed = renderer.render_history(&HistoryView::failed()).unwrap();
        assert!(failed.contains(HistoryView::LOAD_ERROR));

        let items: Vec<crate::api::HistoryItem> = serde_json::from_value(json!([
            {"summary_id": "s1", "title": "Livro", "pipeline_type": "robust"}
        ]))
        .unwrap();
        let loaded = renderer
            .render_history(&HistoryView::loaded(&items))
            .unwrap();
        assert!(loaded.contains("<h3>Livro</h3>"));
        assert!(loaded.contains("data-summary-id=\"s1\""));
        assert!(loaded.contains("👁️ Ver Detalhes"));
    }

    #[test]
    fn document_hides_invisible_sections() {
        let renderer = Renderer::new().unwrap();
        let doc = DocumentView {
            title: "covsum",
            base_url: None,
            sections: vec![
                SectionView {
                    id: "input-section",
                    heading: Some("Novo Resumo"),
                    visible: true,
                    html: "<p>form</p>",
                },
                SectionView {
                    id: "progress-section",
                    heading: None,
                    visible: false,
                    html: "",
                },
            ],
        };

        let html = renderer.render_document(&doc).unwrap();

        assert!(html.contains("<section class=\"section\" id=\"input-section\">"));
        assert!(html.contains("<p>form</p>"));
        assert!(html.contains("id=\"progress-section\" hidden>"));
        assert!(!html.contains("<base"));
    }

    #[test]
    fn progress_shows_pulse_class() {
        let renderer = Renderer::new().unwrap();
        let html = renderer
            .render_progress(&ProgressView::new(
                42.5,
                "Resumindo ⏳ (sistema ativo...)",
                true,
            ))
            .unwrap();

        assert!(html.contains("width: 42.5%"));
        assert!(html.contains("progress-message pulsing"));
        assert!(html.contains("(sistema ativo...)"));
    }
}
