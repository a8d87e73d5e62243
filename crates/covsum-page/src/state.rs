//! Page state.
//!
//! One `PageState` per page, owned by the runtime and mutated only by the
//! reducer. Section HTML is re-rendered whenever the state behind it
//! changes, so the state can be turned into a document at any point.

use std::mem;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use covsum_core::Config;
use covsum_core::api::{ExportSelection, FeedbackEntry, HistoryItem, ProgressUpdate};
use covsum_core::format::{char_count_label, file_label};
use covsum_core::render::{
    DocumentView, InputView, ProgressView, RenderResult, RenderedResult, Renderer, SectionView,
    base_href,
};
use enum_map::{Enum, EnumMap};
use tokio_util::sync::CancellationToken;

use crate::common::{JobId, JobSeq, RequestId, RequestSeq};

pub const SUBMIT_LABEL: &str = "✨ Gerar Resumos";
pub const SUBMITTING_LABEL: &str = "⏳ Processando...";
pub const ACTIVITY_INDICATOR: &str = "⏳ (sistema ativo...)";
const PROGRESS_START_MESSAGE: &str = "Iniciando processamento...";
const PAGE_TITLE: &str = "Resumos com Cobertura Verificada";

/// Sections of the page, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum SectionId {
    Input,
    Progress,
    ResultBanner,
    Coverage,
    Failure,
    Error,
    Results,
    ChapterResults,
    Reliability,
    FinalSummary,
    Observability,
    History,
}

impl SectionId {
    pub fn dom_id(self) -> &'static str {
        match self {
            SectionId::Input => "input-section",
            SectionId::Progress => "progress-section",
            SectionId::ResultBanner => "result-banner-section",
            SectionId::Coverage => "coverage-section",
            SectionId::Failure => "failure-section",
            SectionId::Error => "error-section",
            SectionId::Results => "results-section",
            SectionId::ChapterResults => "chapter-results-section",
            SectionId::Reliability => "reliability-section",
            SectionId::FinalSummary => "final-summary-section",
            SectionId::Observability => "observability-section",
            SectionId::History => "history-section",
        }
    }

    pub fn heading(self) -> Option<&'static str> {
        match self {
            SectionId::Input => Some("✨ Novo Resumo"),
            SectionId::Progress => Some("⏳ Progresso"),
            SectionId::Coverage => Some("🛡️ Cobertura"),
            SectionId::Results => Some("📄 Resumos"),
            SectionId::ChapterResults => Some("📚 Resumo por Capítulos"),
            SectionId::Reliability => Some("🔒 Confiabilidade"),
            SectionId::FinalSummary => Some("📝 Resumo Final"),
            SectionId::Observability => Some("📈 Métricas"),
            SectionId::History => Some("🕘 Histórico"),
            SectionId::ResultBanner | SectionId::Failure | SectionId::Error => None,
        }
    }

    /// Sections that only make sense once a result is on screen.
    pub const RESULT: [SectionId; 9] = [
        SectionId::ResultBanner,
        SectionId::Coverage,
        SectionId::Failure,
        SectionId::Error,
        SectionId::Results,
        SectionId::ChapterResults,
        SectionId::Reliability,
        SectionId::FinalSummary,
        SectionId::Observability,
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub visible: bool,
    pub html: String,
}

/// Page behaviour that comes from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSettings {
    /// Used as `<base href>` so download links resolve against the backend.
    pub base_url: Option<String>,
    pub fallback_delay: Duration,
    pub activity_stale: Duration,
    pub default_exports: ExportSelection,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self::from_config(&Config::default(), None)
    }
}

impl PageSettings {
    pub fn from_config(config: &Config, base_url: Option<String>) -> Self {
        Self {
            base_url,
            fallback_delay: config.fallback_delay(),
            activity_stale: config.activity_stale(),
            default_exports: config.default_exports(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    File,
    Text,
}

impl InputMode {
    pub fn as_str(self) -> &'static str {
        match self {
            InputMode::File => "file",
            InputMode::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub size: u64,
}

impl SelectedFile {
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned())
    }

    pub fn label(&self) -> String {
        file_label(&self.name(), self.size)
    }
}

/// Input form: active tab, chosen source, export checkboxes, submit control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputState {
    pub mode: InputMode,
    pub file: Option<SelectedFile>,
    pub text: String,
    pub exports: ExportSelection,
    /// Submit control disabled and relabeled while a job is being created.
    pub submitting: bool,
}

impl InputState {
    pub fn new(exports: ExportSelection) -> Self {
        Self {
            mode: InputMode::default(),
            file: None,
            text: String::new(),
            exports,
            submitting: false,
        }
    }

    pub fn submit_label(&self) -> &'static str {
        if self.submitting {
            SUBMITTING_LABEL
        } else {
            SUBMIT_LABEL
        }
    }

    pub fn view(&self) -> InputView {
        InputView {
            mode: self.mode.as_str(),
            file_label: self.file.as_ref().map(SelectedFile::label),
            text: self.text.clone(),
            char_count: char_count_label(&self.text),
            export_md: self.exports.md,
            export_pdf: self.exports.pdf,
            submit_label: self.submit_label(),
            submit_disabled: self.submitting,
        }
    }
}

/// Keepalive-driven activity indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activity {
    #[default]
    Idle,
    /// Keepalives arriving, last real update still recent.
    StillAlive,
    /// No real update for the stale window; shows the pulsing indicator.
    Pulsing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressState {
    pub percentage: f64,
    pub message: String,
    pub last_update: Option<Instant>,
    pub keepalives: u32,
    pub activity: Activity,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            percentage: 0.0,
            message: PROGRESS_START_MESSAGE.to_string(),
            last_update: None,
            keepalives: 0,
            activity: Activity::Idle,
        }
    }
}

impl ProgressState {
    /// Fresh progress for a stream opened at `at`.
    pub fn started(at: Instant) -> Self {
        Self {
            last_update: Some(at),
            ..Self::default()
        }
    }

    /// Missing fields keep their previous value.
    pub fn apply_update(&mut self, update: &ProgressUpdate, at: Instant) {
        if let Some(percentage) = update.percentage {
            self.percentage = percentage;
        }
        if let Some(message) = &update.message {
            self.message.clone_from(message);
        }
        self.last_update = Some(at);
        self.keepalives = 0;
        self.activity = Activity::Idle;
    }

    /// Never touches percentage or message.
    pub fn apply_keepalive(&mut self, at: Instant, stale_after: Duration) {
        self.keepalives = self.keepalives.saturating_add(1);
        let quiet = self
            .last_update
            .map_or(Duration::ZERO, |last| at.saturating_duration_since(last));
        self.activity = if quiet >= stale_after {
            Activity::Pulsing
        } else {
            Activity::StillAlive
        };
    }

    pub fn display_message(&self) -> String {
        let base = if self.message.trim().is_empty() {
            "Processando..."
        } else {
            self.message.as_str()
        };
        if self.activity == Activity::Pulsing && !base.contains('⏳') {
            format!("{base} {ACTIVITY_INDICATOR}")
        } else {
            base.to_string()
        }
    }

    pub fn view(&self) -> ProgressView {
        ProgressView::new(
            self.percentage,
            self.display_message(),
            self.activity == Activity::Pulsing,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    /// Progress subscription open.
    Streaming,
    /// Stream failed; the one-shot result fetch is scheduled.
    AwaitingFallback,
    FetchingResult,
    Finished,
}

#[derive(Debug, Clone)]
pub struct JobState {
    pub id: JobId,
    pub session_id: Option<String>,
    pub phase: JobPhase,
    /// Cancels the open progress subscription.
    pub stream: Option<CancellationToken>,
}

impl JobState {
    pub fn is(&self, id: JobId, phase: JobPhase) -> bool {
        self.id == id && self.phase == phase
    }
}

#[derive(Debug, Clone, Default)]
pub struct HistoryState {
    pub items: Vec<HistoryItem>,
    /// Latest list fetch; older responses are dropped.
    pub pending: Option<RequestId>,
}

#[derive(Debug)]
pub struct PageState {
    pub settings: PageSettings,
    renderer: Arc<Renderer>,
    pub sections: EnumMap<SectionId, Section>,
    pub input: InputState,
    pub progress: ProgressState,
    pub job: Option<JobState>,
    /// Job waiting for its creation response.
    pub submission: Option<JobId>,
    /// Only this request may render a result.
    pub pending_render: Option<RequestId>,
    pub result: Option<RenderedResult>,
    pub history: HistoryState,
    /// Feedback attached to the last stored summary that was opened.
    pub feedback: Vec<FeedbackEntry>,
    pub feedback_pending: bool,
    pub jobs: JobSeq,
    pub requests: RequestSeq,
}

impl PageState {
    pub fn new(settings: PageSettings, renderer: Arc<Renderer>) -> Self {
        let input = InputState::new(settings.default_exports);
        let mut state = Self {
            settings,
            renderer,
            sections: EnumMap::default(),
            input,
            progress: ProgressState::default(),
            job: None,
            submission: None,
            pending_render: None,
            result: None,
            history: HistoryState::default(),
            feedback: Vec::new(),
            feedback_pending: false,
            jobs: JobSeq::default(),
            requests: RequestSeq::default(),
        };
        state.sections[SectionId::Input].visible = true;
        state
    }

    /// Returns every section to its initial state and clears file, text,
    /// session and result. History and the id sequences survive, so
    /// responses to requests issued before the reset stay stale.
    ///
    /// Returns the token of the open progress subscription, if any.
    pub fn reset(&mut self) -> Option<CancellationToken> {
        let stream = self.job.take().and_then(|job| job.stream);
        let history = mem::take(&mut self.sections[SectionId::History]);

        self.sections = EnumMap::default();
        self.sections[SectionId::Input].visible = true;
        self.sections[SectionId::History] = history;
        self.input = InputState::new(self.settings.default_exports);
        self.progress = ProgressState::default();
        self.submission = None;
        self.pending_render = None;
        self.result = None;
        self.feedback.clear();

        stream
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn section(&self, id: SectionId) -> &Section {
        &self.sections[id]
    }

    pub fn is_visible(&self, id: SectionId) -> bool {
        self.sections[id].visible
    }

    pub fn show(&mut self, id: SectionId, html: String) {
        self.sections[id] = Section { visible: true, html };
    }

    pub fn hide(&mut self, id: SectionId) {
        self.sections[id].visible = false;
    }

    pub fn is_submitting(&self) -> bool {
        self.submission.is_some()
    }

    pub fn stream_open(&self) -> bool {
        self.job.as_ref().is_some_and(|job| job.stream.is_some())
    }

    /// Markdown of the rendered final summary, if any.
    pub fn final_summary(&self) -> Option<&str> {
        self.result
            .as_ref()
            .and_then(RenderedResult::final_summary)
            .map(|summary| summary.markdown.as_str())
    }

    /// True while anything issued by the page has yet to answer.
    pub fn is_busy(&self) -> bool {
        let job_running = self
            .job
            .as_ref()
            .is_some_and(|job| job.phase != JobPhase::Finished);
        job_running
            || self.submission.is_some()
            || self.pending_render.is_some()
            || self.history.pending.is_some()
            || self.feedback_pending
    }

    /// The whole page as a standalone HTML document.
    pub fn render_document(&self) -> RenderResult<String> {
        let sections = self
            .sections
            .iter()
            .map(|(id, section)| SectionView {
                id: id.dom_id(),
                heading: id.heading(),
                visible: section.visible,
                html: &section.html,
            })
            .collect();
        self.renderer.render_document(&DocumentView {
            title: PAGE_TITLE,
            base_url: self.settings.base_url.as_deref().map(base_href),
            sections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(percentage: Option<f64>, message: Option<&str>) -> ProgressUpdate {
        ProgressUpdate {
            percentage,
            message: message.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn keepalive_escalates_only_after_quiet_window() {
        let start = Instant::now();
        let stale = Duration::from_secs(10);
        let mut progress = ProgressState::started(start);
        progress.apply_update(&update(Some(40.0), Some("Resumindo")), start);

        progress.apply_keepalive(start + Duration::from_secs(3), stale);
        assert_eq!(progress.activity, Activity::StillAlive);
        assert_eq!(progress.display_message(), "Resumindo");

        progress.apply_keepalive(start + Duration::from_secs(10), stale);
        assert_eq!(progress.activity, Activity::Pulsing);
        assert_eq!(progress.display_message(), "Resumindo ⏳ (sistema ativo...)");
        assert_eq!(progress.percentage, 40.0);
        assert_eq!(progress.keepalives, 2);
    }

    #[test]
    fn real_update_clears_indicator() {
        let start = Instant::now();
        let mut progress = ProgressState::started(start);
        progress.apply_keepalive(start + Duration::from_secs(30), Duration::from_secs(10));
        assert_eq!(progress.activity, Activity::Pulsing);

        progress.apply_update(
            &update(Some(80.0), None),
            start + Duration::from_secs(31),
        );

        assert_eq!(progress.activity, Activity::Idle);
        assert_eq!(progress.keepalives, 0);
        assert_eq!(progress.message, "Iniciando processamento...");
        assert_eq!(progress.percentage, 80.0);
    }

    #[test]
    fn indicator_is_not_appended_twice() {
        let start = Instant::now();
        let mut progress = ProgressState::started(start);
        progress.message = "Aguarde ⏳".to_string();
        progress.apply_keepalive(start + Duration::from_secs(11), Duration::from_secs(10));
        assert_eq!(progress.display_message(), "Aguarde ⏳");
    }

    #[test]
    fn reset_keeps_history_and_sequences() {
        let renderer = Arc::new(Renderer::new().unwrap());
        let mut state = PageState::new(PageSettings::default(), renderer);
        state.show(SectionId::History, "<p>lista</p>".to_string());
        state.show(SectionId::Failure, "<p>falha</p>".to_string());
        state.hide(SectionId::Input);
        let before = state.requests.next_id();
        let token = CancellationToken::new();
        state.job = Some(JobState {
            id: state.jobs.next_id(),
            session_id: Some("s".to_string()),
            phase: JobPhase::Streaming,
            stream: Some(token.clone()),
        });
        state.input.text = "texto".to_string();

        let returned = state.reset().unwrap();

        assert!(returned == token);
        assert!(state.is_visible(SectionId::Input));
        assert!(!state.is_visible(SectionId::Failure));
        assert!(state.is_visible(SectionId::History));
        assert!(state.input.text.is_empty());
        assert!(state.job.is_none());
        assert_ne!(state.requests.next_id(), before);
        assert!(!state.is_busy());
    }

    #[test]
    fn document_lists_sections_in_order() {
        let renderer = Arc::new(Renderer::new().unwrap());
        let state = PageState::new(PageSettings::default(), renderer);

        let html = state.render_document().unwrap();

        let input = html.find("id=\"input-section\"").unwrap();
        let history = html.find("id=\"history-section\"").unwrap();
        assert!(input < history);
        assert!(html.contains("id=\"progress-section\" hidden"));
    }
}
