//! Page reducer.
//!
//! `update` is the single place where page state changes. It takes the
//! current state and one event, mutates the state and returns the effects
//! the runtime must execute. It performs no I/O; time comes in on the events.
//!
//! Sequencing rules:
//! - Job events carry the `JobId` of the submission that caused them. An id
//!   other than the current job's, or a phase that no longer expects the
//!   event, means the event is stale and is dropped.
//! - Fetches that would replace the rendered result carry a `RequestId`.
//!   Only `pending_render` may render; history lists have their own slot.

use std::time::Instant;

use covsum_core::api::{
    ApiError, HistoryList, ProgressEvent, ProgressUpdate, SessionCreated, StoredSummary,
    SubmitRequest, SubmitSource, SummaryDetail, feedback_wire_value, is_accepted_file,
};
use covsum_core::render::{FINAL_SUMMARY_FILENAME, HistoryView, ResultBody, fallback_error_html};
use covsum_core::result::ResultPayload;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::common::{JobId, RequestId};
use crate::effects::PageEffect;
use crate::events::{PageEvent, SummaryExport};
use crate::state::{InputMode, JobPhase, JobState, PageState, ProgressState, SectionId, SelectedFile};

const INVALID_FILE: &str = "Por favor, selecione um arquivo PDF ou TXT.";
const MISSING_FILE: &str = "Por favor, selecione um arquivo.";
const MISSING_TEXT: &str = "Por favor, insira algum texto.";
const MISSING_EXPORT: &str = "Por favor, selecione pelo menos um formato de exportação.";
const SUBMIT_FAILED: &str = "Erro ao processar solicitação";
const NOTHING_TO_COPY: &str = "Nenhum resumo disponível para copiar.";
const NOTHING_TO_EXPORT: &str = "Nenhum resumo disponível para exportar.";
const COPIED: &str = "Resumo copiado para a área de transferência!";
const COPY_FAILED: &str = "Erro ao copiar resumo. Tente novamente.";
const PDF_PENDING: &str =
    "Exportação PDF será implementada em breve. Por enquanto, use a exportação Markdown.";
const SUMMARY_INVALID: &str = "Resumo não encontrado ou formato inválido";
pub const FEEDBACK_SENT: &str = "Feedback registrado com sucesso!";

/// Renders the input form and progress bar into their sections.
///
/// Called once when the page is created; afterwards the reducer keeps them
/// current.
pub fn render_initial(state: &mut PageState) {
    refresh_input(state);
    refresh_progress(state);
}

pub fn update(state: &mut PageState, event: PageEvent) -> Vec<PageEffect> {
    match event {
        PageEvent::TabSelected(mode) => {
            select_tab(state, mode);
            vec![]
        }
        PageEvent::FileSelected { path, size } => {
            if !is_accepted_file(&path) {
                return vec![PageEffect::Alert(INVALID_FILE.to_string())];
            }
            state.input.file = Some(SelectedFile { path, size });
            refresh_input(state);
            vec![]
        }
        PageEvent::FileCleared => {
            state.input.file = None;
            refresh_input(state);
            vec![]
        }
        PageEvent::TextChanged(text) => {
            state.input.text = text;
            refresh_input(state);
            vec![]
        }
        PageEvent::ExportToggled { format, checked } => {
            state.input.exports.set(format, checked);
            refresh_input(state);
            vec![]
        }
        PageEvent::SubmitRequested => submit(state),
        PageEvent::SubmitFinished { job, result, at } => submit_finished(state, job, result, at),
        PageEvent::Progress { job, event, at } => progress(state, job, event, at),
        PageEvent::StreamClosed { job, error } => stream_closed(state, job, error.as_deref()),
        PageEvent::FallbackElapsed { job } => fallback_elapsed(state, job),
        PageEvent::ResultLoaded { request, result } => result_loaded(state, request, result),
        PageEvent::CopyFinalSummary => match state.final_summary() {
            Some(markdown) => vec![PageEffect::CopyToClipboard {
                text: markdown.to_string(),
            }],
            None => vec![PageEffect::Alert(NOTHING_TO_COPY.to_string())],
        },
        PageEvent::CopyFinished(result) => match result {
            Ok(()) => vec![PageEffect::Alert(COPIED.to_string())],
            Err(err) => {
                warn!(error = %err, "clipboard copy failed");
                vec![PageEffect::Alert(COPY_FAILED.to_string())]
            }
        },
        PageEvent::ExportFinalSummary(format) => export_final_summary(state, format),
        PageEvent::FileSaved { filename, result } => match result {
            Ok(path) => {
                info!(%filename, path = %path.display(), "file saved");
                vec![]
            }
            Err(err) => vec![PageEffect::Alert(format!("Erro ao salvar {filename}: {err}"))],
        },
        PageEvent::ScrollToChapter(index) => vec![PageEffect::ScrollTo {
            target: format!("chapter-{index}"),
        }],
        PageEvent::RestartRequested => restart(state),
        PageEvent::HistoryRequested { pipeline } => {
            let request = state.requests.next_id();
            state.history.pending = Some(request);
            show_history(state, &HistoryView::loading());
            vec![PageEffect::FetchHistory { request, pipeline }]
        }
        PageEvent::HistoryLoaded { request, result } => history_loaded(state, request, result),
        PageEvent::SummaryRequested { summary_id } => {
            let request = state.requests.next_id();
            state.pending_render = Some(request);
            vec![PageEffect::FetchSummary {
                request,
                summary_id,
            }]
        }
        PageEvent::SummaryLoaded { request, result } => summary_loaded(state, request, result),
        PageEvent::FeedbackRequested { summary_id } => {
            vec![PageEffect::PromptFeedback { summary_id }]
        }
        PageEvent::FeedbackAnswered {
            summary_id,
            feedback_type,
            message,
        } => feedback_answered(state, summary_id, feedback_type, message),
        PageEvent::FeedbackSubmitted { result } => {
            state.feedback_pending = false;
            match result {
                Ok(receipt) => {
                    info!(feedback_id = ?receipt.feedback_id, "feedback recorded");
                    vec![PageEffect::Alert(FEEDBACK_SENT.to_string())]
                }
                Err(err) => vec![PageEffect::Alert(format!(
                    "Erro ao enviar feedback: {}",
                    err.message
                ))],
            }
        }
    }
}

// ============================================================================
// Input
// ============================================================================

fn select_tab(state: &mut PageState, mode: InputMode) {
    if state.input.mode == mode {
        return;
    }
    state.input.mode = mode;
    match mode {
        InputMode::File => state.input.text.clear(),
        InputMode::Text => state.input.file = None,
    }
    refresh_input(state);
}

fn submit(state: &mut PageState) -> Vec<PageEffect> {
    if state.is_submitting() {
        debug!("submit ignored, one already in flight");
        return vec![];
    }

    let source = match state.input.mode {
        InputMode::File => match &state.input.file {
            Some(file) => SubmitSource::File(file.path.clone()),
            None => return vec![PageEffect::Alert(MISSING_FILE.to_string())],
        },
        InputMode::Text => {
            if state.input.text.trim().is_empty() {
                return vec![PageEffect::Alert(MISSING_TEXT.to_string())];
            }
            SubmitSource::Text(state.input.text.clone())
        }
    };
    if state.input.exports.is_empty() {
        return vec![PageEffect::Alert(MISSING_EXPORT.to_string())];
    }

    let job = state.jobs.next_id();
    // The current job keeps running until the backend accepts this one.
    state.submission = Some(job);
    state.input.submitting = true;
    refresh_input(state);

    info!(?job, mode = state.input.mode.as_str(), "submitting job");
    vec![PageEffect::SubmitJob {
        job,
        request: SubmitRequest {
            source,
            exports: state.input.exports,
        },
    }]
}

fn submit_finished(
    state: &mut PageState,
    job: JobId,
    result: Result<SessionCreated, ApiError>,
    at: Instant,
) -> Vec<PageEffect> {
    if state.submission != Some(job) {
        debug!(?job, "stale submit response dropped");
        return vec![];
    }
    state.submission = None;
    state.input.submitting = false;
    refresh_input(state);

    let session = match result {
        Ok(session) => session,
        Err(err) => {
            warn!(?job, error = %err.message, "submit failed");
            let message = if err.message.trim().is_empty() {
                SUBMIT_FAILED.to_string()
            } else {
                format!("Erro: {}", err.message)
            };
            return vec![PageEffect::Alert(message)];
        }
    };

    let mut effects: Vec<PageEffect> = state
        .job
        .take()
        .and_then(|previous| previous.stream)
        .map(|token| PageEffect::CancelStream { token })
        .into_iter()
        .collect();

    let cancel = CancellationToken::new();
    state.job = Some(JobState {
        id: job,
        session_id: Some(session.session_id.clone()),
        phase: JobPhase::Streaming,
        stream: Some(cancel.clone()),
    });

    state.hide(SectionId::Input);
    for id in SectionId::RESULT {
        state.hide(id);
    }
    state.result = None;
    state.progress = ProgressState::started(at);
    refresh_progress(state);
    state.sections[SectionId::Progress].visible = true;

    info!(?job, session_id = %session.session_id, "job accepted");
    effects.push(PageEffect::OpenProgressStream {
        job,
        session_id: session.session_id,
        cancel,
    });
    effects
}

// ============================================================================
// Progress
// ============================================================================

fn progress(
    state: &mut PageState,
    job: JobId,
    event: ProgressEvent,
    at: Instant,
) -> Vec<PageEffect> {
    if !state
        .job
        .as_ref()
        .is_some_and(|j| j.is(job, JobPhase::Streaming))
    {
        debug!(?job, "stale progress event dropped");
        return vec![];
    }

    match event {
        ProgressEvent::Keepalive => {
            let stale = state.settings.activity_stale;
            state.progress.apply_keepalive(at, stale);
            refresh_progress(state);
            vec![]
        }
        ProgressEvent::Update(update) => progress_update(state, &update, at),
    }
}

fn progress_update(
    state: &mut PageState,
    update: &ProgressUpdate,
    at: Instant,
) -> Vec<PageEffect> {
    if update.has_progress() {
        state.progress.apply_update(update, at);
        refresh_progress(state);
    }

    if !update.complete {
        if update.is_error() {
            warn!(message = %update.error_message(), "progress reported an error before completion");
        }
        return vec![];
    }

    let mut effects = close_stream(state);
    if update.is_error() {
        let message = update.error_message();
        info!(%message, "job finished with error");
        finish_job(state);
        show_error(state, &message);
        return effects;
    }

    effects.extend(fetch_result(state));
    effects
}

fn stream_closed(state: &mut PageState, job: JobId, error: Option<&str>) -> Vec<PageEffect> {
    let Some(current) = state.job.as_mut().filter(|j| j.is(job, JobPhase::Streaming)) else {
        debug!(?job, "stale stream close dropped");
        return vec![];
    };
    match error {
        Some(error) => warn!(?job, %error, "progress stream failed, falling back to result fetch"),
        None => warn!(?job, "progress stream ended early, falling back to result fetch"),
    }
    current.phase = JobPhase::AwaitingFallback;
    current.stream = None;

    vec![PageEffect::ScheduleFallbackFetch {
        job,
        delay: state.settings.fallback_delay,
    }]
}

fn fallback_elapsed(state: &mut PageState, job: JobId) -> Vec<PageEffect> {
    if !state
        .job
        .as_ref()
        .is_some_and(|j| j.is(job, JobPhase::AwaitingFallback))
    {
        return vec![];
    }
    fetch_result(state)
}

/// Moves the current job to `FetchingResult` and issues the fetch.
fn fetch_result(state: &mut PageState) -> Vec<PageEffect> {
    let Some(job) = state.job.as_mut() else {
        return vec![];
    };
    let Some(session_id) = job.session_id.clone() else {
        job.phase = JobPhase::Finished;
        return vec![];
    };
    job.phase = JobPhase::FetchingResult;

    let request = state.requests.next_id();
    state.pending_render = Some(request);
    vec![PageEffect::FetchResult {
        request,
        session_id,
    }]
}

fn close_stream(state: &mut PageState) -> Vec<PageEffect> {
    state
        .job
        .as_mut()
        .and_then(|job| job.stream.take())
        .map(|token| PageEffect::CancelStream { token })
        .into_iter()
        .collect()
}

fn finish_job(state: &mut PageState) {
    if let Some(job) = state.job.as_mut() {
        job.phase = JobPhase::Finished;
    }
}

// ============================================================================
// Results
// ============================================================================

fn take_pending_render(state: &mut PageState, request: RequestId) -> bool {
    if state.pending_render != Some(request) {
        debug!(?request, "stale render request dropped");
        return false;
    }
    state.pending_render = None;
    true
}

fn result_loaded(
    state: &mut PageState,
    request: RequestId,
    result: Result<ResultPayload, ApiError>,
) -> Vec<PageEffect> {
    // Live fetches are one per job, so even a superseded one ends it.
    if state
        .job
        .as_ref()
        .is_some_and(|job| job.phase == JobPhase::FetchingResult)
    {
        finish_job(state);
    }
    if !take_pending_render(state, request) {
        return vec![];
    }

    match result {
        Ok(payload) => show_result(state, &payload),
        Err(err) => {
            warn!(error = %err.message, "result fetch failed");
            show_error(state, &format!("Erro ao carregar resultados: {}", err.message));
        }
    }
    vec![]
}

fn show_result(state: &mut PageState, payload: &ResultPayload) {
    let rendered = match state.renderer().render_result(payload) {
        Ok(rendered) => rendered,
        Err(err) => {
            warn!(error = %err, "result rendering failed");
            show_error(state, &format!("Erro ao exibir resultados: {err}"));
            return;
        }
    };

    state.hide(SectionId::Progress);
    state.hide(SectionId::Input);
    for id in SectionId::RESULT {
        state.hide(id);
    }

    state.show(SectionId::ResultBanner, rendered.banner.clone());
    if let Some(coverage) = &rendered.coverage {
        state.show(SectionId::Coverage, coverage.clone());
    }
    match &rendered.body {
        ResultBody::Failed { html } => state.show(SectionId::Failure, html.clone()),
        ResultBody::Simple { html } => state.show(SectionId::Results, html.clone()),
        ResultBody::Chapters {
            html,
            reliability,
            final_summary,
            observability,
        } => {
            state.show(SectionId::ChapterResults, html.clone());
            if let Some(reliability) = reliability {
                state.show(SectionId::Reliability, reliability.clone());
            }
            if let Some(summary) = final_summary {
                state.show(SectionId::FinalSummary, summary.html.clone());
            }
            if let Some(observability) = observability {
                state.show(SectionId::Observability, observability.clone());
            }
        }
    }

    info!(status = rendered.status.as_str(), verified = rendered.verified, "result rendered");
    state.result = Some(rendered);
}

fn show_error(state: &mut PageState, message: &str) {
    let html = state.renderer().render_error(message).unwrap_or_else(|err| {
        warn!(error = %err, "error panel rendering failed");
        fallback_error_html(message)
    });

    state.hide(SectionId::Progress);
    for id in SectionId::RESULT {
        state.hide(id);
    }
    state.result = None;
    state.show(SectionId::Error, html);
}

fn export_final_summary(state: &PageState, format: SummaryExport) -> Vec<PageEffect> {
    let Some(markdown) = state.final_summary() else {
        return vec![PageEffect::Alert(NOTHING_TO_EXPORT.to_string())];
    };
    match format {
        SummaryExport::Markdown => vec![PageEffect::SaveFile {
            filename: FINAL_SUMMARY_FILENAME.to_string(),
            contents: markdown.to_string(),
        }],
        SummaryExport::Pdf => vec![PageEffect::Alert(PDF_PENDING.to_string())],
    }
}

fn restart(state: &mut PageState) -> Vec<PageEffect> {
    let stream = state.reset();
    render_initial(state);
    info!("page reset");
    stream
        .map(|token| PageEffect::CancelStream { token })
        .into_iter()
        .collect()
}

// ============================================================================
// History & feedback
// ============================================================================

fn show_history(state: &mut PageState, view: &HistoryView) {
    let html = state.renderer().render_history(view).unwrap_or_else(|err| {
        warn!(error = %err, "history rendering failed");
        fallback_error_html(HistoryView::LOAD_ERROR)
    });
    state.show(SectionId::History, html);
}

fn history_loaded(
    state: &mut PageState,
    request: RequestId,
    result: Result<HistoryList, ApiError>,
) -> Vec<PageEffect> {
    if state.history.pending != Some(request) {
        debug!(?request, "stale history response dropped");
        return vec![];
    }
    state.history.pending = None;

    match result {
        Ok(list) => {
            debug!(count = list.summaries.len(), "history loaded");
            state.history.items = list.summaries;
            let view = HistoryView::loaded(&state.history.items);
            show_history(state, &view);
        }
        Err(err) => {
            warn!(error = %err.message, "history fetch failed");
            show_history(state, &HistoryView::failed());
        }
    }
    vec![]
}

fn summary_loaded(
    state: &mut PageState,
    request: RequestId,
    result: Result<SummaryDetail, ApiError>,
) -> Vec<PageEffect> {
    if !take_pending_render(state, request) {
        return vec![];
    }

    let detail = match result {
        Ok(detail) => detail,
        Err(err) => {
            warn!(error = %err.message, "summary fetch failed");
            return vec![PageEffect::Alert(format!(
                "Erro ao carregar resumo: {}",
                err.message
            ))];
        }
    };

    state.feedback = detail.feedback;
    let payload = detail
        .summary
        .and_then(|value| match serde_json::from_value::<StoredSummary>(value) {
            Ok(stored) => Some(stored),
            Err(err) => {
                warn!(error = %err, "stored summary has an unexpected shape");
                None
            }
        })
        .and_then(StoredSummary::into_result);

    match payload {
        Some(payload) => {
            show_result(state, &payload);
            vec![]
        }
        None => vec![PageEffect::Alert(SUMMARY_INVALID.to_string())],
    }
}

fn feedback_answered(
    state: &mut PageState,
    summary_id: String,
    feedback_type: Option<String>,
    message: Option<String>,
) -> Vec<PageEffect> {
    let non_empty = |answer: Option<String>| answer.filter(|a| !a.trim().is_empty());
    let (Some(feedback_type), Some(message)) = (non_empty(feedback_type), non_empty(message))
    else {
        debug!("feedback prompt dismissed");
        return vec![];
    };

    state.feedback_pending = true;
    vec![PageEffect::SubmitFeedback {
        summary_id,
        feedback_type: feedback_wire_value(&feedback_type),
        message,
    }]
}

// ============================================================================
// Section refresh
// ============================================================================

fn refresh_input(state: &mut PageState) {
    let html = state
        .renderer()
        .render_input(&state.input.view())
        .unwrap_or_else(|err| fallback_error_html(&err.to_string()));
    state.sections[SectionId::Input].html = html;
}

fn refresh_progress(state: &mut PageState) {
    let html = state
        .renderer()
        .render_progress(&state.progress.view())
        .unwrap_or_else(|err| fallback_error_html(&err.to_string()));
    state.sections[SectionId::Progress].html = html;
}
