//! Page runtime: owns the state, runs the reducer, executes effects.
//!
//! This is the "Elm runtime" boundary: all side effects happen here. The
//! reducer stays pure and produces effects; this module executes them.
//!
//! ## Inbox Pattern
//!
//! Async handlers send `PageEvent`s to `inbox_tx`; the runtime drains
//! `inbox_rx` and feeds each event to the reducer in arrival order.
//!
//! Structure:
//! - `mod.rs`: `PageRuntime`, dispatch loop, effect execution
//! - `inbox.rs`: Inbox channel types
//! - `handlers.rs`: Effect handler implementations (HTTP, SSE, timers)

mod handlers;
mod inbox;

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use covsum_core::api::{ApiClient, FeedbackType};
use covsum_core::interrupt::{self, InterruptedError};
use covsum_core::render::Renderer;
use inbox::{PageEventReceiver, PageEventSender};
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

use crate::effects::PageEffect;
use crate::events::PageEvent;
use crate::host::PageHost;
use crate::state::{PageSettings, PageState};
use crate::update;

const FEEDBACK_MESSAGE_PROMPT: &str = "Mensagem do feedback:";

/// Drives one page against one backend.
pub struct PageRuntime<H: PageHost> {
    state: PageState,
    client: ApiClient,
    host: H,
    inbox_tx: PageEventSender,
    inbox_rx: PageEventReceiver,
    tasks: TaskTracker,
}

impl<H: PageHost> PageRuntime<H> {
    /// # Errors
    /// Returns an error if the bundled templates fail to compile.
    pub fn new(client: ApiClient, settings: PageSettings, host: H) -> Result<Self> {
        let renderer = Renderer::new().context("Failed to load page templates")?;
        let mut state = PageState::new(settings, Arc::new(renderer));
        update::render_initial(&mut state);

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Ok(Self {
            state,
            client,
            host,
            inbox_tx,
            inbox_rx,
            tasks: TaskTracker::new(),
        })
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Feeds one event to the reducer and executes what it asks for.
    pub fn dispatch(&mut self, event: PageEvent) {
        let effects = update::update(&mut self.state, event);
        self.host.on_update(&self.state);
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    /// Processes inbox events until nothing the page started is still
    /// outstanding.
    ///
    /// # Errors
    /// Returns `InterruptedError` on Ctrl+C, after resetting the page and
    /// closing the progress stream.
    pub async fn run_until_settled(&mut self) -> Result<()> {
        loop {
            while let Ok(event) = self.inbox_rx.try_recv() {
                self.dispatch(event);
            }
            if !self.state.is_busy() {
                return Ok(());
            }

            let next = tokio::select! {
                event = self.inbox_rx.recv() => Some(event),
                () = interrupt::wait_for_interrupt() => None,
            };
            match next {
                Some(Some(event)) => self.dispatch(event),
                // The runtime holds a sender, so the channel never closes.
                Some(None) => return Ok(()),
                None => {
                    info!("interrupted, resetting page");
                    self.dispatch(PageEvent::RestartRequested);
                    return Err(InterruptedError.into());
                }
            }
        }
    }

    /// Dispatches `event` and waits for everything it started.
    ///
    /// # Errors
    /// See [`Self::run_until_settled`].
    pub async fn run(&mut self, event: PageEvent) -> Result<()> {
        self.dispatch(event);
        self.run_until_settled().await
    }

    /// The page as a standalone HTML document.
    ///
    /// # Errors
    /// Returns an error if the document template fails to render.
    pub fn render_document(&self) -> Result<String> {
        self.state
            .render_document()
            .context("Failed to render page document")
    }

    /// Spawns a handler and forwards its event to the inbox.
    fn spawn_effect<F, Fut>(&self, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = PageEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        self.tasks.spawn(async move {
            let _ = tx.send(f().await);
        });
    }

    fn execute_effect(&mut self, effect: PageEffect) {
        match effect {
            // Host interaction (inline)
            PageEffect::Alert(message) => self.host.alert(&message),
            PageEffect::ScrollTo { target } => self.host.scroll_to(&target),
            PageEffect::PromptFeedback { summary_id } => {
                let feedback_type = self.host.prompt(&FeedbackType::prompt_text());
                let message = if feedback_type.is_some() {
                    self.host.prompt(FEEDBACK_MESSAGE_PROMPT)
                } else {
                    None
                };
                self.dispatch(PageEvent::FeedbackAnswered {
                    summary_id,
                    feedback_type,
                    message,
                });
            }
            PageEffect::CopyToClipboard { text } => {
                let result = self.host.copy_to_clipboard(&text);
                self.dispatch(PageEvent::CopyFinished(result));
            }
            PageEffect::SaveFile { filename, contents } => {
                let result = self
                    .host
                    .save_file(&filename, &contents)
                    .map_err(|e| format!("{e:#}"));
                self.dispatch(PageEvent::FileSaved { filename, result });
            }

            // Cancellation: the reducer decides, the runtime just cancels.
            PageEffect::CancelStream { token } => token.cancel(),

            // Job effects
            PageEffect::SubmitJob { job, request } => {
                let client = self.client.clone();
                self.spawn_effect(move || handlers::submit_job(client, job, request));
            }
            PageEffect::OpenProgressStream {
                job,
                session_id,
                cancel,
            } => {
                debug!(?job, %session_id, "opening progress stream");
                let client = self.client.clone();
                let tx = self.inbox_tx.clone();
                self.tasks.spawn(async move {
                    let inbox = tx.clone();
                    if let Some(event) =
                        handlers::stream_progress(client, job, session_id, cancel, inbox).await
                    {
                        let _ = tx.send(event);
                    }
                });
            }
            PageEffect::ScheduleFallbackFetch { job, delay } => {
                self.spawn_effect(move || handlers::fallback_timer(job, delay));
            }
            PageEffect::FetchResult {
                request,
                session_id,
            } => {
                let client = self.client.clone();
                self.spawn_effect(move || handlers::fetch_result(client, request, session_id));
            }

            // History effects
            PageEffect::FetchHistory { request, pipeline } => {
                let client = self.client.clone();
                self.spawn_effect(move || handlers::fetch_history(client, request, pipeline));
            }
            PageEffect::FetchSummary {
                request,
                summary_id,
            } => {
                let client = self.client.clone();
                self.spawn_effect(move || handlers::fetch_summary(client, request, summary_id));
            }
            PageEffect::SubmitFeedback {
                summary_id,
                feedback_type,
                message,
            } => {
                let client = self.client.clone();
                self.spawn_effect(move || {
                    handlers::submit_feedback(client, summary_id, feedback_type, message)
                });
            }
        }
    }
}

impl<H: PageHost> Drop for PageRuntime<H> {
    fn drop(&mut self) {
        if let Some(token) = self.state.job.as_ref().and_then(|job| job.stream.as_ref()) {
            token.cancel();
        }
        self.tasks.close();
    }
}
