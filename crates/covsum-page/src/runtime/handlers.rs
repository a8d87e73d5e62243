//! Effect handlers for the page runtime.
//!
//! Handlers are pure async functions that perform one piece of I/O and
//! return the `PageEvent` describing its outcome. The runtime spawns them
//! and forwards the result to the inbox. They never touch page state.
//!
//! The progress subscription is the exception: it emits many events, so it
//! gets the inbox sender and only returns the event that ends it.

use std::time::{Duration, Instant};

use covsum_core::api::{
    ApiClient, ApiErrorKind, PipelineType, ProgressEvent, SubmitRequest,
};
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::inbox::PageEventSender;
use crate::common::{JobId, RequestId};
use crate::events::PageEvent;

/// Event timestamps follow tokio's clock so paused-time tests stay exact.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

pub async fn submit_job(client: ApiClient, job: JobId, request: SubmitRequest) -> PageEvent {
    let result = client.submit(&request).await;
    PageEvent::SubmitFinished {
        job,
        result,
        at: now(),
    }
}

/// Forwards progress messages until the job completes, the stream ends or
/// `cancel` fires.
///
/// Returns `StreamClosed` when the stream broke or ended before a complete
/// message; `None` when it finished normally or was cancelled.
pub async fn stream_progress(
    client: ApiClient,
    job: JobId,
    session_id: String,
    cancel: CancellationToken,
    inbox: PageEventSender,
) -> Option<PageEvent> {
    let opened = tokio::select! {
        () = cancel.cancelled() => return None,
        opened = client.progress_stream(&session_id) => opened,
    };
    let mut stream = match opened {
        Ok(stream) => stream,
        Err(err) => {
            return Some(PageEvent::StreamClosed {
                job,
                error: Some(err.message),
            });
        }
    };

    loop {
        let next = tokio::select! {
            () = cancel.cancelled() => {
                debug!(%session_id, "progress stream cancelled");
                return None;
            }
            next = stream.next() => next,
        };

        match next {
            Some(Ok(event)) => {
                let complete = matches!(&event, ProgressEvent::Update(update) if update.complete);
                let sent = inbox.send(PageEvent::Progress {
                    job,
                    event,
                    at: now(),
                });
                if sent.is_err() || complete {
                    return None;
                }
            }
            Some(Err(err)) if err.kind == ApiErrorKind::Parse => {
                warn!(%session_id, error = %err.message, "dropping malformed progress message");
            }
            Some(Err(err)) => {
                return Some(PageEvent::StreamClosed {
                    job,
                    error: Some(err.message),
                });
            }
            None => return Some(PageEvent::StreamClosed { job, error: None }),
        }
    }
}

pub async fn fallback_timer(job: JobId, delay: Duration) -> PageEvent {
    tokio::time::sleep(delay).await;
    PageEvent::FallbackElapsed { job }
}

pub async fn fetch_result(client: ApiClient, request: RequestId, session_id: String) -> PageEvent {
    PageEvent::ResultLoaded {
        request,
        result: client.result(&session_id).await,
    }
}

pub async fn fetch_history(
    client: ApiClient,
    request: RequestId,
    pipeline: Option<PipelineType>,
) -> PageEvent {
    PageEvent::HistoryLoaded {
        request,
        result: client.list_summaries(pipeline).await,
    }
}

pub async fn fetch_summary(client: ApiClient, request: RequestId, summary_id: String) -> PageEvent {
    PageEvent::SummaryLoaded {
        request,
        result: client.summary(&summary_id).await,
    }
}

pub async fn submit_feedback(
    client: ApiClient,
    summary_id: String,
    feedback_type: String,
    message: String,
) -> PageEvent {
    PageEvent::FeedbackSubmitted {
        result: client
            .submit_feedback(&summary_id, &feedback_type, &message)
            .await,
    }
}
