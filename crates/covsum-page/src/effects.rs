//! Page effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They cover network calls, timers and host interaction; the reducer never
//! performs I/O itself.
//!
//! Cancellation is decided by the reducer through `PageEffect::CancelStream`
//! and carried out by the runtime calling `token.cancel()`.

use std::time::Duration;

use covsum_core::api::{PipelineType, SubmitRequest};
use tokio_util::sync::CancellationToken;

use crate::common::{JobId, RequestId};

#[derive(Debug)]
pub enum PageEffect {
    /// Blocking notice for the user.
    Alert(String),

    /// `POST /api/summarize`.
    SubmitJob { job: JobId, request: SubmitRequest },

    /// Subscribe to progress; the subscription ends when `cancel` fires.
    OpenProgressStream {
        job: JobId,
        session_id: String,
        cancel: CancellationToken,
    },

    CancelStream { token: CancellationToken },

    /// One-shot result fetch after `delay`, used when the stream dropped.
    ScheduleFallbackFetch { job: JobId, delay: Duration },

    FetchResult {
        request: RequestId,
        session_id: String,
    },

    FetchHistory {
        request: RequestId,
        pipeline: Option<PipelineType>,
    },

    FetchSummary {
        request: RequestId,
        summary_id: String,
    },

    /// Ask the host for feedback type and message.
    PromptFeedback { summary_id: String },

    SubmitFeedback {
        summary_id: String,
        feedback_type: String,
        message: String,
    },

    CopyToClipboard { text: String },

    SaveFile { filename: String, contents: String },

    /// Bring a DOM id into view.
    ScrollTo { target: String },
}
