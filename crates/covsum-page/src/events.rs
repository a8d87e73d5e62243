//! Page events.
//!
//! Everything that can change the page arrives as a `PageEvent`: user
//! actions from the host and results sent back by runtime handlers. The
//! reducer in `update.rs` is the only consumer.

use std::path::PathBuf;
use std::time::Instant;

use covsum_core::api::{
    ApiResult, ExportFormat, FeedbackReceipt, HistoryList, PipelineType, ProgressEvent,
    SessionCreated, SummaryDetail,
};
use covsum_core::result::ResultPayload;

use crate::common::{JobId, RequestId};
use crate::state::InputMode;

/// Final summary export targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryExport {
    Markdown,
    Pdf,
}

#[derive(Debug)]
pub enum PageEvent {
    // Input form
    TabSelected(InputMode),
    FileSelected {
        path: PathBuf,
        size: u64,
    },
    FileCleared,
    TextChanged(String),
    ExportToggled {
        format: ExportFormat,
        checked: bool,
    },
    SubmitRequested,

    // Job lifecycle
    SubmitFinished {
        job: JobId,
        result: ApiResult<SessionCreated>,
        at: Instant,
    },
    Progress {
        job: JobId,
        event: ProgressEvent,
        at: Instant,
    },
    /// Subscription ended without a terminal message; `error` is set when
    /// the transport failed.
    StreamClosed {
        job: JobId,
        error: Option<String>,
    },
    FallbackElapsed {
        job: JobId,
    },
    ResultLoaded {
        request: RequestId,
        result: ApiResult<ResultPayload>,
    },

    // Result actions
    CopyFinalSummary,
    CopyFinished(Result<(), String>),
    ExportFinalSummary(SummaryExport),
    FileSaved {
        filename: String,
        result: Result<PathBuf, String>,
    },
    /// Zero-based chapter index from the table of contents.
    ScrollToChapter(usize),
    RestartRequested,

    // History
    HistoryRequested {
        pipeline: Option<PipelineType>,
    },
    HistoryLoaded {
        request: RequestId,
        result: ApiResult<HistoryList>,
    },
    SummaryRequested {
        summary_id: String,
    },
    SummaryLoaded {
        request: RequestId,
        result: ApiResult<SummaryDetail>,
    },

    // Feedback
    FeedbackRequested {
        summary_id: String,
    },
    /// `None` answers mean the user dismissed the prompt.
    FeedbackAnswered {
        summary_id: String,
        feedback_type: Option<String>,
        message: Option<String>,
    },
    FeedbackSubmitted {
        result: ApiResult<FeedbackReceipt>,
    },
}
