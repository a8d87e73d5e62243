//! Client side of the summarization HTTP/SSE API.

mod client;
mod error;
mod progress;
mod types;

pub use client::{ApiClient, ProgressStream, USER_AGENT};
pub use error::{ApiError, ApiErrorKind, ApiResult};
pub use progress::{
    ProgressError, ProgressEvent, ProgressParser, ProgressUpdate, parse_progress_data,
};
pub use types::{
    ACCEPTED_EXTENSIONS, ExportFormat, ExportSelection, FeedbackEntry, FeedbackReceipt,
    FeedbackType, HistoryItem, HistoryList, PipelineType, SessionCreated, StoredSummary,
    SubmitRequest, SubmitSource, SummaryDetail, feedback_wire_value, is_accepted_file,
};
