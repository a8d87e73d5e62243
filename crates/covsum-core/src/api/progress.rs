//! Progress stream parsing.
//!
//! `GET /api/progress/{id}` is an SSE stream whose data payloads are either
//! JSON progress snapshots or keepalives. The backend double-wraps its
//! payloads, so a data field may itself start with `data: `; keepalives
//! arrive as data beginning with `:`.

use std::pin::Pin;
use std::task::{Context, Poll};

use eventsource_stream::{EventStream, Eventsource};
use futures_util::Stream;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::error::{ApiError, ApiResult};
use crate::result::null_default;

/// One message from the progress stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Backend is alive but has nothing new to report.
    Keepalive,
    Update(ProgressUpdate),
}

/// Progress snapshot.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProgressUpdate {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub complete: bool,
    #[serde(default)]
    pub error: ProgressError,
}

/// The `error` field is a flag on terminal messages and a bare string when
/// the session is unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProgressError {
    #[default]
    None,
    Flag,
    Message(String),
}

impl<'de> Deserialize<'de> for ProgressError {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null | Value::Bool(false)) => Self::None,
            Some(Value::String(text)) if !text.is_empty() => Self::Message(text),
            Some(Value::String(_)) => Self::None,
            Some(_) => Self::Flag,
        })
    }
}

impl ProgressUpdate {
    pub fn is_error(&self) -> bool {
        self.error != ProgressError::None
    }

    /// True when the payload carries something to display.
    pub fn has_progress(&self) -> bool {
        self.percentage.is_some() || self.message.is_some()
    }

    /// Text to show when the job ended in error.
    pub fn error_message(&self) -> String {
        if let Some(message) = self.message.as_deref().filter(|m| !m.trim().is_empty()) {
            return message.to_string();
        }
        match &self.error {
            ProgressError::Message(text) => text.clone(),
            _ => "Erro no processamento".to_string(),
        }
    }
}

/// Classifies one SSE data payload.
///
/// # Errors
/// Returns a parse error when a non-keepalive payload is empty or not
/// valid JSON.
pub fn parse_progress_data(data: &str) -> ApiResult<ProgressEvent> {
    let data = data.trim();
    if data.starts_with(':') {
        return Ok(ProgressEvent::Keepalive);
    }

    let json = data
        .strip_prefix("data:")
        .map_or(data, str::trim_start);
    if json.starts_with(':') {
        return Ok(ProgressEvent::Keepalive);
    }

    serde_json::from_str::<ProgressUpdate>(json)
        .map(ProgressEvent::Update)
        .map_err(|err| ApiError::parse(format!("Invalid progress payload: {err}")))
}

/// SSE parser that converts a byte stream into `ProgressEvent`s.
pub struct ProgressParser<S> {
    inner: EventStream<S>,
}

impl<S> ProgressParser<S> {
    pub fn new(stream: S) -> Self
    where
        S: Eventsource,
    {
        Self {
            inner: stream.eventsource(),
        }
    }
}

impl<S, E> Stream for ProgressParser<S>
where
    S: Stream<Item = std::result::Result<bytes::Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    type Item = ApiResult<ProgressEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(event))) if event.event == "ping" => {
                Poll::Ready(Some(Ok(ProgressEvent::Keepalive)))
            }
            Poll::Ready(Some(Ok(event))) => Poll::Ready(Some(parse_progress_data(&event.data))),
            Poll::Ready(Some(Err(e))) => {
                Poll::Ready(Some(Err(ApiError::stream(format!("SSE stream error: {e}")))))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}
