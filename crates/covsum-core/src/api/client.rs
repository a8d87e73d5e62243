//! HTTP client for the summarization backend.

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::BoxStream;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::error::{ApiError, ApiErrorKind, ApiResult};
use super::progress::{ProgressEvent, ProgressParser};
use super::types::{
    FeedbackReceipt, HistoryList, PipelineType, SessionCreated, SubmitRequest, SubmitSource,
    SummaryDetail,
};
use crate::config::Config;
use crate::result::ResultPayload;

/// Standard User-Agent header for covsum requests.
pub const USER_AGENT: &str = concat!("covsum/", env!("CARGO_PKG_VERSION"));

/// Stream of progress messages for one session.
pub type ProgressStream = BoxStream<'static, ApiResult<ProgressEvent>>;

/// Client for the summarization API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: Url,
    http: reqwest::Client,
    timeout: Option<Duration>,
}

impl ApiClient {
    /// # Errors
    /// Returns an error if `base_url` is not an absolute http(s) URL.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> ApiResult<Self> {
        let base = Url::parse(base_url).map_err(|e| {
            ApiError::new(
                ApiErrorKind::Connect,
                format!("Invalid base URL {base_url}: {e}"),
            )
        })?;
        if base.cannot_be_a_base() {
            return Err(ApiError::new(
                ApiErrorKind::Connect,
                format!("Invalid base URL {base_url}"),
            ));
        }

        Ok(Self {
            base,
            http: reqwest::Client::new(),
            timeout,
        })
    }

    /// Builds a client from config, with an optional `--base-url` override.
    pub fn from_config(config: &Config, base_url_flag: Option<&str>) -> anyhow::Result<Self> {
        let base_url = config.resolve_base_url(base_url_flag)?;
        Ok(Self::new(&base_url, config.request_timeout())?)
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get(&self, url: Url) -> RequestBuilder {
        self.with_defaults(self.http.get(url))
    }

    fn post(&self, url: Url) -> RequestBuilder {
        self.with_defaults(self.http.post(url))
    }

    fn with_defaults(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder
            .header("user-agent", USER_AGENT)
            .header("accept", "application/json");
        match self.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }

    /// Starts a job: `POST /api/summarize`.
    pub async fn submit(&self, request: &SubmitRequest) -> ApiResult<SessionCreated> {
        let form = Form::new().text("export_formats", request.exports.wire_value());
        let form = match &request.source {
            SubmitSource::Text(text) => form.text("text", text.clone()),
            SubmitSource::File(path) => form.part("file", file_part(path).await?),
        };

        let url = self.endpoint(&["api", "summarize"]);
        debug!(%url, exports = %request.exports.wire_value(), "submitting job");
        let session: SessionCreated = send_json(self.post(url).multipart(form)).await?;
        debug!(session_id = %session.session_id, "job accepted");
        Ok(session)
    }

    /// Opens the SSE progress stream: `GET /api/progress/{id}`.
    ///
    /// No request timeout applies; the stream stays open until the backend
    /// closes it or the caller drops it.
    pub async fn progress_stream(&self, session_id: &str) -> ApiResult<ProgressStream> {
        let url = self.endpoint(&["api", "progress", session_id]);
        let response = self
            .http
            .get(url)
            .header("user-agent", USER_AGENT)
            .header("accept", "text/event-stream")
            .send()
            .await
            .map_err(|e| ApiError::from(&e))?;
        let response = check_status(response).await?;

        Ok(Box::pin(ProgressParser::new(response.bytes_stream())))
    }

    /// Final result of a job: `GET /api/result/{id}`.
    pub async fn result(&self, session_id: &str) -> ApiResult<ResultPayload> {
        send_json(self.get(self.endpoint(&["api", "result", session_id]))).await
    }

    /// Stored summaries: `GET /api/summaries`.
    pub async fn list_summaries(&self, pipeline: Option<PipelineType>) -> ApiResult<HistoryList> {
        let mut url = self.endpoint(&["api", "summaries"]);
        if let Some(pipeline) = pipeline {
            url.query_pairs_mut()
                .append_pair("pipeline_type", pipeline.as_str());
        }
        send_json(self.get(url)).await
    }

    /// One stored summary with its feedback: `GET /api/summaries/{id}`.
    pub async fn summary(&self, summary_id: &str) -> ApiResult<SummaryDetail> {
        send_json(self.get(self.endpoint(&["api", "summaries", summary_id]))).await
    }

    /// `POST /api/summaries/{id}/feedback`.
    pub async fn submit_feedback(
        &self,
        summary_id: &str,
        feedback_type: &str,
        message: &str,
    ) -> ApiResult<FeedbackReceipt> {
        let form = Form::new()
            .text("feedback_type", feedback_type.to_string())
            .text("message", message.to_string());
        let url = self.endpoint(&["api", "summaries", summary_id, "feedback"]);
        send_json(self.post(url).multipart(form)).await
    }

    /// Absolute URL of an exported file.
    pub fn download_url(&self, filename: &str) -> String {
        self.endpoint(&["api", "download", filename]).to_string()
    }

    /// Downloads an exported file: `GET /api/download/{name}`.
    pub async fn download(&self, filename: &str) -> ApiResult<Bytes> {
        let url = self.endpoint(&["api", "download", filename]);
        let response = self
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::from(&e))?;
        let response = check_status(response).await?;
        response.bytes().await.map_err(|e| ApiError::from(&e))
    }
}

async fn file_part(path: &Path) -> ApiResult<Part> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        ApiError::new(
            ApiErrorKind::Io,
            format!("Failed to read {}: {e}", path.display()),
        )
    })?;
    let file_name = path
        .file_name()
        .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    let mime = if is_pdf { "application/pdf" } else { "text/plain" };

    Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(mime)
        .map_err(|e| ApiError::new(ApiErrorKind::Io, format!("Invalid upload type: {e}")))
}

async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_body = response.text().await.unwrap_or_default();
    Err(ApiError::http_status(status.as_u16(), &error_body))
}

async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> ApiResult<T> {
    let response = builder.send().await.map_err(|e| ApiError::from(&e))?;
    let response = check_status(response).await?;
    let body = response.text().await.map_err(|e| ApiError::from(&e))?;
    serde_json::from_str(&body).map_err(|err| {
        let mut error = ApiError::parse(format!("Failed to parse response: {err}"));
        error.details = Some(body);
        error
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_keep_base_path_and_encode_ids() {
        let client = ApiClient::new("http://host:8000/prefix/", None).unwrap();
        assert_eq!(
            client.endpoint(&["api", "result", "a b"]).as_str(),
            "http://host:8000/prefix/api/result/a%20b"
        );

        let root = ApiClient::new("http://localhost:8000", None).unwrap();
        assert_eq!(
            root.download_url("resumo.md"),
            "http://localhost:8000/api/download/resumo.md"
        );
    }

    #[test]
    fn rejects_non_base_urls() {
        assert!(ApiClient::new("mailto:someone@example.com", None).is_err());
        assert!(ApiClient::new("not a url", None).is_err());
    }
}
