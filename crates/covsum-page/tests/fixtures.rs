//! Backend fixtures and a recording host for page runtime tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;

use covsum_page::PageHost;
use wiremock::ResponseTemplate;

pub const PROGRESS_STREAM: &str =
    include_str!("../../covsum-core/tests/fixtures/progress_stream.sse");
pub const CHAPTER_RESULT: &str =
    include_str!("../../covsum-core/tests/fixtures/chapter_result.json");

pub fn progress_sse(session_id: &str) -> String {
    PROGRESS_STREAM.replace("{{SESSION}}", session_id)
}

pub fn chapter_result(session_id: &str) -> String {
    CHAPTER_RESULT.replace("{{SESSION}}", session_id)
}

pub fn sse_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body.to_string())
}

pub fn json_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/json")
        .set_body_string(body.to_string())
}

pub fn detail_response(status: u16, detail: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(serde_json::json!({ "detail": detail }))
}

pub fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

/// Host that records everything the page asks of it.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub alerts: Vec<String>,
    pub prompts: Vec<String>,
    pub answers: VecDeque<String>,
    pub clipboard: Option<String>,
    pub saved: Vec<(String, String)>,
    pub scrolled: Vec<String>,
    pub updates: usize,
    pub save_dir: PathBuf,
}

impl RecordingHost {
    pub fn with_answers(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| (*a).to_string()).collect(),
            ..Self::default()
        }
    }
}

impl PageHost for RecordingHost {
    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    fn prompt(&mut self, message: &str) -> Option<String> {
        self.prompts.push(message.to_string());
        self.answers.pop_front()
    }

    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), String> {
        self.clipboard = Some(text.to_string());
        Ok(())
    }

    fn save_file(&mut self, filename: &str, contents: &str) -> anyhow::Result<PathBuf> {
        self.saved.push((filename.to_string(), contents.to_string()));
        Ok(self.save_dir.join(filename))
    }

    fn scroll_to(&mut self, target: &str) {
        self.scrolled.push(target.to_string());
    }

    fn on_update(&mut self, _state: &covsum_page::PageState) {
        self.updates += 1;
    }
}
