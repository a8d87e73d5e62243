//! Backend response fixtures for integration tests.

#![allow(dead_code)]

use wiremock::ResponseTemplate;

pub const PROGRESS_STREAM: &str = include_str!("fixtures/progress_stream.sse");
pub const CHAPTER_RESULT: &str = include_str!("fixtures/chapter_result.json");

/// Progress stream for a session, double-wrapped the way the backend sends it.
pub fn progress_sse(session_id: &str) -> String {
    PROGRESS_STREAM.replace("{{SESSION}}", session_id)
}

/// Chapter-based PASS result at 100% coverage.
pub fn chapter_result(session_id: &str) -> String {
    CHAPTER_RESULT.replace("{{SESSION}}", session_id)
}

/// Wrap SSE body string in a ResponseTemplate.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_substitute_session() {
        assert!(progress_sse("s-1").contains(r#""session_id": "s-1""#));
        assert!(chapter_result("s-1").contains("output/s-1/resumo.md"));
        assert!(!chapter_result("s-1").contains("{{SESSION}}"));
    }
}
