//! Integration tests for the API client against a mock backend.

mod fixtures;

use std::time::Duration;

use covsum_core::api::{
    ApiClient, ApiErrorKind, ExportSelection, FeedbackType, PipelineType, ProgressEvent,
    SubmitRequest, SubmitSource,
};
use covsum_core::result::{ResultStatus, Summaries};
use fixtures::{
    can_bind_localhost, chapter_result, detail_response, json_response, progress_sse,
    sse_response,
};
use futures_util::StreamExt;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(&server.uri(), Some(Duration::from_secs(5))).unwrap()
}

#[tokio::test]
async fn test_submit_text_posts_multipart_form() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/summarize"))
        .and(body_string_contains("name=\"export_formats\""))
        .and(body_string_contains("md,pdf"))
        .and(body_string_contains("name=\"text\""))
        .and(body_string_contains("Era uma vez"))
        .respond_with(json_response(r#"{"session_id": "s-42"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let request = SubmitRequest {
        source: SubmitSource::Text("Era uma vez".to_string()),
        exports: ExportSelection { md: true, pdf: true },
    };
    let session = client(&server).submit(&request).await.unwrap();

    assert_eq!(session.session_id, "s-42");
}

#[tokio::test]
async fn test_submit_file_sends_file_part() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("livro.txt");
    std::fs::write(&file, "conteúdo do livro").unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/summarize"))
        .and(body_string_contains("filename=\"livro.txt\""))
        .and(body_string_contains("text/plain"))
        .respond_with(json_response(r#"{"session_id": "s-file"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let request = SubmitRequest {
        source: SubmitSource::File(file),
        exports: ExportSelection::default(),
    };
    let session = client(&server).submit(&request).await.unwrap();

    assert_eq!(session.session_id, "s-file");
}

#[tokio::test]
async fn test_submit_missing_file_is_io_error() {
    let client = ApiClient::new("http://127.0.0.1:9", None).unwrap();
    let request = SubmitRequest {
        source: SubmitSource::File("/nonexistent/covsum/livro.pdf".into()),
        exports: ExportSelection::default(),
    };

    let err = client.submit(&request).await.unwrap_err();

    assert_eq!(err.kind, ApiErrorKind::Io);
}

#[tokio::test]
async fn test_submit_error_surfaces_detail() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/summarize"))
        .respond_with(detail_response(400, "Formato de arquivo não suportado"))
        .mount(&server)
        .await;

    let request = SubmitRequest {
        source: SubmitSource::Text("x".to_string()),
        exports: ExportSelection::default(),
    };
    let err = client(&server).submit(&request).await.unwrap_err();

    assert_eq!(err.kind, ApiErrorKind::HttpStatus);
    assert_eq!(err.status, Some(400));
    assert_eq!(err.to_string(), "Formato de arquivo não suportado");
}

#[tokio::test]
async fn test_progress_stream_yields_updates_and_keepalives() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/progress/s-1"))
        .and(header("accept", "text/event-stream"))
        .respond_with(sse_response(&progress_sse("s-1")))
        .mount(&server)
        .await;

    let stream = client(&server).progress_stream("s-1").await.unwrap();
    let events: Vec<ProgressEvent> = stream.map(Result::unwrap).collect().await;

    assert_eq!(events.len(), 4);
    let ProgressEvent::Update(first) = &events[0] else {
        panic!("expected update, got {:?}", events[0]);
    };
    assert_eq!(first.percentage, Some(10.0));
    assert_eq!(first.message.as_deref(), Some("Lendo documento"));
    assert_eq!(events[1], ProgressEvent::Keepalive);
    let ProgressEvent::Update(last) = &events[3] else {
        panic!("expected update, got {:?}", events[3]);
    };
    assert!(last.complete);
    assert!(!last.is_error());
}

#[tokio::test]
async fn test_progress_stream_unknown_session_is_http_error() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/progress/missing"))
        .respond_with(detail_response(404, "Session not found"))
        .mount(&server)
        .await;

    let Err(err) = client(&server).progress_stream("missing").await else {
        panic!("expected error");
    };

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_result_decodes_chapter_payload() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/result/s-1"))
        .respond_with(json_response(&chapter_result("s-1")))
        .mount(&server)
        .await;

    let payload = client(&server).result("s-1").await.unwrap();

    assert_eq!(payload.status(), ResultStatus::Pass);
    let Some(Summaries::ChapterBased(chapters)) = &payload.summaries else {
        panic!("expected chapter-based summaries");
    };
    assert_eq!(chapters.capitulos.len(), 2);
    assert_eq!(chapters.capitulos[1].numero.as_str(), "2");
    assert!(chapters.capitulos[1].paginas.is_empty());
    assert_eq!(
        payload.exported_files.get("markdown").map(String::as_str),
        Some("output/s-1/resumo.md")
    );
}

#[tokio::test]
async fn test_result_not_ready_maps_status_and_detail() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/result/s-2"))
        .respond_with(detail_response(400, "Processamento ainda não concluído"))
        .mount(&server)
        .await;

    let err = client(&server).result("s-2").await.unwrap_err();

    assert_eq!(err.status, Some(400));
    assert_eq!(err.message, "Processamento ainda não concluído");
}

#[tokio::test]
async fn test_invalid_json_is_parse_error_with_body() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/result/s-3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client(&server).result("s-3").await.unwrap_err();

    assert_eq!(err.kind, ApiErrorKind::Parse);
    assert_eq!(err.details.as_deref(), Some("<html>oops</html>"));
}

#[tokio::test]
async fn test_list_summaries_sends_pipeline_filter() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/summaries"))
        .and(query_param("pipeline_type", "robust"))
        .respond_with(json_response(
            r#"{"summaries": [{"summary_id": "a1", "title": null, "pipeline_type": "robust",
                "created_at": "2025-01-15T10:30:00", "total_words_input": 5000,
                "total_words_output": 900, "processing_time": 42.17}], "total": 1}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let list = client(&server)
        .list_summaries(Some(PipelineType::Robust))
        .await
        .unwrap();

    assert_eq!(list.total, Some(1));
    assert_eq!(list.summaries[0].display_title(), "Resumo sem título");
    assert_eq!(list.summaries[0].processing_time, Some(42.17));
}

#[tokio::test]
async fn test_summary_detail_keeps_feedback() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/summaries/a1"))
        .respond_with(json_response(
            r#"{"summary": {"summary_id": "a1", "pipeline_type": "robust"},
                "feedback": [{"feedback_id": "f1", "feedback_type": "elogio", "message": "Ótimo"}]}"#,
        ))
        .mount(&server)
        .await;

    let detail = client(&server).summary("a1").await.unwrap();

    assert!(detail.summary.is_some());
    assert_eq!(detail.feedback.len(), 1);
    assert_eq!(detail.feedback[0].feedback_type, "elogio");
}

#[tokio::test]
async fn test_submit_feedback_posts_wire_type() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/summaries/a1/feedback"))
        .and(body_string_contains("sugestão"))
        .and(body_string_contains("Mais exemplos"))
        .respond_with(json_response(r#"{"status": "success", "feedback_id": "f9"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let receipt = client(&server)
        .submit_feedback("a1", FeedbackType::Suggestion.wire_name(), "Mais exemplos")
        .await
        .unwrap();

    assert_eq!(receipt.status.as_deref(), Some("success"));
    assert_eq!(receipt.feedback_id.as_deref(), Some("f9"));
}

#[tokio::test]
async fn test_download_returns_file_bytes() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/download/resumo.md"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Resumo"))
        .mount(&server)
        .await;

    let bytes = client(&server).download("resumo.md").await.unwrap();

    assert_eq!(&bytes[..], b"# Resumo");
}
