use std::time::Duration;

use digest_core::{ErrorClass, SUMMARY_EMPTY_PLACEHOLDER};
use digest_gemini::{GeminiClient, GeminiConfig, GeminiError, GenerativeBackend, PromptFile};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/test-model:generateContent";

fn client_for(server: &MockServer, keys: &[&str]) -> GeminiClient {
    let config = GeminiConfig {
        retry_delay: Duration::from_millis(10),
        file_poll_interval: Duration::from_millis(10),
        file_ready_timeout: Duration::from_secs(5),
        ..GeminiConfig::default()
    }
    .with_model("test-model")
    .with_base_url(server.uri());

    GeminiClient::new(keys.iter().map(|k| k.to_string()).collect(), config).unwrap()
}

fn function_call_body(title: &str, summary: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{
                    "functionCall": {
                        "name": "summarize",
                        "args": {
                            "translated_title": title,
                            "summarized_content": summary
                        }
                    }
                }]
            },
            "finishReason": "STOP"
        }]
    })
}

fn overloaded_body() -> serde_json::Value {
    json!({
        "error": {
            "code": 503,
            "message": "The model is overloaded. Please try again later.",
            "status": "UNAVAILABLE"
        }
    })
}

#[tokio::test]
async fn test_summarize_text_extracts_function_call() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "key-1"))
        .and(body_partial_json(json!({
            "toolConfig": {
                "functionCallingConfig": {
                    "mode": "ANY",
                    "allowedFunctionNames": ["summarize"]
                }
            }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(function_call_body("번역된 제목", "요약")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, &["key-1"]);
    let result = client
        .summarize_text("Original", "<link url=\"u\">text</link>", "Korean")
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.title, "번역된 제목");
    assert_eq!(result.summary, "요약");
}

#[tokio::test]
async fn test_empty_fields_fall_back() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(function_call_body("", "")))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, &["key-1"]);
    let result = client
        .summarize_text("Original", "text", "English")
        .await
        .unwrap();

    assert_eq!(result.title, "Original");
    assert_eq!(result.summary, SUMMARY_EMPTY_PLACEHOLDER);
}

#[tokio::test]
async fn test_overloaded_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_json(overloaded_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, &["key-1"]);
    let err = client
        .summarize_text("Original", "text", "English")
        .await
        .unwrap_err();

    assert_eq!(err.class(), ErrorClass::Overloaded);
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "code": 500, "message": "Internal error", "status": "INTERNAL" }
        })))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(function_call_body("T", "S")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, &["key-1"]);
    let result = client.summarize_text("Original", "text", "English").await.unwrap();

    assert_eq!(result.summary, "S");
}

#[tokio::test]
async fn test_server_error_retry_budget_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "code": 500, "message": "Internal error", "status": "INTERNAL" }
        })))
        .expect(4)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, &["key-1"]);
    let err = client
        .summarize_text("Original", "text", "English")
        .await
        .unwrap_err();

    assert_eq!(err.class(), ErrorClass::Transient);
}

#[tokio::test]
async fn test_bad_request_is_terminal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT" }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, &["key-1"]);
    let err = client
        .summarize_text("Original", "text", "English")
        .await
        .unwrap_err();

    assert_eq!(err.class(), ErrorClass::Terminal);
    assert!(matches!(err, GeminiError::Api { status: 400, .. }));
}

#[tokio::test]
async fn test_credentials_rotate_per_call() {
    let mock_server = MockServer::start().await;

    for key in ["key-1", "key-2"] {
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(query_param("key", key))
            .respond_with(ResponseTemplate::new(200).set_body_json(function_call_body("T", key)))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let client = client_for(&mock_server, &["key-1", "key-2"]);
    let first = client.summarize_text("A", "text", "English").await.unwrap();
    let second = client.summarize_text("B", "text", "English").await.unwrap();

    assert_eq!(first.summary, "key-1");
    assert_eq!(second.summary, "key-2");
}

#[tokio::test]
async fn test_finish_reason_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, &["key-1"]);
    let err = client
        .summarize_text("Original", "text", "English")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("SAFETY"));
    assert_eq!(err.class(), ErrorClass::Terminal);
}

#[tokio::test]
async fn test_summarize_url_uses_url_context() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({ "tools": [{ "urlContext": {} }] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Page summary" }] },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, &["key-1"]);
    let result = client
        .summarize_url("Original title", "https://example.com/post", "English")
        .await
        .unwrap();

    assert_eq!(result.title, "Original title");
    assert_eq!(result.summary, "Page summary");
}

#[tokio::test]
async fn test_summarize_url_empty_text_falls_back() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "" }] },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, &["key-1"]);
    let result = client
        .summarize_url("Original title", "https://example.com/post", "English")
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.title, "Original title");
    assert_eq!(result.summary, SUMMARY_EMPTY_PLACEHOLDER);
}

#[tokio::test]
async fn test_summarize_video_references_file_uri() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {},
                    { "fileData": { "fileUri": "https://www.youtube.com/watch?v=abc" } }
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(function_call_body("V", "Video")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, &["key-1"]);
    let result = client
        .summarize_video("Video", "https://www.youtube.com/watch?v=abc", "English")
        .await
        .unwrap();

    assert_eq!(result.summary, "Video");
}

#[tokio::test]
async fn test_summarize_files_uploads_and_waits() {
    let mock_server = MockServer::start().await;
    let upload_session = format!("{}/upload-session/1", mock_server.uri());

    Mock::given(method("POST"))
        .and(path("/upload/v1beta/files"))
        .and(header("X-Goog-Upload-Protocol", "resumable"))
        .and(header("X-Goog-Upload-Header-Content-Type", "application/pdf"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("x-goog-upload-url", upload_session.as_str()),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/upload-session/1"))
        .and(header("X-Goog-Upload-Offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "file": {
                "name": "files/abc",
                "uri": "https://generativelanguage.googleapis.com/v1beta/files/abc",
                "mimeType": "application/pdf",
                "state": "PROCESSING"
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1beta/files/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "files/abc",
            "uri": "https://generativelanguage.googleapis.com/v1beta/files/abc",
            "mimeType": "application/pdf",
            "state": "ACTIVE"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({
            "contents": [{
                "parts": [
                    {},
                    { "fileData": { "mimeType": "application/pdf" } }
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(function_call_body("Paper", "PDF")))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v1beta/files/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, &["key-1"]);
    let result = client
        .summarize_files(
            "Paper",
            vec![PromptFile::new(b"%PDF-1.4".to_vec(), "application/pdf")],
            "English",
        )
        .await
        .unwrap();

    assert_eq!(result.summary, "PDF");
}

#[tokio::test]
async fn test_failed_file_processing() {
    let mock_server = MockServer::start().await;
    let upload_session = format!("{}/upload-session/2", mock_server.uri());

    Mock::given(method("POST"))
        .and(path("/upload/v1beta/files"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("x-goog-upload-url", upload_session.as_str()),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/upload-session/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "file": { "name": "files/bad", "uri": "u", "mimeType": "application/pdf", "state": "PROCESSING" }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1beta/files/bad"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "files/bad", "state": "FAILED"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(function_call_body("T", "S")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, &["key-1"]);
    let err = client
        .summarize_files(
            "Paper",
            vec![PromptFile::new(b"%PDF".to_vec(), "application/pdf")],
            "English",
        )
        .await
        .unwrap_err();

    assert!(matches!(err, GeminiError::FileProcessing(_)));
}

#[tokio::test]
async fn test_partial_upload_is_cleaned_up() {
    let mock_server = MockServer::start().await;
    let upload_session = format!("{}/upload-session/3", mock_server.uri());

    Mock::given(method("POST"))
        .and(path("/upload/v1beta/files"))
        .and(header("X-Goog-Upload-Header-Content-Type", "application/pdf"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("x-goog-upload-url", upload_session.as_str()),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/upload/v1beta/files"))
        .and(header("X-Goog-Upload-Header-Content-Type", "image/png"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "Unsupported file", "status": "INVALID_ARGUMENT" }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/upload-session/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "file": { "name": "files/first", "uri": "u", "mimeType": "application/pdf", "state": "ACTIVE" }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v1beta/files/first"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(function_call_body("T", "S")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, &["key-1"]);
    let err = client
        .summarize_files(
            "Paper",
            vec![
                PromptFile::new(b"%PDF".to_vec(), "application/pdf"),
                PromptFile::new(vec![0u8; 4], "image/png"),
            ],
            "English",
        )
        .await
        .unwrap_err();

    assert!(matches!(err, GeminiError::Api { status: 400, .. }));
}

#[tokio::test]
async fn test_stalled_file_poll_times_out() {
    let mock_server = MockServer::start().await;
    let upload_session = format!("{}/upload-session/4", mock_server.uri());

    Mock::given(method("POST"))
        .and(path("/upload/v1beta/files"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("x-goog-upload-url", upload_session.as_str()),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/upload-session/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "file": { "name": "files/slow", "uri": "u", "mimeType": "application/pdf", "state": "PROCESSING" }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1beta/files/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "name": "files/slow", "state": "ACTIVE" }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v1beta/files/slow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = GeminiConfig {
        generation_timeout: Duration::from_millis(200),
        file_poll_interval: Duration::from_millis(10),
        file_ready_timeout: Duration::from_secs(30),
        ..GeminiConfig::default()
    }
    .with_model("test-model")
    .with_base_url(mock_server.uri());
    let client = GeminiClient::new(vec!["key-1".to_string()], config).unwrap();

    let started = std::time::Instant::now();
    let err = client
        .summarize_files(
            "Paper",
            vec![PromptFile::new(b"%PDF".to_vec(), "application/pdf")],
            "English",
        )
        .await
        .unwrap_err();

    assert!(matches!(err, GeminiError::Timeout(_)));
    assert!(started.elapsed() < Duration::from_secs(3));
}
