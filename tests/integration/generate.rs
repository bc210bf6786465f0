//! Generate endpoint integration tests
//!
//! Exercise `POST /api/generate` validation and dispatch with stub adapters.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use axum_test::multipart::{MultipartForm, Part};
use bytes::Bytes;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use promptrelay::{
    provider::{ErrorKind, ProviderError},
    Provider,
};

use crate::common::{keyed_config, stub_router, stub_server, StubGenerator};

fn form(provider: &str, text: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("provider", provider)
        .add_text("text", text)
}

fn stubs() -> (std::sync::Arc<StubGenerator>, std::sync::Arc<StubGenerator>) {
    (
        StubGenerator::replying(Provider::OpenAi, "Mocked OpenAI response"),
        StubGenerator::replying(Provider::Google, "Mocked Google response"),
    )
}

#[tokio::test]
async fn test_openai_success_no_file() {
    let (openai, google) = stubs();
    let server = stub_server(keyed_config(), openai.clone(), google.clone());

    let response = server
        .post("/api/generate")
        .multipart(form("openai", "Hello OpenAI"))
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({"response": "Mocked OpenAI response"})
    );

    let calls = openai.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].prompt, "Hello OpenAI");
    assert_eq!(calls[0].upload, None);
    assert!(google.calls().is_empty());
}

#[tokio::test]
async fn test_google_success_no_file() {
    let (openai, google) = stubs();
    let server = stub_server(keyed_config(), openai.clone(), google.clone());

    let response = server
        .post("/api/generate")
        .multipart(form("google", "Hello Google"))
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({"response": "Mocked Google response"})
    );

    let calls = google.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].prompt, "Hello Google");
    assert_eq!(calls[0].upload, None);
    assert!(openai.calls().is_empty());
}

#[tokio::test]
async fn test_openai_success_with_file() {
    let (openai, google) = stubs();
    let server = stub_server(keyed_config(), openai.clone(), google);

    let response = server
        .post("/api/generate")
        .multipart(form("openai", "Analyze this file").add_part(
            "file",
            Part::bytes(b"This is a test file.".to_vec())
                .file_name("test.txt")
                .mime_type("text/plain"),
        ))
        .await;

    response.assert_status_ok();

    let upload = openai.calls()[0].upload.clone().expect("file forwarded");
    assert_eq!(upload.data, Bytes::from_static(b"This is a test file."));
    assert_eq!(upload.filename.as_deref(), Some("test.txt"));
}

#[tokio::test]
async fn test_google_success_with_file() {
    let (openai, google) = stubs();
    let server = stub_server(keyed_config(), openai, google.clone());

    let response = server
        .post("/api/generate")
        .multipart(form("google", "Analyze this please").add_part(
            "file",
            Part::bytes(b"This is another test file.".to_vec())
                .file_name("test_doc.txt")
                .mime_type("text/plain"),
        ))
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({"response": "Mocked Google response"})
    );

    let upload = google.calls()[0].upload.clone().expect("file forwarded");
    assert_eq!(upload.data, Bytes::from_static(b"This is another test file."));
    assert_eq!(upload.filename.as_deref(), Some("test_doc.txt"));
    assert_eq!(upload.mime_type.as_deref(), Some("text/plain"));
}

#[tokio::test]
async fn test_invalid_provider() {
    let (openai, google) = stubs();
    let server = stub_server(keyed_config(), openai.clone(), google.clone());

    let response = server
        .post("/api/generate")
        .multipart(form("unknown_provider", "Hello"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let detail = response.json::<Value>()["detail"].as_str().unwrap().to_string();
    assert!(detail.contains("Invalid AI provider specified."));
    assert!(openai.calls().is_empty());
    assert!(google.calls().is_empty());
}

#[tokio::test]
async fn test_invalid_provider_checked_before_credentials() {
    let (openai, google) = stubs();
    let config = promptrelay::Config::default();
    let server = stub_server(config, openai, google);

    let response = server
        .post("/api/generate")
        .multipart(form("anthropic", "Hello"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_openai_api_key() {
    let (openai, google) = stubs();
    let config = promptrelay::Config {
        openai_api_key: None,
        ..keyed_config()
    };
    let server = stub_server(config, openai.clone(), google);

    let response = server
        .post("/api/generate")
        .multipart(form("openai", "Hello OpenAI"))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let detail = response.json::<Value>()["detail"].as_str().unwrap().to_string();
    assert!(detail.contains("OPENAI_API_KEY not configured."));
    assert!(openai.calls().is_empty());
}

#[tokio::test]
async fn test_missing_google_api_key_when_empty() {
    let (openai, google) = stubs();
    let config = promptrelay::Config {
        google_api_key: Some(String::new()),
        ..keyed_config()
    };
    let server = stub_server(config, openai, google.clone());

    let response = server
        .post("/api/generate")
        .multipart(form("google", "Hello Google"))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let detail = response.json::<Value>()["detail"].as_str().unwrap().to_string();
    assert!(detail.contains("GOOGLE_API_KEY not configured."));
    assert!(google.calls().is_empty());
}

#[tokio::test]
async fn test_adapter_error_text_is_propagated_verbatim() {
    let openai = StubGenerator::replying(Provider::OpenAi, "Error: OpenAI specific problem");
    let google = StubGenerator::replying(Provider::Google, "Error: Google specific problem");
    let server = stub_server(keyed_config(), openai, google);

    let response = server
        .post("/api/generate")
        .multipart(form("openai", "Test error"))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>()["detail"],
        "Error: OpenAI specific problem"
    );

    let response = server
        .post("/api/generate")
        .multipart(form("google", "Test error google"))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>()["detail"],
        "Error: Google specific problem"
    );
}

#[tokio::test]
async fn test_adapter_error_value_is_propagated_verbatim() {
    let openai = StubGenerator::failing(
        Provider::OpenAi,
        ProviderError::new(
            ErrorKind::Connection,
            "OpenAI API Connection Error - Connection error.",
        ),
    );
    let google = StubGenerator::replying(Provider::Google, "unused");
    let server = stub_server(keyed_config(), openai, google);

    let response = server
        .post("/api/generate")
        .multipart(form("openai", "Hi"))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>()["detail"],
        "Error: OpenAI API Connection Error - Connection error."
    );
}

#[tokio::test]
async fn test_missing_text_field() {
    let (openai, google) = stubs();
    let server = stub_server(keyed_config(), openai, google);

    let response = server
        .post("/api/generate")
        .multipart(MultipartForm::new().add_text("provider", "openai"))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["detail"], "Field required: text");
}

#[tokio::test]
async fn test_non_multipart_body_is_rejected() {
    let (openai, google) = stubs();
    let server = stub_server(keyed_config(), openai, google);

    let response = server
        .post("/api/generate")
        .json(&json!({"provider": "openai", "text": "hi"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["detail"]
        .as_str()
        .unwrap()
        .starts_with("Invalid form data:"));
}

#[tokio::test]
async fn test_file_read_error_handling() {
    let (openai, google) = stubs();
    let app = stub_router(keyed_config(), openai.clone(), google);

    // The file part never reaches its closing boundary
    let body = concat!(
        "--XBOUNDARY\r\n",
        "Content-Disposition: form-data; name=\"provider\"\r\n\r\n",
        "openai\r\n",
        "--XBOUNDARY\r\n",
        "Content-Disposition: form-data; name=\"text\"\r\n\r\n",
        "Analyze this\r\n",
        "--XBOUNDARY\r\n",
        "Content-Disposition: form-data; name=\"file\"; filename=\"error_file.txt\"\r\n",
        "Content-Type: text/plain\r\n\r\n",
        "some content"
    );

    let request = Request::builder()
        .method("POST")
        .uri("/api/generate")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
    let parsed: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(parsed["detail"]
        .as_str()
        .unwrap()
        .starts_with("Error processing uploaded file:"));
    assert!(openai.calls().is_empty());
}

#[tokio::test]
async fn test_repeated_calls_are_identical() {
    let (openai, google) = stubs();
    let server = stub_server(keyed_config(), openai.clone(), google);

    let mut bodies = Vec::new();
    for _ in 0..3 {
        let response = server
            .post("/api/generate")
            .multipart(form("openai", "Same prompt"))
            .await;
        response.assert_status_ok();
        bodies.push(response.json::<Value>());
    }

    assert!(bodies.windows(2).all(|w| w[0] == w[1]));
    let calls = openai.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.windows(2).all(|w| w[0] == w[1]));
}
