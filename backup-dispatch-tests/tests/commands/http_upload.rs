//! Tests for the 'http-upload' command
//!
//! The blocking client must not run on the async runtime, so every dispatch
//! goes through `spawn_blocking`.

use backup_dispatch::sinks::HttpUploadRecord;
use backup_dispatch::Dispatcher;
use std::net::TcpListener;
use test_utils::*;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(url: String) -> HttpUploadOptions {
    HttpUploadOptions {
        url: Some(url),
        content: Some("hostname R1\n".to_string()),
        ..Default::default()
    }
}

async fn dispatch(config: Config, request: HttpUploadOptions) -> DispatchResult<HttpUploadRecord> {
    tokio::task::spawn_blocking(move || Dispatcher::new(config).upload_http(request))
        .await
        .expect("dispatch task panicked")
}

#[tokio::test]
async fn test_upload_success_reports_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload_backup/"))
        .respond_with(ResponseTemplate::new(201).set_body_string("stored"))
        .expect(1)
        .mount(&server)
        .await;

    let result = dispatch(
        Config::default(),
        request(format!("{}/upload_backup/", server.uri())),
    )
    .await;

    assert!(result.is_success());
    assert_eq!(result.record().response_status, 201);
    assert_eq!(result.record().msg.as_deref(), Some("stored"));
}

#[tokio::test]
async fn test_multipart_body_carries_file_part() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut req = request(format!("{}/upload", server.uri()));
    req.field = Some("config".to_string());
    req.filename = Some("r1.cfg".to_string());
    req.extra_data.insert("site".to_string(), "lab".to_string());

    let result = dispatch(Config::default(), req).await;
    assert!(result.is_success());

    let received = server.received_requests().await.assert_some();
    assert_eq!(received.len(), 1);

    let content_type = received[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data"));

    let body = String::from_utf8_lossy(&received[0].body).to_string();
    assert!(body.contains("name=\"config\"; filename=\"r1.cfg\""));
    assert!(body.contains("name=\"site\""));
    assert!(body.contains("hostname R1"));

    // extra fields precede the file part
    let site = body.find("name=\"site\"").unwrap();
    let file = body.find("name=\"config\"").unwrap();
    assert!(site < file);
}

#[tokio::test]
async fn test_query_params_and_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("device", "r1"))
        .and(header("x-token", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let mut req = request(format!("{}/upload", server.uri()));
    req.params.insert("device".to_string(), "r1".to_string());

    let config = ConfigBuilder::new().with_http_header("X-Token", "secret").build();
    let result = dispatch(config, req).await;

    assert!(result.is_success(), "{:?}", result.failure_message());
}

#[tokio::test]
async fn test_rejection_is_a_failure_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let result = dispatch(Config::default(), request(format!("{}/missing", server.uri()))).await;

    assert!(!result.is_success());
    assert_eq!(result.failure_message(), Some("not found"));
    assert_eq!(result.record().response_status, 404);
    assert_eq!(result.exit_code(), 1);
}

#[tokio::test]
async fn test_rejection_with_empty_body_still_has_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = dispatch(Config::default(), request(server.uri())).await;

    let msg = result.failure_message().assert_some();
    assert!(msg.contains("500"));
}

#[test]
fn test_unreachable_endpoint_is_a_failure() {
    // Bind then release a port so nothing listens on it
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let result = Dispatcher::new(Config::default())
        .upload_http(request(format!("http://127.0.0.1:{}/upload", port)));

    assert!(!result.is_success());
    assert!(!result.failure_message().unwrap().is_empty());
    assert_eq!(result.record().response_status, 0);
}

#[test]
fn test_missing_content_never_sends() {
    let result = Dispatcher::new(Config::default()).upload_http(HttpUploadOptions {
        url: Some("http://127.0.0.1:9/upload".to_string()),
        ..Default::default()
    });

    assert_eq!(result.failure_message(), Some("missing required parameter: content"));
}

#[test]
fn test_malformed_url_is_invalid_parameter() {
    let result =
        Dispatcher::new(Config::default()).upload_http(request("not a url".to_string()));

    assert!(result.failure_message().unwrap().contains("url"));
}
