//! Integration tests for vista-web
//!
//! Tests end-to-end flows including:
//! - Loading a report bundle from disk
//! - Byte-exact attachment downloads with exact filenames
//! - Attachment previews
//! - Page identity, icon assets and the HTML shell

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt;
use vista_web::{Config, create_app};

/// Write a report bundle next to a file-backed attachment
fn write_report(dir: &Path) -> std::path::PathBuf {
    std::fs::write(dir.join("trace.log"), b"line one\r\nline two\n").unwrap();

    let bundle = serde_json::json!({
        "projectNames": ["chromium"],
        "run": 0,
        "anchor": "",
        "test": {
            "testId": "testid",
            "title": "My test",
            "projectName": "chromium",
            "location": { "file": "test.spec.ts", "line": 42, "column": 0 },
            "annotations": [
                { "type": "annotation", "description": "Annotation text" },
                { "type": "_annotation", "description": "Hidden annotation" }
            ],
            "outcome": "expected",
            "duration": 10,
            "ok": true,
            "results": [{
                "retry": 0,
                "startTime": "Thu, 01 Jan 1970 00:00:00 GMT",
                "duration": 100,
                "status": "passed",
                "errors": [],
                "attachments": [
                    { "name": "note", "body": "text42" },
                    { "name": "data", "contentType": "application/octet-stream", "bodyBase64": "AQID" },
                    { "name": "🎭", "contentType": "text/plain", "body": "masks" },
                    { "name": "trace", "contentType": "text/plain", "path": "trace.log" },
                    { "name": "stale", "contentType": "text/plain", "path": "gone.log" }
                ],
                "steps": [{
                    "title": "Outer step",
                    "startTime": "Thu, 01 Jan 1970 00:00:00 GMT",
                    "duration": 10,
                    "steps": [{
                        "title": "Inner step",
                        "startTime": "Thu, 01 Jan 1970 00:00:00 GMT",
                        "duration": 10,
                        "steps": []
                    }]
                }]
            }]
        }
    });

    let path = dir.join("report.json");
    std::fs::write(&path, serde_json::to_vec_pretty(&bundle).unwrap()).unwrap();
    path
}

/// Create a test server for a report in `temp_dir`
fn create_test_server(temp_dir: &TempDir) -> axum::Router {
    let config = Config {
        report_path: Some(write_report(temp_dir.path())),
        ..Config::default()
    };
    create_app(&config).unwrap()
}

async fn get(app: axum::Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

fn header_str<'a>(response: &'a Response, name: header::HeaderName) -> &'a str {
    response.headers().get(name).unwrap().to_str().unwrap()
}

// ==================== Download Tests ====================

#[tokio::test]
async fn test_text_attachment_download() {
    let temp = TempDir::new().unwrap();
    let response = get(create_test_server(&temp), "/api/results/0/attachments/note").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_TYPE), "text/plain");
    assert_eq!(
        header_str(&response, header::CONTENT_DISPOSITION),
        "attachment; filename=\"note\""
    );
    assert_eq!(body_bytes(response).await, b"text42");
}

#[tokio::test]
async fn test_binary_attachment_download() {
    let temp = TempDir::new().unwrap();
    let response = get(create_test_server(&temp), "/api/results/0/attachments/data").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_str(&response, header::CONTENT_TYPE),
        "application/octet-stream"
    );
    assert_eq!(body_bytes(response).await, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_download_by_index() {
    let temp = TempDir::new().unwrap();
    let response = get(create_test_server(&temp), "/api/results/0/attachment-index/1").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_non_ascii_filename_round_trips() {
    let temp = TempDir::new().unwrap();
    let uri = format!("/api/results/0/attachments/{}", urlencoding::encode("🎭"));
    let response = get(create_test_server(&temp), &uri).await;

    assert_eq!(response.status(), StatusCode::OK);
    let disposition = header_str(&response, header::CONTENT_DISPOSITION).to_string();
    let encoded = disposition
        .split("filename*=UTF-8''")
        .nth(1)
        .expect("filename* parameter");
    assert_eq!(urlencoding::decode(encoded).unwrap(), "🎭");
    assert_eq!(body_bytes(response).await, b"masks");
}

#[tokio::test]
async fn test_file_attachment_streams_exact_bytes() {
    let temp = TempDir::new().unwrap();
    let response = get(create_test_server(&temp), "/api/results/0/attachments/trace").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), "19");
    assert_eq!(body_bytes(response).await, b"line one\r\nline two\n");
}

#[tokio::test]
async fn test_stale_file_reference_is_not_found() {
    let temp = TempDir::new().unwrap();
    let response = get(create_test_server(&temp), "/api/results/0/attachments/stale").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(json["error"].as_str().unwrap().contains("gone.log"));
}

#[tokio::test]
async fn test_unknown_attachment_and_result_are_not_found() {
    let temp = TempDir::new().unwrap();
    let app = create_test_server(&temp);

    for uri in [
        "/api/results/0/attachments/missing",
        "/api/results/4/attachments/note",
        "/api/results/0/attachment-index/99",
    ] {
        let response = get(app.clone(), uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

// ==================== Preview Tests ====================

#[tokio::test]
async fn test_text_preview_is_bounded() {
    let temp = TempDir::new().unwrap();
    let response = get(
        create_test_server(&temp),
        "/api/results/0/attachments/trace?preview=8",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["name"], "trace");
    assert_eq!(json["preview"]["kind"], "text");
    assert_eq!(json["preview"]["text"], "line one");
    assert_eq!(json["preview"]["truncated"], true);
}

#[tokio::test]
async fn test_largest_preview_limit_reads_whole_file() {
    let temp = TempDir::new().unwrap();
    let uri = format!("/api/results/0/attachments/trace?preview={}", usize::MAX);
    let response = get(create_test_server(&temp), &uri).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["preview"]["text"], "line one\r\nline two\n");
    assert_eq!(json["preview"]["truncated"], false);
}

#[tokio::test]
async fn test_binary_preview_is_unavailable() {
    let temp = TempDir::new().unwrap();
    let response = get(
        create_test_server(&temp),
        "/api/results/0/attachments/data?preview=1024",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["preview"]["kind"], "unavailable");
}

// ==================== View Tests ====================

#[tokio::test]
async fn test_view_isolates_stale_attachment() {
    let temp = TempDir::new().unwrap();
    let app = create_test_server(&temp);

    let stale = get(app.clone(), "/api/view?anchor=attachment-4").await;
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(stale).await).unwrap();
    assert_eq!(json["attachments"][4]["state"], "unavailable");
    assert_eq!(json["attachments"][0]["state"], "hidden");
    assert_eq!(json["header"]["title"], "My test");

    let binary = get(app, "/api/view?anchor=attachment-1").await;
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(binary).await).unwrap();
    assert_eq!(json["attachments"][1]["placeholder"], "no preview available");
}

#[tokio::test]
async fn test_view_step_anchor() {
    let temp = TempDir::new().unwrap();
    let response = get(create_test_server(&temp), "/api/view?anchor=step-0.0").await;

    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    let titles: Vec<&str> = json["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Outer step", "Inner step"]);
}

// ==================== Shell and Asset Tests ====================

#[tokio::test]
async fn test_shell_title_and_icon() {
    let temp = TempDir::new().unwrap();
    let response = get(create_test_server(&temp), "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("<title>| My test</title>"));
    assert!(html.contains("/assets/logo_expected.svg"));
}

#[tokio::test]
async fn test_summary_shell_without_report() {
    let app = create_app(&Config::default()).unwrap();
    let response = get(app, "/").await;

    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("<title>Playwright Test Report | Summary</title>"));
    assert!(html.contains("/assets/logo_default.svg"));
}

#[tokio::test]
async fn test_icon_assets() {
    let app = create_app(&Config::default()).unwrap();

    for key in ["expected", "unexpected", "flaky", "skipped", "default"] {
        let response = get(app.clone(), &format!("/assets/logo_{key}.svg")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header_str(&response, header::CONTENT_TYPE), "image/svg+xml");
    }

    let response = get(app, "/assets/logo_passed.svg").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_static_dir_fallback() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("app.js"), "console.log('vista');").unwrap();
    let config = Config {
        static_dir: Some(temp.path().to_path_buf()),
        ..Config::default()
    };

    let response = get(create_app(&config).unwrap(), "/app.js").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"console.log('vista');");
}
