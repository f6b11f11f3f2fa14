//! HTTP API tests driving the axum router directly

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use excel2md::server::{router, AppState, ConvertResponse, HealthResponse, ResultResponse};
use excel2md::{ConversionService, ServiceConfigBuilder};
use rust_xlsxwriter::Workbook;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "excel2md-test-boundary";

fn app(dir: &TempDir, max_file_size_mb: u64) -> Router {
    let config = ServiceConfigBuilder::new()
        .with_storage_dir(dir.path())
        .with_max_file_size_mb(max_file_size_mb)
        .with_workers(1)
        .build()
        .unwrap();
    router(AppState::new(ConversionService::new(config).unwrap()))
}

fn workbook_bytes(sheets: &[&str]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    for name in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name).unwrap();
        sheet.write_string(0, 0, "Name").unwrap();
        sheet.write_string(1, 0, *name).unwrap();
    }
    workbook.save_to_buffer().unwrap()
}

fn multipart_body(filename: &str, content: &[u8], fields: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn convert_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/convert")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

async fn submit(app: &Router, filename: &str, content: &[u8], fields: &[(&str, &str)]) -> String {
    let response = app
        .clone()
        .oneshot(convert_request(multipart_body(filename, content, fields)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: ConvertResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body.status, "pending");
    body.task_id
}

async fn wait_for_success(app: &Router, task_id: &str) {
    for _ in 0..500 {
        let response = app
            .clone()
            .oneshot(get(&format!("/api/v1/tasks/{task_id}/status")))
            .await
            .unwrap();
        let status = json(response).await;
        match status["status"].as_str() {
            Some("SUCCESS") => return,
            Some("FAILURE") => panic!("task failed: {}", status["error"]),
            _ => tokio::time::sleep(Duration::from_millis(10)).await,
        }
    }
    panic!("task {task_id} did not finish in time");
}

#[tokio::test]
async fn test_health() {
    let dir = TempDir::new().unwrap();
    let response = app(&dir, 10).oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: HealthResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body.status, "ok");
    assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_convert_and_fetch_result() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir, 10);

    let task_id = submit(&app, "book.xlsx", &workbook_bytes(&["Only"]), &[]).await;
    wait_for_success(&app, &task_id).await;

    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/tasks/{task_id}/result")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let result: ResultResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(result.status, "success");
    assert_eq!(result.original_filename, "book.xlsx");
    assert_eq!(result.sheets.len(), 1);
    assert_eq!(result.sheets[0].sheet_name, "Only");
    assert_eq!(result.sheets[0].content, "|Name|\n|-|\n|Only|");
    assert!(!result.has_archive);

    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/tasks/{task_id}/download")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Only.md\""
    );
    assert_eq!(body_bytes(response).await, b"|Name|\n|-|\n|Only|");
}

#[tokio::test]
async fn test_convert_json_multi_sheet_download_zip() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir, 10);

    let task_id = submit(
        &app,
        "report.xlsx",
        &workbook_bytes(&["First", "Second"]),
        &[("use_headers", "false"), ("output_format", "json")],
    )
    .await;
    wait_for_success(&app, &task_id).await;

    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/tasks/{task_id}/result")))
        .await
        .unwrap();
    let result: ResultResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(result.has_archive);
    let parsed: serde_json::Value = serde_json::from_str(&result.sheets[1].content).unwrap();
    assert_eq!(parsed, serde_json::json!([["Name"], ["Second"]]));

    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/tasks/{task_id}/download")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"report.zip\""
    );
}

#[tokio::test]
async fn test_convert_rejects_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let response = app(&dir, 10)
        .oneshot(convert_request(multipart_body("data.csv", b"a,b", &[])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json(response).await;
    assert!(body["detail"].as_str().unwrap().contains(".csv"));
}

#[tokio::test]
async fn test_convert_rejects_unknown_output_format() {
    let dir = TempDir::new().unwrap();
    let response = app(&dir, 10)
        .oneshot(convert_request(multipart_body(
            "book.xlsx",
            &workbook_bytes(&["S"]),
            &[("output_format", "html")],
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_convert_rejects_oversized_upload() {
    let dir = TempDir::new().unwrap();
    let oversized = vec![0u8; 1024 * 1024 + 1];
    let response = app(&dir, 1)
        .oneshot(convert_request(multipart_body("big.xlsx", &oversized, &[])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_unknown_task_status_and_result() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir, 10);

    let response = app
        .clone()
        .oneshot(get("/api/v1/tasks/unknown/status"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let status = json(response).await;
    assert_eq!(status["status"], "PENDING");
    assert_eq!(status["progress"], 0);
    assert_eq!(status["message"], "Task is pending");

    let response = app
        .clone()
        .oneshot(get("/api/v1/tasks/unknown/result"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = app
        .clone()
        .oneshot(get("/api/v1/tasks/unknown/download"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_removes_task_files() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir, 10);

    let task_id = submit(&app, "book.xlsx", &workbook_bytes(&["S"]), &[]).await;
    wait_for_success(&app, &task_id).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/v1/tasks/{task_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["uploads_removed"], true);
    assert_eq!(body["results_removed"], true);
    assert!(!dir.path().join("uploads").join(&task_id).exists());
}
