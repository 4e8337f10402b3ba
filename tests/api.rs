//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! Router tests
//!
//! Requests that are answered before the database is involved run everywhere, full request flows
//! only when `DATABASE_URL` is set.

use std::sync::Arc;

use axum::body::Body;
use axum::http::header;
use axum::http::HeaderMap;
use axum::http::Request;
use axum::http::StatusCode;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::json;
use serde_json::Value;
use tower::ServiceExt;

mod common;
use common::*;

const BOUNDARY: &str = "flamestore-test-boundary";

fn app(dir: &tempfile::TempDir) -> Router {
    let state = app_state(lazy_pool(), files(dir.path()), Arc::new(StubCommitSource::default()));
    flamestore::api::router(state, 1024 * 1024)
}

fn db_app(dir: &tempfile::TempDir) -> Option<Router> {
    let state = app_state(database_pool()?, files(dir.path()), Arc::new(StubCommitSource::default()));
    Some(flamestore::api::router(state, 1024 * 1024))
}

async fn send_raw(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, bytes.to_vec())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, _, bytes) = send_raw(app, request).await;
    let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn multipart_request(uri: &str, fields: &[(&str, String)], file: Option<(&str, &[u8])>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(multipart_body(BOUNDARY, fields, file)))
        .unwrap()
}

fn create_body() -> Value {
    json!({
        "name": "arrow-compute",
        "run_id": unique_run_id(),
        "run_reason": "commit",
        "timestamp": "2024-02-29 08:00:01 UTC",
        "machine_info": machine_info(),
        "github": {"repository": "https://github.com/apache/arrow", "commit": null}
    })
}

fn form_fields() -> Vec<(&'static str, String)> {
    vec![
        ("name", "arrow-compute".to_string()),
        ("run_id", unique_run_id()),
        ("machine_info", machine_info().to_string()),
        ("github", json!({"repository": "https://github.com/apache/arrow"}).to_string()),
    ]
}

fn assert_error(body: &Value, status: StatusCode, kind: &str) {
    assert_eq!(body["code"], json!(status.as_u16()), "{}", body);
    assert_eq!(body["kind"], json!(kind), "{}", body);
    assert!(body["message"].as_str().map(|m| !m.is_empty()).unwrap_or(false), "{}", body);
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app(&dir), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));
}

#[tokio::test]
async fn test_list_rejects_page_size_out_of_range() {
    let dir = tempfile::tempdir().unwrap();
    for page_size in ["0", "1001", "many"] {
        let request = Request::builder()
            .uri(format!("/flamegraphs?page_size={}", page_size))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(&dir), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "page_size={}", page_size);
        assert_error(&body, StatusCode::BAD_REQUEST, "validation_error");
    }
}

#[tokio::test]
async fn test_create_rejects_both_hardware_payloads() {
    let dir = tempfile::tempdir().unwrap();
    let mut body = create_body();
    body["cluster_info"] = cluster_info("k8s");

    let (status, body) = send(app(&dir), json_request("POST", "/flamegraphs", &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, StatusCode::BAD_REQUEST, "validation_error");
}

#[tokio::test]
async fn test_create_rejects_missing_hardware_payload() {
    let dir = tempfile::tempdir().unwrap();
    let mut body = create_body();
    body.as_object_mut().unwrap().remove("machine_info");

    let (status, body) = send(app(&dir), json_request("POST", "/flamegraphs", &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, StatusCode::BAD_REQUEST, "validation_error");
}

#[tokio::test]
async fn test_create_reports_first_violation() {
    let dir = tempfile::tempdir().unwrap();
    let mut body = create_body();
    body["name"] = json!("");
    body.as_object_mut().unwrap().remove("run_id");

    let (status, body) = send(app(&dir), json_request("POST", "/flamegraphs", &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("name"), "{}", body);
}

#[tokio::test]
async fn test_create_rejects_bad_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let mut body = create_body();
    body["timestamp"] = json!("2024-02-29T08:00:01Z");

    let (status, body) = send(app(&dir), json_request("POST", "/flamegraphs", &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("timestamp"), "{}", body);
}

#[tokio::test]
async fn test_create_rejects_malformed_json() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::builder()
        .method("POST")
        .uri("/flamegraphs")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();

    let (status, body) = send(app(&dir), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, StatusCode::BAD_REQUEST, "validation_error");
}

#[tokio::test]
async fn test_multipart_create_requires_file() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = send(app(&dir), multipart_request("/flamegraphs", &form_fields(), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, StatusCode::BAD_REQUEST, "validation_error");
    assert!(body["message"].as_str().unwrap().contains("missing"), "{}", body);
}

#[tokio::test]
async fn test_multipart_create_rejects_txt() {
    let dir = tempfile::tempdir().unwrap();
    let request = multipart_request("/flamegraphs", &form_fields(), Some(("flame.txt", SVG)));
    let (status, body) = send(app(&dir), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, StatusCode::BAD_REQUEST, "invalid_file");
    assert!(!dir.path().join("flamegraphs").exists());
}

#[tokio::test]
async fn test_attach_rejects_txt_before_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let request = multipart_request("/flamegraphs/1", &[], Some(("flame.txt", b"not a flamegraph")));
    let (status, body) = send(app(&dir), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, StatusCode::BAD_REQUEST, "invalid_file");
}

#[tokio::test]
async fn test_attach_requires_file() {
    let dir = tempfile::tempdir().unwrap();
    let request = multipart_request("/flamegraphs/1", &[("name", "x".to_string())], None);
    let (status, body) = send(app(&dir), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, StatusCode::BAD_REQUEST, "validation_error");

    let (status, _) = send(app(&dir), json_request("POST", "/flamegraphs/1", &json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_attach_rejects_empty_filename() {
    let dir = tempfile::tempdir().unwrap();
    let request = multipart_request("/flamegraphs/1", &[], Some(("", SVG)));
    let (status, body) = send(app(&dir), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, StatusCode::BAD_REQUEST, "validation_error");
}

#[tokio::test]
async fn test_non_numeric_id() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::builder().uri("/flamegraphs/abc").body(Body::empty()).unwrap();
    let (status, body) = send(app(&dir), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, StatusCode::BAD_REQUEST, "validation_error");
}

#[tokio::test]
async fn test_body_limit() {
    let dir = tempfile::tempdir().unwrap();
    let huge = vec![b'a'; 2 * 1024 * 1024];
    let request = multipart_request("/flamegraphs", &form_fields(), Some(("flame.svg", &huge)));
    let (status, _) = send(app(&dir), request).await;
    assert!(status.is_client_error(), "{}", status);
    assert!(!dir.path().join("flamegraphs").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_json_create_get_delete() {
    let dir = tempfile::tempdir().unwrap();
    let Some(app) = db_app(&dir) else { return };

    let (status, created) = send(app.clone(), json_request("POST", "/flamegraphs", &create_body())).await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["name"], json!("arrow-compute"));
    assert_eq!(created["file_path"], Value::Null);
    assert_eq!(created["commit_repo_url"], json!("https://github.com/apache/arrow"));
    assert_eq!(created["hardware"]["type"], json!("machine"));
    let uri = format!("/flamegraphs/{}", created["id"]);

    let (status, fetched) = send(app.clone(), empty_request("GET", &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, _, body) = send_raw(app.clone(), empty_request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let (status, body) = send(app.clone(), empty_request("GET", &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, StatusCode::NOT_FOUND, "not_found");

    let (status, _) = send(app, empty_request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_multipart_create_attach_and_serve_svg() {
    let dir = tempfile::tempdir().unwrap();
    let Some(app) = db_app(&dir) else { return };

    let request = multipart_request("/flamegraphs", &form_fields(), Some(("first.svg", SVG)));
    let (status, created) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    let first = created["file_path"].as_str().unwrap().to_string();
    assert!(dir.path().join(&first).is_file());
    let uri = format!("/flamegraphs/{}", created["id"]);

    let replacement: &[u8] = b"<svg xmlns=\"http://www.w3.org/2000/svg\"><g/></svg>";
    let request = multipart_request(&uri, &[], Some(("second.svg", replacement)));
    let (status, attached) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::CREATED, "{}", attached);
    let second = attached["file_path"].as_str().unwrap().to_string();
    assert_ne!(first, second);
    assert!(!dir.path().join(&first).exists());

    let (status, headers, body) = send_raw(app, empty_request("GET", &format!("{}/svg", uri))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/svg+xml");
    assert_eq!(body, replacement);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_svg_without_file() {
    let dir = tempfile::tempdir().unwrap();
    let Some(app) = db_app(&dir) else { return };

    let (_, created) = send(app.clone(), json_request("POST", "/flamegraphs", &create_body())).await;
    let (status, body) = send(app, empty_request("GET", &format!("/flamegraphs/{}/svg", created["id"]))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, StatusCode::NOT_FOUND, "not_found");
    assert!(body["message"].as_str().unwrap().contains("no SVG file"), "{}", body);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_envelope_and_cursor() {
    let dir = tempfile::tempdir().unwrap();
    let Some(app) = db_app(&dir) else { return };

    let run_id = unique_run_id();
    let mut ids = Vec::new();
    for _ in 0..3 {
        let mut body = create_body();
        body["run_id"] = json!(run_id);
        let (status, created) = send(app.clone(), json_request("POST", "/flamegraphs", &body)).await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(created["id"].clone());
    }
    ids.reverse();

    let uri = format!("/flamegraphs?run_id={}&page_size=2&cursor=null", run_id);
    let (status, page) = send(app.clone(), empty_request("GET", &uri)).await;
    assert_eq!(status, StatusCode::OK);
    let data = page["data"].as_array().unwrap();
    assert_eq!(data.iter().map(|v| v["id"].clone()).collect::<Vec<_>>(), ids[0..2]);
    assert_eq!(page["metadata"]["next_page_cursor"], ids[1]);

    let uri = format!("/flamegraphs?run_id={}&page_size=2&cursor={}", run_id, ids[1]);
    let (status, page) = send(app, empty_request("GET", &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"].as_array().unwrap().len(), 1);
    assert_eq!(page["data"][0]["id"], ids[2]);
    assert_eq!(page["metadata"], json!({"next_page_cursor": null}));
}

