//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use axum::body::Bytes;
use axum::extract::FromRequest;
use axum::extract::Multipart;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use crate::api::AppState;
use crate::flamegraph::validate::check_upload;
use crate::flamegraph::validate::validate;
use crate::flamegraph::validate::CreateRequest;
use crate::flamegraph::validate::RequestFile;
use crate::flamegraph::validate::UploadedFile;
use crate::flamegraph::FlamegraphError;
use crate::flamegraph::FlamegraphView;
use crate::flamegraph::ListQuery;
use crate::flamegraph::Page;

const FILE_FIELD: &str = "file";

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page>, FlamegraphError> {
    let params = query.into_params(state.page_size_default)?;
    state.reader.list(params).await.map(Json)
}

pub async fn create(
    State(state): State<AppState>,
    request: Request,
) -> Result<(StatusCode, Json<FlamegraphView>), FlamegraphError> {
    let (create_request, file) = if is_multipart(request.headers()) {
        let form = read_form(Multipart::from_request(request, &state).await.map_err(rejection)?).await?;
        (form.request, RequestFile::Multipart(form.file))
    } else {
        let body = Bytes::from_request(request, &state).await.map_err(rejection)?;
        let create_request = serde_json::from_slice::<CreateRequest>(&body)
            .map_err(|e| FlamegraphError::validation(format!("Invalid JSON body: {}", e)))?;
        (create_request, RequestFile::NotApplicable)
    };

    let record = validate(create_request, file, Utc::now())?;
    let view = state.store.create(record).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FlamegraphView>, FlamegraphError> {
    state.reader.get(parse_id(&id)?).await.map(Json)
}

pub async fn attach(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Request,
) -> Result<(StatusCode, Json<FlamegraphView>), FlamegraphError> {
    let id = parse_id(&id)?;
    if !is_multipart(request.headers()) {
        return Err(FlamegraphError::validation("Flamegraph file is missing"));
    }

    let form = read_form(Multipart::from_request(request, &state).await.map_err(rejection)?).await?;
    let upload = check_upload(form.file)?;
    let view = state.store.attach_file(id, upload).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, FlamegraphError> {
    state.store.delete(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn svg(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, FlamegraphError> {
    let content = state.reader.svg(parse_id(&id)?).await?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], content))
}

fn parse_id(raw: &str) -> Result<i32, FlamegraphError> {
    raw.parse::<i32>()
        .map_err(|_| FlamegraphError::validation(format!("Not a flamegraph id: '{}'", raw)))
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

fn rejection<R: std::fmt::Display>(r: R) -> FlamegraphError {
    FlamegraphError::validation(r.to_string())
}

#[derive(Debug, Default)]
struct Form {
    request: CreateRequest,
    file: Option<UploadedFile>,
}

/// Collect the create request fields and the uploaded file of a multipart form
///
/// `machine_info`, `cluster_info` and `github` carry JSON documents, all other fields are plain
/// text. Unknown fields are ignored.
async fn read_form(mut multipart: Multipart) -> Result<Form, FlamegraphError> {
    let mut form = Form::default();

    while let Some(field) = multipart.next_field().await.map_err(rejection)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FILE_FIELD => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content = field.bytes().await.map_err(rejection)?.to_vec();
                debug!("Received file '{}' with {} bytes", filename, content.len());
                form.file = Some(UploadedFile { filename, content });
            }
            "name" => form.request.name = Some(field.text().await.map_err(rejection)?),
            "run_id" => form.request.run_id = Some(field.text().await.map_err(rejection)?),
            "run_reason" => form.request.run_reason = Some(field.text().await.map_err(rejection)?),
            "timestamp" => form.request.timestamp = Some(field.text().await.map_err(rejection)?),
            "machine_info" => form.request.machine_info = Some(json_field(&name, field.text().await.map_err(rejection)?)?),
            "cluster_info" => form.request.cluster_info = Some(json_field(&name, field.text().await.map_err(rejection)?)?),
            "github" => {
                let value = json_field(&name, field.text().await.map_err(rejection)?)?;
                form.request.github = Some(serde_json::from_value(value).map_err(|e| {
                    FlamegraphError::validation(format!("Field 'github' is malformed: {}", e))
                })?);
            }
            other => debug!("Ignoring multipart field '{}'", other),
        }
    }

    Ok(form)
}

fn json_field(name: &str, text: String) -> Result<Value, FlamegraphError> {
    serde_json::from_str(&text)
        .map_err(|e| FlamegraphError::validation(format!("Field '{}' must be a JSON document: {}", name, e)))
}
