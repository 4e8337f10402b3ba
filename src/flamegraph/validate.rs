//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! Validation of flamegraph create requests
//!
//! Validation is pure: it only turns a raw request into a [`FlamegraphCreateRecord`] or reports
//! the first constraint the request violates. Resolving hardware and commit rows happens later,
//! when the record is persisted.

use std::path::Path;

use chrono::DateTime;
use chrono::NaiveDateTime;
use chrono::Timelike;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use crate::flamegraph::FlamegraphError;
use crate::flamegraph::HardwarePayload;
use crate::util::RepositoryUrl;

/// Format of the `timestamp` field, always UTC
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Extensions (lowercase, without dot) an uploaded flamegraph may carry
pub const ALLOWED_EXTENSIONS: &[&str] = &["svg"];

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CreateRequest {
    pub name: Option<String>,
    pub run_id: Option<String>,
    pub run_reason: Option<String>,
    pub timestamp: Option<String>,
    pub machine_info: Option<Value>,
    pub cluster_info: Option<Value>,
    pub github: Option<GitHubInfo>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GitHubInfo {
    pub repository: Option<String>,
    pub commit: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    pub content: Vec<u8>,
}

/// Whether a file is part of the request format
#[derive(Clone, Debug)]
pub enum RequestFile {
    /// The request format carries no file (JSON body)
    NotApplicable,

    /// A multipart request, `None` if it had no `file` field
    Multipart(Option<UploadedFile>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlamegraphCreateRecord {
    pub name: String,
    pub run_id: String,
    pub run_reason: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub hardware: HardwarePayload,
    pub repository: RepositoryUrl,
    pub commit_hash: Option<String>,
    pub file: Option<UploadedFile>,
}

pub fn validate(
    req: CreateRequest,
    file: RequestFile,
    now: DateTime<Utc>,
) -> Result<FlamegraphCreateRecord, FlamegraphError> {
    let name = non_empty(req.name)
        .ok_or_else(|| FlamegraphError::validation("Field 'name' is required and must not be empty"))?;

    let run_id = non_empty(req.run_id)
        .ok_or_else(|| FlamegraphError::validation("Field 'run_id' is required"))?;

    let hardware = HardwarePayload::from_raw(req.machine_info, req.cluster_info)?;

    let github = req
        .github
        .ok_or_else(|| FlamegraphError::validation("Field 'github' is required"))?;
    let commit_hash = non_empty(github.commit);
    let repository = github
        .repository
        .as_deref()
        .map(RepositoryUrl::from)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| {
            if commit_hash.is_some() {
                FlamegraphError::validation("'github.repository' must be a non-empty string when 'github.commit' is set")
            } else {
                FlamegraphError::validation("'github.repository' must be a non-empty string")
            }
        })?;

    let timestamp = match req.timestamp {
        None => default_timestamp(now),
        Some(ts) => parse_timestamp(&ts)?,
    };

    let file = match file {
        RequestFile::NotApplicable => None,
        RequestFile::Multipart(upload) => Some(check_upload(upload)?),
    };

    Ok(FlamegraphCreateRecord {
        name,
        run_id,
        run_reason: non_empty(req.run_reason),
        timestamp,
        hardware,
        repository,
        commit_hash,
        file,
    })
}

/// Check that an uploaded file is present and looks like a flamegraph
pub fn check_upload(upload: Option<UploadedFile>) -> Result<UploadedFile, FlamegraphError> {
    let upload = upload.ok_or_else(|| FlamegraphError::validation("Flamegraph file is missing"))?;

    if upload.filename.trim().is_empty() {
        return Err(FlamegraphError::validation("Flamegraph file is missing"));
    }

    if !is_allowed_filename(&upload.filename) {
        return Err(FlamegraphError::invalid_file(format!(
            "File format must be one of {}: '{}'",
            ALLOWED_EXTENSIONS.join(", "),
            upload.filename
        )));
    }

    if upload.content.is_empty() {
        return Err(FlamegraphError::invalid_file(format!("File is empty: '{}'", upload.filename)));
    }

    Ok(upload)
}

pub fn is_allowed_filename(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, FlamegraphError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| {
            FlamegraphError::validation(format!(
                "Field 'timestamp' must have the format 'YYYY-MM-DD HH:MM:SS UTC', got '{s}': {e}"
            ))
        })
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

// The wire format has second precision
fn default_timestamp(now: DateTime<Utc>) -> DateTime<Utc> {
    now.with_nanosecond(0).unwrap_or(now)
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
