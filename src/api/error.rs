//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use tracing::error;
use tracing::warn;

use crate::flamegraph::FlamegraphError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub kind: &'static str,
    pub message: String,
}

pub fn status_of(e: &FlamegraphError) -> StatusCode {
    match e {
        FlamegraphError::Validation(_) => StatusCode::BAD_REQUEST,
        FlamegraphError::NotFound(_) | FlamegraphError::NoFile(_) => StatusCode::NOT_FOUND,
        FlamegraphError::InvalidFile(_) => StatusCode::BAD_REQUEST,
        FlamegraphError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        FlamegraphError::UpstreamLookup(_) => StatusCode::BAD_GATEWAY,
        FlamegraphError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for FlamegraphError {
    fn into_response(self) -> Response {
        let status = status_of(&self);
        if status.is_server_error() {
            error!("{}: {}", self.kind(), self);
        } else {
            warn!("{}: {}", self.kind(), self);
        }

        let body = ErrorBody {
            code: status.as_u16(),
            kind: self.kind(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
