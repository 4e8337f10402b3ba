//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! HTTP interface

use axum::extract::DefaultBodyLimit;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tracing::debug;
use tracing::trace;
use typed_builder::TypedBuilder;

use crate::flamegraph::FlamegraphReader;
use crate::flamegraph::FlamegraphStore;

mod error;
pub use error::*;

mod flamegraphs;

#[derive(Clone, TypedBuilder)]
pub struct AppState {
    store: FlamegraphStore,
    reader: FlamegraphReader,
    page_size_default: i64,
}

pub fn router(state: AppState, max_upload_size: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/flamegraphs", get(flamegraphs::list).post(flamegraphs::create))
        .route(
            "/flamegraphs/{id}",
            get(flamegraphs::get).post(flamegraphs::attach).delete(flamegraphs::delete),
        )
        .route("/flamegraphs/{id}/svg", get(flamegraphs::svg))
        .layer(DefaultBodyLimit::max(max_upload_size))
        .layer(axum::middleware::from_fn(log_request))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    "ok"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    debug!("{} {}", method, path);

    let response = next.run(request).await;
    trace!("{} {} -> {}", method, path, response.status());
    response
}
