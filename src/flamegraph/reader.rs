//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use serde::Deserialize;
use serde::Serialize;
use tracing::trace;

use crate::db::models::Flamegraph;
use crate::db::models::PageFilter;
use crate::db::DbPool;
use crate::filestore::path::FlamegraphPath;
use crate::filestore::FlamegraphFiles;
use crate::flamegraph::blocking;
use crate::flamegraph::FlamegraphError;
use crate::flamegraph::FlamegraphView;

pub const DEFAULT_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE_SIZE: i64 = 1000;

/// Raw query string of a list request
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListQuery {
    pub cursor: Option<String>,
    pub page_size: Option<String>,
    pub run_id: Option<String>,
    pub run_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListParams {
    pub cursor: Option<i32>,
    pub page_size: i64,
    pub run_id: Option<String>,
    pub run_reason: Option<String>,
}

impl ListQuery {
    pub fn into_params(self, default_page_size: i64) -> Result<ListParams, FlamegraphError> {
        let cursor = match self.cursor.as_deref().map(str::trim) {
            None | Some("") | Some("null") => None,
            Some(c) => Some(c.parse::<i32>().map_err(|_| {
                FlamegraphError::validation(format!("cursor must be a flamegraph id, got '{}'", c))
            })?),
        };

        let page_size = match self.page_size.as_deref().map(str::trim) {
            None => default_page_size,
            Some(s) => s.parse::<i64>().map_err(|_| page_size_error())?,
        };

        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(page_size_error());
        }

        Ok(ListParams {
            cursor,
            page_size,
            run_id: self.run_id.filter(|s| !s.is_empty()),
            run_reason: self.run_reason.filter(|s| !s.is_empty()),
        })
    }
}

fn page_size_error() -> FlamegraphError {
    FlamegraphError::validation(format!("page_size must be a positive integer no greater than {}", MAX_PAGE_SIZE))
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page {
    pub data: Vec<FlamegraphView>,
    pub metadata: PageMetadata,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    pub next_page_cursor: Option<i32>,
}

#[derive(Clone)]
pub struct FlamegraphReader {
    pool: DbPool,
    files: FlamegraphFiles,
}

impl FlamegraphReader {
    pub fn new(pool: DbPool, files: FlamegraphFiles) -> Self {
        FlamegraphReader { pool, files }
    }

    pub async fn get(&self, id: i32) -> Result<FlamegraphView, FlamegraphError> {
        trace!("Loading flamegraph {}", id);
        blocking(&self.pool, move |conn| {
            Flamegraph::with_relations(conn, id)
                .map_err(FlamegraphError::Database)?
                .map(FlamegraphView::from)
                .ok_or(FlamegraphError::NotFound(id))
        })
        .await
    }

    /// One page of flamegraphs, newest first
    pub async fn list(&self, params: ListParams) -> Result<Page, FlamegraphError> {
        let page_size = params.page_size;
        let filter = PageFilter {
            cursor: params.cursor,
            limit: page_size,
            run_id: params.run_id,
            run_reason: params.run_reason,
        };

        let data = blocking(&self.pool, move |conn| {
            Flamegraph::page(conn, &filter).map_err(FlamegraphError::Database)
        })
        .await?
        .into_iter()
        .map(FlamegraphView::from)
        .collect::<Vec<_>>();

        Ok(Page {
            metadata: PageMetadata {
                next_page_cursor: next_page_cursor(&data, page_size),
            },
            data,
        })
    }

    /// Content of the SVG attached to flamegraph `id`
    pub async fn svg(&self, id: i32) -> Result<Vec<u8>, FlamegraphError> {
        let view = self.get(id).await?;
        let path = view
            .file_path
            .as_deref()
            .map(FlamegraphPath::try_from)
            .transpose()
            .map_err(FlamegraphError::Storage)?
            .ok_or(FlamegraphError::NoFile(id))?;

        if !self.files.exists(&path).await {
            return Err(FlamegraphError::NoFile(id));
        }

        self.files.read(&path).await.map_err(FlamegraphError::Storage)
    }
}

/// The cursor for the page after `items`, if `items` filled a whole page
pub fn next_page_cursor(items: &[FlamegraphView], page_size: i64) -> Option<i32> {
    if items.len() as i64 == page_size {
        items.last().map(|v| v.id)
    } else {
        None
    }
}
