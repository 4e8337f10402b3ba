//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use std::sync::Arc;

use diesel::Connection;
use tokio::runtime::Handle;
use tracing::debug;
use tracing::info;
use tracing::warn;
use typed_builder::TypedBuilder;

use crate::db::models::Flamegraph;
use crate::db::models::NewFlamegraph;
use crate::db::DbPool;
use crate::filestore::path::FlamegraphPath;
use crate::filestore::FlamegraphFiles;
use crate::flamegraph::blocking;
use crate::flamegraph::resolve_hardware;
use crate::flamegraph::validate::check_upload;
use crate::flamegraph::validate::FlamegraphCreateRecord;
use crate::flamegraph::validate::UploadedFile;
use crate::flamegraph::CommitResolver;
use crate::flamegraph::FlamegraphError;
use crate::flamegraph::FlamegraphView;
use crate::github::CommitMetadataSource;

/// Owner of all flamegraph writes
///
/// Files are written before the row that references them is committed. A deleted row's file is
/// removed before the delete commits, a replaced file after the new path commits. When the
/// database part fails, a file written by the same call is removed again.
#[derive(Clone, TypedBuilder)]
pub struct FlamegraphStore {
    pool: DbPool,
    files: FlamegraphFiles,
    commit_source: Arc<dyn CommitMetadataSource>,
}

impl FlamegraphStore {
    pub async fn create(&self, record: FlamegraphCreateRecord) -> Result<FlamegraphView, FlamegraphError> {
        let commit = CommitResolver::new(self.pool.clone(), self.commit_source.clone())
            .resolve(&record.repository, record.commit_hash.as_deref())
            .await?;

        let written = match record.file.as_ref() {
            Some(upload) => Some(self.write_file(upload).await?),
            None => None,
        };

        let stored_path = written.as_ref().map(path_to_column).transpose()?;
        let result = blocking(&self.pool, move |conn| {
            conn.transaction::<_, FlamegraphError, _>(|conn| {
                let hardware = resolve_hardware(conn, &record.hardware)?;
                let flamegraph = Flamegraph::create(conn, &NewFlamegraph {
                    name: &record.name,
                    file_path: stored_path.as_deref(),
                    run_id: &record.run_id,
                    run_reason: record.run_reason.as_deref(),
                    commit_repo_url: record.repository.as_ref(),
                    commit_id: commit.as_ref().map(|c| c.id),
                    hardware_id: hardware.id,
                    timestamp: record.timestamp,
                })
                .map_err(FlamegraphError::Database)?;

                Ok(FlamegraphView::new(flamegraph, hardware, commit))
            })
        })
        .await;

        match result {
            Ok(view) => {
                info!("Created flamegraph {} '{}' in run {}", view.id, view.name, view.run_id);
                Ok(view)
            }
            Err(e) => {
                if let Some(path) = written.as_ref() {
                    self.discard(path).await;
                }
                Err(e)
            }
        }
    }

    /// Attach `upload` to flamegraph `id`, replacing a previously attached file
    ///
    /// The replaced file is removed once the new path is committed. If that removal fails the
    /// file stays behind as an orphan for `db sweep`.
    pub async fn attach_file(&self, id: i32, upload: UploadedFile) -> Result<FlamegraphView, FlamegraphError> {
        let upload = check_upload(Some(upload))?;

        blocking(&self.pool, move |conn| {
            Flamegraph::with_id(conn, id)
                .map_err(FlamegraphError::Database)?
                .ok_or(FlamegraphError::NotFound(id))
        })
        .await?;

        let written = self.write_file(&upload).await?;
        let stored_path = path_to_column(&written)?;

        let result = blocking(&self.pool, move |conn| {
            conn.transaction::<_, FlamegraphError, _>(|conn| {
                let flamegraph = Flamegraph::for_update(conn, id)
                    .map_err(FlamegraphError::Database)?
                    .ok_or(FlamegraphError::NotFound(id))?;

                Flamegraph::set_file_path(conn, id, Some(stored_path.as_str())).map_err(FlamegraphError::Database)?;
                let view = Flamegraph::with_relations(conn, id)
                    .map_err(FlamegraphError::Database)?
                    .map(FlamegraphView::from)
                    .ok_or(FlamegraphError::NotFound(id))?;

                Ok((view, flamegraph.file_path))
            })
        })
        .await;

        let (view, replaced) = match result {
            Ok(r) => r,
            Err(e) => {
                self.discard(&written).await;
                return Err(e);
            }
        };

        info!("Attached {} to flamegraph {}", written.display(), id);
        if let Some(old) = replaced {
            debug!("Removing replaced file {} of flamegraph {}", old, id);
            match FlamegraphPath::try_from(old.as_str()) {
                Ok(old) => {
                    if let Err(e) = self.files.remove(&old).await {
                        warn!("Could not remove replaced file {}: {:#}", old.display(), e);
                    }
                }
                Err(e) => warn!("Not removing replaced file '{}': {:#}", old, e),
            }
        }

        Ok(view)
    }

    /// Delete flamegraph `id` together with its file
    ///
    /// If the file cannot be removed, the row is kept.
    pub async fn delete(&self, id: i32) -> Result<(), FlamegraphError> {
        let files = self.files.clone();
        let handle = Handle::current();

        blocking(&self.pool, move |conn| {
            conn.transaction::<_, FlamegraphError, _>(|conn| {
                let flamegraph = Flamegraph::for_update(conn, id)
                    .map_err(FlamegraphError::Database)?
                    .ok_or(FlamegraphError::NotFound(id))?;

                if let Some(path) = flamegraph.file_path.as_deref() {
                    let path = FlamegraphPath::try_from(path).map_err(FlamegraphError::Storage)?;
                    handle.block_on(files.remove(&path)).map_err(FlamegraphError::Storage)?;
                }

                Flamegraph::delete(conn, id).map_err(FlamegraphError::Database)?;
                Ok(())
            })
        })
        .await?;

        info!("Deleted flamegraph {}", id);
        Ok(())
    }

    async fn write_file(&self, upload: &UploadedFile) -> Result<FlamegraphPath, FlamegraphError> {
        self.files
            .write(&upload.filename, &upload.content)
            .await
            .map_err(FlamegraphError::Storage)
    }

    async fn discard(&self, path: &FlamegraphPath) {
        if let Err(e) = self.files.remove(path).await {
            warn!("Could not remove {} after failed write: {:#}", path.display(), e);
        }
    }
}

fn path_to_column(path: &FlamegraphPath) -> Result<String, FlamegraphError> {
    path.to_str()
        .map(String::from)
        .ok_or_else(|| FlamegraphError::Storage(anyhow::anyhow!("Path is not valid UTF-8: {}", path.display())))
}
