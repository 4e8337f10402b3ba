//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! Resolution of the rows a flamegraph references
//!
//! Both resolvers are get-or-create: identical content always ends up in the same row, also when
//! several requests race to create it.

use std::sync::Arc;

use diesel::PgConnection;
use tracing::debug;
use tracing::trace;

use crate::db::models::Commit;
use crate::db::models::Hardware;
use crate::db::DbPool;
use crate::flamegraph::blocking;
use crate::flamegraph::FlamegraphError;
use crate::flamegraph::HardwarePayload;
use crate::github::CommitMetadata;
use crate::github::CommitMetadataSource;
use crate::util::RepositoryUrl;

/// Find or create the hardware row for `payload`
///
/// Runs on the caller's connection so it can take part in the caller's transaction.
pub fn resolve_hardware(conn: &mut PgConnection, payload: &HardwarePayload) -> Result<Hardware, FlamegraphError> {
    let hardware = Hardware::create_or_fetch(conn, payload).map_err(FlamegraphError::Database)?;
    trace!("Resolved {} '{}' to hardware {}", hardware.kind, hardware.name, hardware.id);
    Ok(hardware)
}

#[derive(Clone)]
pub struct CommitResolver {
    pool: DbPool,
    source: Arc<dyn CommitMetadataSource>,
}

impl CommitResolver {
    pub fn new(pool: DbPool, source: Arc<dyn CommitMetadataSource>) -> Self {
        CommitResolver { pool, source }
    }

    /// Find or create the commit row for `commit_hash` in `repository`
    ///
    /// Without a hash there is nothing to resolve. Unknown commits are looked up at the metadata
    /// source before the row is created.
    pub async fn resolve(
        &self,
        repository: &RepositoryUrl,
        commit_hash: Option<&str>,
    ) -> Result<Option<Commit>, FlamegraphError> {
        let Some(sha) = commit_hash else {
            return Ok(None);
        };

        let existing = {
            let repository = repository.clone();
            let sha = sha.to_string();
            blocking(&self.pool, move |conn| {
                Commit::with_repository_and_sha(conn, &repository, &sha).map_err(FlamegraphError::Database)
            })
            .await?
        };

        if let Some(commit) = existing {
            trace!("Commit {} in {} already known as {}", sha, repository, commit.id);
            return Ok(Some(commit));
        }

        let fetched = self
            .source
            .fetch(repository, sha)
            .await
            .map_err(FlamegraphError::UpstreamLookup)?;

        // Stored under the requested key, the upstream may expand abbreviated hashes
        let metadata = CommitMetadata {
            repository: repository.clone(),
            sha: sha.to_string(),
            ..fetched
        };

        let commit = blocking(&self.pool, move |conn| {
            Commit::create_or_fetch(conn, &metadata).map_err(FlamegraphError::Database)
        })
        .await?;

        debug!("Resolved commit {} in {} to {}", commit.sha, commit.repository, commit.id);
        Ok(Some(commit))
    }
}
