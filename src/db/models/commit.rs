//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use anyhow::Error;
use anyhow::Result;
use chrono::DateTime;
use chrono::Utc;
use diesel::prelude::*;
use diesel::PgConnection;
use tracing::trace;

use crate::github::CommitMetadata;
use crate::schema::commits;
use crate::schema::commits::*;
use crate::util::RepositoryUrl;

#[derive(Clone, Debug, PartialEq, Identifiable, Queryable)]
#[diesel(table_name = commits)]
pub struct Commit {
    pub id: i32,
    pub repository: String,
    pub sha: String,
    pub parent_sha: Option<String>,
    pub message: String,
    pub author_name: String,
    pub author_login: Option<String>,
    pub author_avatar: Option<String>,
    pub committed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = commits)]
struct NewCommit<'a> {
    pub repository: &'a str,
    pub sha: &'a str,
    pub parent_sha: Option<&'a str>,
    pub message: &'a str,
    pub author_name: &'a str,
    pub author_login: Option<&'a str>,
    pub author_avatar: Option<&'a str>,
    pub committed_at: Option<DateTime<Utc>>,
}

impl Commit {
    pub fn with_repository_and_sha(
        database_connection: &mut PgConnection,
        repo: &RepositoryUrl,
        commit_sha: &str,
    ) -> Result<Option<Commit>> {
        dsl::commits
            .filter(repository.eq(repo.as_ref()))
            .filter(sha.eq(commit_sha))
            .first::<Commit>(database_connection)
            .optional()
            .map_err(Error::from)
    }

    pub fn create_or_fetch(database_connection: &mut PgConnection, metadata: &CommitMetadata) -> Result<Commit> {
        let new_commit = NewCommit {
            repository: metadata.repository.as_ref(),
            sha: &metadata.sha,
            parent_sha: metadata.parent_sha.as_deref(),
            message: &metadata.message,
            author_name: &metadata.author_name,
            author_login: metadata.author_login.as_deref(),
            author_avatar: metadata.author_avatar.as_deref(),
            committed_at: metadata.committed_at,
        };

        trace!("Creating Commit in database: {:?}", new_commit);
        database_connection.transaction::<_, Error, _>(|conn| {
            diesel::insert_into(commits::table)
                .values(&new_commit)
                .on_conflict_do_nothing()
                .execute(conn)?;

            dsl::commits
                .filter(repository.eq(metadata.repository.as_ref()))
                .filter(sha.eq(&metadata.sha))
                .first::<Commit>(conn)
                .map_err(Error::from)
        })
    }
}
