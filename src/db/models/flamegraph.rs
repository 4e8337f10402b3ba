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

use crate::db::models::Commit;
use crate::db::models::Hardware;
use crate::schema;
use crate::schema::flamegraphs;
use crate::schema::flamegraphs::*;

#[derive(Clone, Debug, PartialEq, Identifiable, Queryable, Associations)]
#[diesel(belongs_to(Commit))]
#[diesel(belongs_to(Hardware))]
#[diesel(table_name = flamegraphs)]
pub struct Flamegraph {
    pub id: i32,
    pub name: String,
    pub file_path: Option<String>,
    pub run_id: String,
    pub run_reason: Option<String>,
    pub commit_repo_url: String,
    pub commit_id: Option<i32>,
    pub hardware_id: i32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = flamegraphs)]
pub struct NewFlamegraph<'a> {
    pub name: &'a str,
    pub file_path: Option<&'a str>,
    pub run_id: &'a str,
    pub run_reason: Option<&'a str>,
    pub commit_repo_url: &'a str,
    pub commit_id: Option<i32>,
    pub hardware_id: i32,
    pub timestamp: DateTime<Utc>,
}

/// A flamegraph row together with the rows it references
pub type FlamegraphRow = (Flamegraph, Hardware, Option<Commit>);

/// Selection of a page of flamegraphs, newest first
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageFilter {
    /// Only rows with an id below this one
    pub cursor: Option<i32>,
    pub limit: i64,
    pub run_id: Option<String>,
    pub run_reason: Option<String>,
}

impl Flamegraph {
    pub fn create(database_connection: &mut PgConnection, new_flamegraph: &NewFlamegraph<'_>) -> Result<Flamegraph> {
        trace!("Creating Flamegraph in database: {:?}", new_flamegraph);
        diesel::insert_into(flamegraphs::table)
            .values(new_flamegraph)
            .get_result::<Flamegraph>(database_connection)
            .map_err(Error::from)
    }

    pub fn with_id(database_connection: &mut PgConnection, flamegraph_id: i32) -> Result<Option<Flamegraph>> {
        dsl::flamegraphs
            .find(flamegraph_id)
            .first::<Flamegraph>(database_connection)
            .optional()
            .map_err(Error::from)
    }

    /// Load a row and lock it until the surrounding transaction ends
    pub fn for_update(database_connection: &mut PgConnection, flamegraph_id: i32) -> Result<Option<Flamegraph>> {
        dsl::flamegraphs
            .find(flamegraph_id)
            .for_update()
            .first::<Flamegraph>(database_connection)
            .optional()
            .map_err(Error::from)
    }

    pub fn set_file_path(database_connection: &mut PgConnection, flamegraph_id: i32, path: Option<&str>) -> Result<Flamegraph> {
        diesel::update(dsl::flamegraphs.find(flamegraph_id))
            .set(file_path.eq(path))
            .get_result::<Flamegraph>(database_connection)
            .map_err(Error::from)
    }

    pub fn delete(database_connection: &mut PgConnection, flamegraph_id: i32) -> Result<usize> {
        diesel::delete(dsl::flamegraphs.find(flamegraph_id))
            .execute(database_connection)
            .map_err(Error::from)
    }

    pub fn with_relations(database_connection: &mut PgConnection, flamegraph_id: i32) -> Result<Option<FlamegraphRow>> {
        dsl::flamegraphs
            .inner_join(schema::hardware::table)
            .left_join(schema::commits::table)
            .filter(id.eq(flamegraph_id))
            .first::<FlamegraphRow>(database_connection)
            .optional()
            .map_err(Error::from)
    }

    pub fn page(database_connection: &mut PgConnection, filter: &PageFilter) -> Result<Vec<FlamegraphRow>> {
        let mut query = dsl::flamegraphs
            .inner_join(schema::hardware::table)
            .left_join(schema::commits::table)
            .into_boxed();

        if let Some(cursor) = filter.cursor {
            query = query.filter(id.lt(cursor));
        }

        if let Some(run) = filter.run_id.as_ref() {
            query = query.filter(run_id.eq(run));
        }

        if let Some(reason) = filter.run_reason.as_ref() {
            query = query.filter(run_reason.eq(reason));
        }

        trace!("Loading flamegraph page: {:?}", filter);
        query
            .order_by(id.desc())
            .limit(filter.limit)
            .load::<FlamegraphRow>(database_connection)
            .map_err(Error::from)
    }

    /// All recorded file paths
    pub fn file_paths(database_connection: &mut PgConnection) -> Result<Vec<String>> {
        dsl::flamegraphs
            .select(file_path)
            .filter(file_path.is_not_null())
            .load::<Option<String>>(database_connection)
            .map(|paths| paths.into_iter().flatten().collect())
            .map_err(Error::from)
    }
}
