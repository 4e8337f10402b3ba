//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use anyhow::Context;
use anyhow::Error;
use anyhow::Result;
use diesel::prelude::*;
use diesel::PgConnection;
use tracing::trace;

use crate::flamegraph::HardwarePayload;
use crate::schema::hardware;
use crate::schema::hardware::*;

#[derive(Clone, Debug, PartialEq, Identifiable, Queryable)]
#[diesel(table_name = hardware)]
pub struct Hardware {
    pub id: i32,
    pub kind: String,
    pub name: String,
    pub hash: String,
    pub info: serde_json::Value,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = hardware)]
struct NewHardware<'a> {
    pub kind: &'a str,
    pub name: &'a str,
    pub hash: &'a str,
    pub info: &'a serde_json::Value,
}

impl Hardware {
    /// Find the row with the content key of `payload`, inserting it first if it does not exist
    pub fn create_or_fetch(database_connection: &mut PgConnection, payload: &HardwarePayload) -> Result<Hardware> {
        let content_hash = payload.hash();
        let content = payload.info();
        let new_hardware = NewHardware {
            kind: payload.kind(),
            name: payload.name(),
            hash: &content_hash,
            info: &content,
        };

        trace!("Resolving hardware: {:?}", new_hardware);
        database_connection.transaction::<_, Error, _>(|conn| {
            diesel::insert_into(hardware::table)
                .values(&new_hardware)
                .on_conflict_do_nothing()
                .execute(conn)?;

            dsl::hardware
                .filter(hash.eq(&content_hash))
                .first::<Hardware>(conn)
                .map_err(Error::from)
        })
    }

    pub fn with_id(database_connection: &mut PgConnection, hardware_id: i32) -> Result<Hardware> {
        dsl::hardware
            .find(hardware_id)
            .first::<_>(database_connection)
            .context("Loading Hardware")
            .map_err(Error::from)
    }
}
