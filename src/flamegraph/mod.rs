//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! The flamegraph entity: validation, persistence and read access
//!
//! Requests pass the [validator](validate) first. The [`FlamegraphStore`] owns every write,
//! keeping the database row and the stored SVG file consistent. The [`FlamegraphReader`] serves
//! single rows and pages of rows.

use diesel::PgConnection;

use crate::db::DbPool;

mod error;
pub use error::*;

mod hardware;
pub use hardware::*;

mod reader;
pub use reader::*;

mod resolve;
pub use resolve::*;

mod store;
pub use store::*;

pub mod validate;

mod view;
pub use view::*;

/// Run `f` with a pooled connection on the blocking thread pool
pub(crate) async fn blocking<F, T>(pool: &DbPool, f: F) -> Result<T, FlamegraphError>
where
    F: FnOnce(&mut PgConnection) -> Result<T, FlamegraphError> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        f(&mut conn)
    })
    .await?
}
