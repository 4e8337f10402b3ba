//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use std::collections::HashSet;
use std::time::Duration;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use clap::ArgMatches;
use itertools::Itertools;
use tracing::info;

use crate::commands::listing::write_listing;
use crate::commands::listing::ListingFormat;
use crate::commands::listing::ListingRow;
use crate::config::Configuration;
use crate::db::models;
use crate::db::DbConnectionConfig;
use crate::filestore::path::FlamegraphPath;
use crate::filestore::path::StoreRoot;
use crate::filestore::FlamegraphFiles;

pub async fn db(db_connection_config: DbConnectionConfig<'_>, config: &Configuration, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("migrate", _))            => migrate(db_connection_config).await,
        Some(("flamegraphs", matches))  => flamegraphs(db_connection_config, matches).await,
        Some(("sweep", matches))        => sweep(db_connection_config, config, matches).await,
        Some((other, _)) => Err(anyhow!("Unknown subcommand: {}", other)),
        None             => Err(anyhow!("No subcommand")),
    }
}

async fn migrate(conn_cfg: DbConnectionConfig<'_>) -> Result<()> {
    let pool = conn_cfg.establish_pool()?;
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut conn = pool.get()?;
        crate::db::run_migrations(&mut conn)
    })
    .await?
}

async fn flamegraphs(conn_cfg: DbConnectionConfig<'_>, matches: &ArgMatches) -> Result<()> {
    let format = ListingFormat::for_stdout(matches.get_flag("csv"));
    let filter = models::PageFilter {
        cursor: None,
        limit: matches.get_one::<i64>("limit").copied().unwrap_or(100),
        run_id: matches.get_one::<String>("run_id").cloned(),
        run_reason: matches.get_one::<String>("run_reason").cloned(),
    };

    let pool = conn_cfg.establish_pool()?;
    let rows = tokio::task::spawn_blocking(move || -> Result<_> {
        let mut conn = pool.get()?;
        models::Flamegraph::page(&mut conn, &filter)
    })
    .await??
    .into_iter()
    .map(ListingRow::from)
    .collect::<Vec<_>>();

    if rows.is_empty() {
        info!("No flamegraphs in database");
        return Ok(());
    }

    let out = std::io::stdout();
    let mut lock = out.lock();
    write_listing(&mut lock, &rows, format)
}

async fn sweep(conn_cfg: DbConnectionConfig<'_>, config: &Configuration, matches: &ArgMatches) -> Result<()> {
    let dry_run = matches.get_flag("dry_run");
    let min_age = matches
        .get_one::<Duration>("min_age")
        .copied()
        .ok_or_else(|| anyhow!("No minimum age given"))?;

    let pool = conn_cfg.establish_pool()?;
    let recorded = tokio::task::spawn_blocking(move || -> Result<_> {
        let mut conn = pool.get()?;
        models::Flamegraph::file_paths(&mut conn)
    })
    .await??;
    let referenced = referenced_paths(&recorded)?;

    let files = FlamegraphFiles::new(StoreRoot::new(config.upload_root().clone())?, *config.file_io_timeout());
    let orphans = files.sweep(&referenced, min_age, dry_run).await?;

    if orphans.is_empty() {
        info!("No orphaned flamegraph files");
        return Ok(());
    }

    let listing = orphans.iter().map(|p| p.display().to_string()).join("\n");
    if dry_run {
        info!("{} orphaned files would be removed:\n{}", orphans.len(), listing);
    } else {
        info!("Removed {} orphaned files:\n{}", orphans.len(), listing);
    }

    Ok(())
}

/// Parse the recorded file paths
///
/// A single unusable path fails the whole set.
fn referenced_paths(recorded: &[String]) -> Result<HashSet<FlamegraphPath>> {
    recorded
        .iter()
        .map(|p| {
            FlamegraphPath::try_from(p.as_str())
                .with_context(|| anyhow!("Recorded path '{}' is unusable, not sweeping", p))
        })
        .collect()
}
