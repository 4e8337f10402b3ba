//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use clap::ArgMatches;
use tokio::net::TcpListener;
use tracing::info;

use crate::api::AppState;
use crate::config::Configuration;
use crate::db::DbConnectionConfig;
use crate::filestore::path::StoreRoot;
use crate::filestore::FlamegraphFiles;
use crate::flamegraph::FlamegraphReader;
use crate::flamegraph::FlamegraphStore;
use crate::github::GitHubClient;

pub async fn serve(db_connection_config: DbConnectionConfig<'_>, config: &Configuration, matches: &ArgMatches) -> Result<()> {
    let pool = db_connection_config.establish_pool()?;

    if !matches.get_flag("no_migrate") {
        let pool = pool.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut conn = pool.get()?;
            crate::db::run_migrations(&mut conn)
        })
        .await??;
    }

    let files = FlamegraphFiles::new(StoreRoot::new(config.upload_root().clone())?, *config.file_io_timeout());
    let github = GitHubClient::new(
        config.github().api_base().clone(),
        config.github().token().clone(),
        *config.github_timeout(),
    )?;

    let state = AppState::builder()
        .store(
            FlamegraphStore::builder()
                .pool(pool.clone())
                .files(files.clone())
                .commit_source(Arc::new(github))
                .build(),
        )
        .reader(FlamegraphReader::new(pool, files))
        .page_size_default(config.page_size_default())
        .build();

    let listen = matches
        .get_one::<SocketAddr>("listen")
        .copied()
        .unwrap_or_else(|| config.listen());

    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| anyhow!("Binding {}", listen))?;

    info!("Serving flamegraphs from {} on http://{}", config.upload_root().display(), listen);
    axum::serve(listener, crate::api::router(state, config.max_upload_size()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Could not listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
