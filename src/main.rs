//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use std::path::PathBuf;

use anyhow::anyhow;
use anyhow::Result;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use flamestore::cli;
use flamestore::commands;
use flamestore::config::Configuration;
use flamestore::db::DbConnectionConfig;

const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    if !cfg!(debug_assertions) {
        human_panic::setup_panic!();
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    debug!("Debugging enabled");

    let cli = cli::cli().get_matches();

    let config_path = cli
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = Configuration::load(&config_path)?;
    debug!("Configuration loaded from {}", config_path.display());

    let db_connection_config = DbConnectionConfig::parse(&config, &cli)?;

    match cli.subcommand() {
        Some(("serve", matches)) => commands::serve(db_connection_config, &config, matches).await,
        Some(("db", matches))    => commands::db(db_connection_config, &config, matches).await,
        Some((other, _)) => Err(anyhow!("Unknown subcommand: {}", other)),
        None             => Err(anyhow!("No subcommand")),
    }
}
