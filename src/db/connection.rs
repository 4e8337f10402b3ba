//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use anyhow::anyhow;
use anyhow::Error;
use anyhow::Result;
use clap::ArgMatches;
use diesel::pg::PgConnection;
use diesel::r2d2::ConnectionManager;
use diesel::r2d2::Pool;
use diesel_migrations::embed_migrations;
use diesel_migrations::EmbeddedMigrations;
use diesel_migrations::MigrationHarness;
use getset::CopyGetters;
use getset::Getters;
use tracing::debug;
use tracing::info;

use crate::config::Configuration;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Getters, CopyGetters)]
pub struct DbConnectionConfig<'a> {
    #[getset(get = "pub")]
    database_host: &'a str,

    #[getset(get_copy = "pub")]
    database_port: u16,

    #[getset(get = "pub")]
    database_user: &'a str,

    #[getset(get = "pub")]
    database_password: &'a str,

    #[getset(get = "pub")]
    database_name: &'a str,

    #[getset(get_copy = "pub")]
    database_connection_timeout: u16,

    #[getset(get_copy = "pub")]
    database_pool_size: u32,
}

impl<'a> std::fmt::Debug for DbConnectionConfig<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "postgres://{user}:PASSWORD@{host}:{port}/{name}?connect_timeout={timeout}",
            host = self.database_host,
            port = self.database_port,
            user = self.database_user,
            name = self.database_name,
            timeout = self.database_connection_timeout
        )
    }
}

impl<'a> DbConnectionConfig<'a> {
    pub fn parse(config: &'a Configuration, cli: &'a ArgMatches) -> Result<DbConnectionConfig<'a>> {
        Ok(DbConnectionConfig {
            database_host: cli.get_one::<String>("database_host").map(String::as_str).unwrap_or_else(|| config.database_host().as_str()),
            database_port: {
                cli.get_one::<String>("database_port")
                    .map(|s| s.parse::<u16>())
                    .transpose()?
                    .unwrap_or_else(|| *config.database_port())
            },
            database_user: cli.get_one::<String>("database_user").map(String::as_str).unwrap_or_else(|| config.database_user().as_str()),
            database_password: cli.get_one::<String>("database_password").map(String::as_str).unwrap_or_else(|| config.database_password().as_str()),
            database_name: cli.get_one::<String>("database_name").map(String::as_str).unwrap_or_else(|| config.database_name().as_str()),
            database_connection_timeout: {
                cli.get_one::<String>("database_connection_timeout")
                    .map(|s| s.parse::<u16>())
                    .transpose()?
                    .unwrap_or_else(|| {
                        // hardcoded default of 30 seconds database timeout
                        config.database_connection_timeout().unwrap_or(30)
                    })
            },
            database_pool_size: config.database_pool_size(),
        })
    }

    pub fn get_database_uri(&self) -> String {
        format!(
            "postgres://{user}:{password}@{host}:{port}/{name}?connect_timeout={timeout}",
            host = self.database_host,
            port = self.database_port,
            user = self.database_user,
            password = self.database_password,
            name = self.database_name,
            timeout = self.database_connection_timeout,
        )
    }

    pub fn establish_pool(self) -> Result<DbPool> {
        debug!("Trying to create a connection pool for database: {:?}", self);
        pool_for_uri(&self.get_database_uri(), self.database_pool_size)
    }
}

pub fn pool_for_uri(uri: &str, max_size: u32) -> Result<DbPool> {
    let manager = ConnectionManager::<PgConnection>::new(uri);
    Pool::builder()
        .max_size(max_size)
        .min_idle(Some(1))
        .build(manager)
        .map_err(Error::from)
}

/// Apply all migrations embedded in the binary that are not applied yet
pub fn run_migrations(conn: &mut PgConnection) -> Result<()> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow!("Running database migrations failed: {}", e))?;

    if applied.is_empty() {
        debug!("Database schema is up to date");
    } else {
        for version in applied {
            info!("Applied migration {}", version);
        }
    }

    Ok(())
}
