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

use clap::crate_authors;
use clap::crate_version;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;

pub fn cli() -> Command {
    Command::new("flamestore")
        .author(crate_authors!())
        .version(crate_version!())
        .about("Flamegraph upload, storage and browsing service")
        .subcommand_required(true)
        .arg_required_else_help(true)

        .arg(Arg::new("config")
            .required(false)
            .long("config")
            .short('c')
            .global(true)
            .value_name("FILE")
            .value_parser(value_parser!(PathBuf))
            .help("Path of the configuration file (default: ./config.toml)")
        )

        .arg(Arg::new("database_host")
            .required(false)
            .long("db-host")
            .value_name("HOST")
            .help("Override the database host")
            .long_help("Override the database host set via configuration. Can also be overriden via environment variable 'FLAMESTORE_DATABASE_HOST', but this setting has precedence.")
        )
        .arg(Arg::new("database_port")
            .required(false)
            .long("db-port")
            .value_name("PORT")
            .help("Override the database port")
            .long_help("Override the database port set via configuration. Can also be overriden via environment 'FLAMESTORE_DATABASE_PORT', but this setting has precedence.")
        )
        .arg(Arg::new("database_user")
            .required(false)
            .long("db-user")
            .value_name("USER")
            .help("Override the database user")
            .long_help("Override the database user set via configuration. Can also be overriden via environment 'FLAMESTORE_DATABASE_USER', but this setting has precedence.")
        )
        .arg(Arg::new("database_password")
            .required(false)
            .long("db-password")
            .value_name("PASSWORD")
            .help("Override the database password")
            .long_help("Override the database password set via configuration. Can also be overriden via environment 'FLAMESTORE_DATABASE_PASSWORD', but this setting has precedence.")
        )
        .arg(Arg::new("database_name")
            .required(false)
            .long("db-name")
            .value_name("NAME")
            .help("Override the database name")
            .long_help("Override the database name set via configuration. Can also be overriden via environment 'FLAMESTORE_DATABASE_NAME', but this setting has precedence.")
        )
        .arg(Arg::new("database_connection_timeout")
            .required(false)
            .long("db-timeout")
            .value_name("TIMEOUT")
            .help("Override the database connection timeout")
            .long_help("Override the database connection timeout set via configuration. Can also be overriden via environment 'FLAMESTORE_DATABASE_CONNECTION_TIMEOUT', but this setting has precedence.")
        )

        .subcommand(Command::new("serve")
            .about("Run the HTTP API")
            .arg(Arg::new("listen")
                .required(false)
                .long("listen")
                .value_name("ADDR")
                .value_parser(value_parser!(std::net::SocketAddr))
                .help("Override the address to listen on")
            )
            .arg(Arg::new("no_migrate")
                .required(false)
                .long("no-migrate")
                .action(ArgAction::SetTrue)
                .help("Do not apply pending database migrations at startup")
            )
        )

        .subcommand(Command::new("db")
            .about("Database CLI interface")
            .subcommand_required(true)
            .arg_required_else_help(true)
            .subcommand(Command::new("migrate")
                .about("Apply pending database migrations")
            )
            .subcommand(Command::new("flamegraphs")
                .about("List flamegraphs from the DB")
                .arg(arg_csv())
                .arg(Arg::new("run_id")
                    .required(false)
                    .long("run-id")
                    .value_name("RUN_ID")
                    .help("Only list flamegraphs of this run")
                )
                .arg(Arg::new("run_reason")
                    .required(false)
                    .long("run-reason")
                    .value_name("REASON")
                    .help("Only list flamegraphs with this run reason")
                )
                .arg(Arg::new("limit")
                    .required(false)
                    .long("limit")
                    .short('L')
                    .value_name("N")
                    .value_parser(value_parser!(i64).range(1..=1000))
                    .default_value("100")
                    .help("Only list the newest N flamegraphs")
                )
            )
            .subcommand(Command::new("sweep")
                .about("Remove stored files no flamegraph references")
                .arg(Arg::new("dry_run")
                    .required(false)
                    .long("dry-run")
                    .action(ArgAction::SetTrue)
                    .help("Only print the files that would be removed")
                )
                .arg(Arg::new("min_age")
                    .required(false)
                    .long("min-age")
                    .value_name("DURATION")
                    .value_parser(humantime::parse_duration)
                    .default_value("1h")
                    .help("Leave files younger than this alone")
                )
            )
        )
}

fn arg_csv() -> Arg {
    Arg::new("csv")
        .required(false)
        .long("csv")
        .action(ArgAction::SetTrue)
        .help("Format output as CSV")
}
