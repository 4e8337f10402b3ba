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
use std::path::PathBuf;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use getset::CopyGetters;
use getset::Getters;
use serde::Deserialize;
use url::Url;

use crate::config::util::*;
use crate::config::Configuration;
use crate::flamegraph::MAX_PAGE_SIZE;

#[derive(Debug, Getters, CopyGetters, Deserialize)]
pub struct NotValidatedConfiguration {
    #[getset(get = "pub")]
    compatibility: semver::VersionReq,

    #[serde(default = "default_listen")]
    #[getset(get_copy = "pub")]
    listen: SocketAddr,

    /// Directory below which uploaded flamegraphs are stored
    #[getset(get = "pub")]
    upload_root: PathBuf,

    #[getset(get = "pub")]
    database_host: String,

    #[getset(get = "pub")]
    database_port: u16,

    #[getset(get = "pub")]
    database_user: String,

    #[getset(get = "pub")]
    database_password: String,

    #[getset(get = "pub")]
    database_name: String,

    /// Connection timeout in seconds
    #[getset(get = "pub")]
    database_connection_timeout: Option<u16>,

    #[serde(default = "default_database_pool_size")]
    #[getset(get_copy = "pub")]
    database_pool_size: u32,

    #[serde(default = "default_file_io_timeout")]
    file_io_timeout: String,

    #[serde(default = "default_page_size")]
    #[getset(get_copy = "pub")]
    page_size_default: i64,

    #[serde(default = "default_max_upload_size")]
    #[getset(get_copy = "pub")]
    max_upload_size: usize,

    #[serde(default)]
    #[getset(get = "pub")]
    github: GitHubConfig,
}

#[derive(Debug, Getters, Deserialize)]
pub struct GitHubConfig {
    #[serde(default = "default_github_api_base")]
    #[getset(get = "pub")]
    api_base: Url,

    /// Token used for authenticated (higher rate limit) API access
    #[getset(get = "pub")]
    token: Option<String>,

    #[serde(default = "default_github_timeout")]
    timeout: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        GitHubConfig {
            api_base: default_github_api_base(),
            token: None,
            timeout: default_github_timeout(),
        }
    }
}

impl NotValidatedConfiguration {
    pub fn validate(self) -> Result<Configuration> {
        let crate_version = semver::Version::parse(env!("CARGO_PKG_VERSION"))
            .context("Parsing version of crate (CARGO_PKG_VERSION) into semver::Version object")?;

        if !self.compatibility.matches(&crate_version) {
            return Err(anyhow!("Configuration is not compatible to flamestore {}", crate_version));
        }

        if !self.upload_root.is_absolute() {
            return Err(anyhow!("Not an absolute path: upload_root = {}", self.upload_root.display()));
        }

        if !self.upload_root.is_dir() {
            return Err(anyhow!("Not a directory: upload_root = {}", self.upload_root.display()));
        }

        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size_default) {
            return Err(anyhow!(
                "page_size_default must be between 1 and {}, is {}",
                MAX_PAGE_SIZE,
                self.page_size_default
            ));
        }

        if self.database_pool_size == 0 {
            return Err(anyhow!("database_pool_size must not be zero"));
        }

        let file_io_timeout = parse_timeout("file_io_timeout", &self.file_io_timeout)?;
        let github_timeout = parse_timeout("github.timeout", &self.github.timeout)?;

        Ok(Configuration {
            inner: self,
            file_io_timeout,
            github_timeout,
        })
    }
}

fn parse_timeout(key: &str, value: &str) -> Result<std::time::Duration> {
    let d = humantime::parse_duration(value)
        .with_context(|| anyhow!("Parsing {} = '{}' as duration", key, value))?;

    if d.is_zero() {
        return Err(anyhow!("{} must not be zero", key));
    }

    Ok(d)
}
