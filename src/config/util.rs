//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! Default values for the configuration

use std::net::SocketAddr;

use url::Url;

pub fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

pub fn default_database_pool_size() -> u32 {
    10
}

pub fn default_file_io_timeout() -> String {
    String::from("10s")
}

pub fn default_page_size() -> i64 {
    crate::flamegraph::DEFAULT_PAGE_SIZE
}

pub fn default_max_upload_size() -> usize {
    16 * 1024 * 1024
}

pub fn default_github_api_base() -> Url {
    Url::parse("https://api.github.com").expect("valid default GitHub API URL")
}

pub fn default_github_timeout() -> String {
    String::from("10s")
}
