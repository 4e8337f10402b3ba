//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

#![allow(dead_code)]

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::anyhow;
use anyhow::Result;
use async_trait::async_trait;
use diesel::r2d2::ConnectionManager;
use diesel::r2d2::Pool;
use diesel::PgConnection;
use serde_json::json;
use serde_json::Value;

use flamestore::api::AppState;
use flamestore::db::DbPool;
use flamestore::filestore::path::StoreRoot;
use flamestore::filestore::FlamegraphFiles;
use flamestore::flamegraph::FlamegraphReader;
use flamestore::flamegraph::FlamegraphStore;
use flamestore::github::CommitMetadata;
use flamestore::github::CommitMetadataSource;
use flamestore::util::RepositoryUrl;

pub const SVG: &[u8] = b"<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"10\" height=\"10\"></svg>";

/// Commit metadata source that never leaves the process
#[derive(Default)]
pub struct StubCommitSource {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl StubCommitSource {
    pub fn failing() -> Self {
        StubCommitSource {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommitMetadataSource for StubCommitSource {
    async fn fetch(&self, repository: &RepositoryUrl, sha: &str) -> Result<CommitMetadata> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("upstream unreachable"));
        }

        // widen the window in which concurrent resolvers race each other
        tokio::time::sleep(Duration::from_millis(20)).await;

        Ok(CommitMetadata {
            repository: repository.clone(),
            sha: sha.to_string(),
            parent_sha: Some("0000000000000000000000000000000000000000".to_string()),
            message: format!("Commit {}", sha),
            author_name: "Jane Doe".to_string(),
            author_login: Some("janedoe".to_string()),
            author_avatar: None,
            committed_at: None,
        })
    }
}

pub fn machine_info() -> Value {
    json!({
        "name": "ursa-i9-9960x",
        "os_name": "Linux",
        "os_version": "5.4.0-96-generic",
        "architecture_name": "x86_64",
        "kernel_name": "5.4.0-96-generic",
        "cpu_model_name": "Intel(R) Core(TM) i9-9960X CPU @ 3.10GHz",
        "cpu_core_count": "16",
        "cpu_thread_count": "32",
        "cpu_l1d_cache_bytes": "524288",
        "cpu_l1i_cache_bytes": "524288",
        "cpu_l2_cache_bytes": "16777216",
        "cpu_l3_cache_bytes": "23068672",
        "cpu_frequency_max_hz": "4400000000",
        "memory_bytes": "134217728000",
        "gpu_count": "0",
        "gpu_product_names": []
    })
}

pub fn cluster_info(name: &str) -> Value {
    json!({
        "name": name,
        "info": {"gpu": 1, "workers": 4},
        "optional_info": {}
    })
}

/// A pool that never connects unless a request actually reaches the database
pub fn lazy_pool() -> DbPool {
    let manager = ConnectionManager::<PgConnection>::new("postgres://flamestore@127.0.0.1:1/flamestore");
    Pool::builder()
        .min_idle(Some(0))
        .max_size(1)
        .connection_timeout(Duration::from_millis(250))
        .build_unchecked(manager)
}

static MIGRATED: OnceLock<()> = OnceLock::new();

/// Pool on `DATABASE_URL` with all migrations applied, `None` if the variable is not set
pub fn database_pool() -> Option<DbPool> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("skip (no DATABASE_URL)");
            return None;
        }
    };

    let pool = flamestore::db::pool_for_uri(&url, 8).expect("pool");
    MIGRATED.get_or_init(|| {
        let mut conn = pool.get().expect("connection");
        flamestore::db::run_migrations(&mut conn).expect("migrations");
    });
    Some(pool)
}

pub fn files(root: &std::path::Path) -> FlamegraphFiles {
    FlamegraphFiles::new(StoreRoot::new(root.to_path_buf()).expect("store root"), Duration::from_secs(5))
}

pub fn store(pool: DbPool, files: FlamegraphFiles, source: Arc<StubCommitSource>) -> FlamegraphStore {
    FlamegraphStore::builder()
        .pool(pool)
        .files(files)
        .commit_source(source)
        .build()
}

pub fn app_state(pool: DbPool, files: FlamegraphFiles, source: Arc<StubCommitSource>) -> AppState {
    AppState::builder()
        .store(store(pool.clone(), files.clone(), source))
        .reader(FlamegraphReader::new(pool, files))
        .page_size_default(100)
        .build()
}

pub fn unique_run_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Body of a `multipart/form-data` request with the given text fields and an optional file
pub fn multipart_body(boundary: &str, fields: &[(&str, String)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes());
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    if let Some((filename, content)) = file {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n", filename).as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}
