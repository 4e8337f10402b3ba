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
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use std::time::SystemTime;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Error;
use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::filestore::path::FlamegraphPath;
use crate::filestore::path::StoreRoot;

const STORED_EXTENSION: &str = "svg";
const MAX_STEM_LEN: usize = 64;
const FALLBACK_STEM: &str = "flamegraph";

lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_.-]").unwrap();
}

/// The managed directory of uploaded flamegraph files
///
/// Every operation is bounded by the configured I/O timeout.
#[derive(Clone, Debug)]
pub struct FlamegraphFiles {
    root: Arc<StoreRoot>,
    io_timeout: Duration,
}

impl FlamegraphFiles {
    pub fn new(root: StoreRoot, io_timeout: Duration) -> Self {
        FlamegraphFiles {
            root: Arc::new(root),
            io_timeout,
        }
    }

    /// Store `content` under a fresh name derived from `original_filename`
    ///
    /// Never overwrites an existing file. A partially written file is removed again.
    pub async fn write(&self, original_filename: &str, content: &[u8]) -> Result<FlamegraphPath> {
        let path = FlamegraphPath::for_file_name(&stored_file_name(original_filename))?;
        let full = self.root.join(&path).joined();
        trace!("Writing {} bytes to {}", content.len(), full.display());

        let mut created = false;
        let write = async {
            tokio::fs::create_dir_all(self.root.flamegraphs_dir())
                .await
                .with_context(|| anyhow!("Creating directory {}", self.root.flamegraphs_dir().display()))?;

            let mut file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&full)
                .await
                .with_context(|| anyhow!("Creating {}", full.display()))?;
            created = true;

            file.write_all(content).await?;
            file.sync_all().await.map_err(Error::from)
        };

        let result = self.bounded(write).await;
        match result {
            Ok(()) => {
                debug!("Stored flamegraph file {}", path.display());
                Ok(path)
            }
            Err(e) => {
                if created {
                    if let Err(cleanup) = tokio::fs::remove_file(&full).await {
                        warn!("Could not remove partially written {}: {}", full.display(), cleanup);
                    }
                }
                Err(e).with_context(|| anyhow!("Writing flamegraph {}", path.display()))
            }
        }
    }

    /// Remove a stored file
    ///
    /// A file that is already gone counts as removed.
    pub async fn remove(&self, path: &FlamegraphPath) -> Result<()> {
        let full = self.root.join(path).joined();
        trace!("Removing {}", full.display());

        let remove = async {
            match tokio::fs::remove_file(&full).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    warn!("Flamegraph file already missing: {}", full.display());
                    Ok(())
                }
                Err(e) => Err(Error::from(e)),
            }
        };

        self.bounded(remove)
            .await
            .with_context(|| anyhow!("Removing flamegraph {}", path.display()))
    }

    pub async fn read(&self, path: &FlamegraphPath) -> Result<Vec<u8>> {
        let full = self.root.join(path).joined();
        self.bounded(async { tokio::fs::read(&full).await.map_err(Error::from) })
            .await
            .with_context(|| anyhow!("Reading flamegraph {}", path.display()))
    }

    pub async fn exists(&self, path: &FlamegraphPath) -> bool {
        tokio::fs::metadata(self.root.join(path).joined())
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Remove files no database row references
    ///
    /// Files younger than `min_age` are skipped, they might belong to an upload whose row is not
    /// committed yet. Returns the orphans found (and removed, unless `dry_run`).
    pub async fn sweep(
        &self,
        referenced: &HashSet<FlamegraphPath>,
        min_age: Duration,
        dry_run: bool,
    ) -> Result<Vec<FlamegraphPath>> {
        if !self.root.flamegraphs_dir().is_dir() {
            return Ok(Vec::new());
        }

        let candidates = self
            .root
            .find_flamegraphs_recursive()
            .collect::<Result<Vec<_>>>()?;

        let now = SystemTime::now();
        let mut orphans = Vec::new();
        for path in candidates {
            if referenced.contains(&path) {
                continue;
            }

            let full = self.root.join(&path).joined();
            if !is_older_than(&full, now, min_age)? {
                trace!("Skipping recent file {}", full.display());
                continue;
            }

            if !dry_run {
                self.remove(&path).await?;
            }
            orphans.push(path);
        }

        Ok(orphans)
    }

    async fn bounded<F, T>(&self, fut: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.io_timeout, fut)
            .await
            .map_err(|_| anyhow!("File operation timed out after {:?}", self.io_timeout))?
    }
}

fn is_older_than(p: &Path, now: SystemTime, min_age: Duration) -> Result<bool> {
    let modified = std::fs::metadata(p)
        .and_then(|m| m.modified())
        .with_context(|| anyhow!("Reading modification time of {}", p.display()))?;

    Ok(now.duration_since(modified).map(|age| age >= min_age).unwrap_or(false))
}

/// Reduce a client supplied filename to a safe stem
///
/// Only ASCII letters, digits, `_`, `.` and `-` survive; whitespace becomes `_`.
pub fn sanitize_stem(original_filename: &str) -> String {
    let base = original_filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let stem = Path::new(base)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");

    let stem = UNSAFE_CHARS.replace_all(&stem, "");
    let stem = stem.trim_matches(|c: char| c == '.' || c == '_');
    let stem = stem.chars().take(MAX_STEM_LEN).collect::<String>();

    if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem
    }
}

/// Collision resistant name under which an upload is stored
pub fn stored_file_name(original_filename: &str) -> String {
    format!(
        "{}_{}.{}",
        sanitize_stem(original_filename),
        uuid::Uuid::new_v4().simple(),
        STORED_EXTENSION
    )
}
