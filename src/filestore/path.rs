//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use std::ffi::OsStr;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Error;
use anyhow::Result;
use resiter::AndThen;
use resiter::Map;

/// Name of the directory below the upload root that holds the flamegraph files
pub const FLAMEGRAPHS_DIR_NAME: &str = "flamegraphs";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreRoot(PathBuf);

impl StoreRoot {
    pub fn new(root: PathBuf) -> Result<Self> {
        if root.is_absolute() {
            if root.is_dir() {
                Ok(StoreRoot(root))
            } else {
                Err(anyhow!("StoreRoot path does not point to directory: {}", root.display()))
            }
        } else {
            Err(anyhow!("StoreRoot path is not absolute: {}", root.display()))
        }
    }

    pub fn join<'a>(&'a self, fp: &'a FlamegraphPath) -> FullFlamegraphPath<'a> {
        FullFlamegraphPath(self, fp)
    }

    pub fn flamegraphs_dir(&self) -> PathBuf {
        self.0.join(FLAMEGRAPHS_DIR_NAME)
    }

    pub fn display(&self) -> std::path::Display {
        self.0.display()
    }

    /// All files in the flamegraphs directory, as paths relative to this root
    pub fn find_flamegraphs_recursive(&self) -> impl Iterator<Item = Result<FlamegraphPath>> + '_ {
        walkdir::WalkDir::new(self.flamegraphs_dir())
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !e.path_is_symlink())
            .filter(|e| e.as_ref().map(|e| e.file_type().is_file()).unwrap_or(true))
            .map_err(Error::from)
            .map_ok(|de| de.into_path())
            .and_then_ok(|p| {
                p.strip_prefix(&self.0)
                    .map(Path::to_path_buf)
                    .with_context(|| anyhow!("Stripping store root from {}", p.display()))
                    .and_then(FlamegraphPath::new)
            })
    }
}

/// Path of a flamegraph file, relative to the store root
///
/// This is the representation that ends up in the `file_path` column.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlamegraphPath(PathBuf);

impl FlamegraphPath {
    pub fn new(p: PathBuf) -> Result<Self> {
        if !p.is_relative() {
            return Err(anyhow!("Path is not relative: {}", p.display()));
        }

        let escapes = p.components().any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(anyhow!("Path is not a plain relative path: {}", p.display()));
        }

        Ok(FlamegraphPath(p))
    }

    pub fn for_file_name(file_name: &str) -> Result<Self> {
        FlamegraphPath::new(Path::new(FLAMEGRAPHS_DIR_NAME).join(file_name))
    }

    pub fn display(&self) -> std::path::Display {
        self.0.display()
    }

    pub fn file_name(&self) -> Option<&OsStr> {
        self.0.file_name()
    }

    pub fn to_str(&self) -> Option<&str> {
        self.0.to_str()
    }
}

impl TryFrom<&str> for FlamegraphPath {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        FlamegraphPath::new(PathBuf::from(s))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FullFlamegraphPath<'a>(&'a StoreRoot, &'a FlamegraphPath);

impl<'a> FullFlamegraphPath<'a> {
    pub fn joined(&self) -> PathBuf {
        self.0 .0.join(&self.1 .0)
    }

    pub fn display(&self) -> FullFlamegraphPathDisplay<'a> {
        FullFlamegraphPathDisplay(self.0, self.1)
    }
}

pub struct FullFlamegraphPathDisplay<'a>(&'a StoreRoot, &'a FlamegraphPath);

impl<'a> std::fmt::Display for FullFlamegraphPathDisplay<'a> {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "{}/{}", self.0.display(), self.1.display())
    }
}
