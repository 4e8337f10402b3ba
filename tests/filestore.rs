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

use flamestore::filestore::path::FlamegraphPath;

mod common;
use common::*;

#[tokio::test]
async fn test_write_read_remove() {
    let dir = tempfile::tempdir().unwrap();
    let files = files(dir.path());

    let path = files.write("my flame.svg", SVG).await.unwrap();
    let name = path.file_name().unwrap().to_str().unwrap().to_string();
    assert!(name.starts_with("my_flame_"), "{}", name);
    assert!(name.ends_with(".svg"), "{}", name);
    assert!(path.to_str().unwrap().starts_with("flamegraphs/"));
    assert!(dir.path().join(path.to_str().unwrap()).is_file());

    assert_eq!(files.read(&path).await.unwrap(), SVG);
    assert!(files.exists(&path).await);

    files.remove(&path).await.unwrap();
    assert!(!files.exists(&path).await);
}

#[tokio::test]
async fn test_same_name_never_collides() {
    let dir = tempfile::tempdir().unwrap();
    let files = files(dir.path());

    let a = files.write("flame.svg", b"<svg>a</svg>").await.unwrap();
    let b = files.write("flame.svg", b"<svg>b</svg>").await.unwrap();
    assert_ne!(a, b);
    assert_eq!(files.read(&a).await.unwrap(), b"<svg>a</svg>");
    assert_eq!(files.read(&b).await.unwrap(), b"<svg>b</svg>");
}

#[tokio::test]
async fn test_remove_missing_file_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let files = files(dir.path());
    let path = FlamegraphPath::for_file_name("gone.svg").unwrap();
    assert!(files.remove(&path).await.is_ok());
}

#[tokio::test]
async fn test_write_fails_when_directory_unusable() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("flamegraphs"), b"not a directory").unwrap();
    let files = files(dir.path());

    assert!(files.write("flame.svg", SVG).await.is_err());
}

#[tokio::test]
async fn test_remove_fails_on_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("flamegraphs").join("stuck.svg")).unwrap();
    let files = files(dir.path());

    let path = FlamegraphPath::for_file_name("stuck.svg").unwrap();
    assert!(files.remove(&path).await.is_err());
}

#[tokio::test]
async fn test_sweep_removes_only_unreferenced() {
    let dir = tempfile::tempdir().unwrap();
    let files = files(dir.path());

    let kept = files.write("kept.svg", SVG).await.unwrap();
    let orphan = files.write("orphan.svg", SVG).await.unwrap();
    let referenced = HashSet::from([kept.clone()]);

    let dry = files.sweep(&referenced, Duration::ZERO, true).await.unwrap();
    assert_eq!(dry, vec![orphan.clone()]);
    assert!(files.exists(&orphan).await);

    let removed = files.sweep(&referenced, Duration::ZERO, false).await.unwrap();
    assert_eq!(removed, vec![orphan.clone()]);
    assert!(!files.exists(&orphan).await);
    assert!(files.exists(&kept).await);
}

#[tokio::test]
async fn test_sweep_leaves_recent_files() {
    let dir = tempfile::tempdir().unwrap();
    let files = files(dir.path());

    let fresh = files.write("fresh.svg", SVG).await.unwrap();
    let removed = files.sweep(&HashSet::new(), Duration::from_secs(3600), false).await.unwrap();
    assert!(removed.is_empty());
    assert!(files.exists(&fresh).await);
}

#[tokio::test]
async fn test_sweep_without_directory() {
    let dir = tempfile::tempdir().unwrap();
    let files = files(dir.path());
    assert!(files.sweep(&HashSet::new(), Duration::ZERO, false).await.unwrap().is_empty());
}
