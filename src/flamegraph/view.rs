//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use chrono::DateTime;
use chrono::SecondsFormat;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::db::models::Commit;
use crate::db::models::Flamegraph;
use crate::db::models::FlamegraphRow;
use crate::db::models::Hardware;

/// JSON representation of a flamegraph row and the rows it references
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlamegraphView {
    pub id: i32,
    pub name: String,
    pub file_path: Option<String>,
    pub run_id: String,
    pub run_reason: Option<String>,
    pub timestamp: String,
    pub commit_repo_url: String,
    pub commit: Option<CommitView>,
    pub hardware: HardwareView,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CommitView {
    pub id: i32,
    pub repository: String,
    pub sha: String,
    pub parent_sha: Option<String>,
    pub message: String,
    pub author_name: String,
    pub author_login: Option<String>,
    pub author_avatar: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HardwareView {
    pub id: i32,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub hash: String,
    pub info: Value,
}

impl From<FlamegraphRow> for FlamegraphView {
    fn from((flamegraph, hardware, commit): FlamegraphRow) -> Self {
        FlamegraphView::new(flamegraph, hardware, commit)
    }
}

impl FlamegraphView {
    pub fn new(flamegraph: Flamegraph, hardware: Hardware, commit: Option<Commit>) -> Self {
        FlamegraphView {
            id: flamegraph.id,
            name: flamegraph.name,
            file_path: flamegraph.file_path,
            run_id: flamegraph.run_id,
            run_reason: flamegraph.run_reason,
            timestamp: rfc3339(&flamegraph.timestamp),
            commit_repo_url: flamegraph.commit_repo_url,
            commit: commit.map(CommitView::from),
            hardware: HardwareView::from(hardware),
        }
    }
}

impl From<Commit> for CommitView {
    fn from(c: Commit) -> Self {
        CommitView {
            id: c.id,
            repository: c.repository,
            sha: c.sha,
            parent_sha: c.parent_sha,
            message: c.message,
            author_name: c.author_name,
            author_login: c.author_login,
            author_avatar: c.author_avatar,
            timestamp: c.committed_at.as_ref().map(rfc3339),
        }
    }
}

impl From<Hardware> for HardwareView {
    fn from(h: Hardware) -> Self {
        HardwareView {
            id: h.id,
            kind: h.kind,
            name: h.name,
            hash: h.hash,
            info: h.info,
        }
    }
}

fn rfc3339(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}
