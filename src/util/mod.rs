//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use serde::Deserialize;
use serde::Serialize;

/// URL of a source repository, normalized to carry no trailing slash
#[derive(Serialize, Deserialize, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct RepositoryUrl(String);

impl From<&str> for RepositoryUrl {
    fn from(s: &str) -> RepositoryUrl {
        RepositoryUrl(s.trim().trim_end_matches('/').to_string())
    }
}

impl AsRef<str> for RepositoryUrl {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

impl RepositoryUrl {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for RepositoryUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        self.0.fmt(f)
    }
}

pub mod hash;
pub mod serde_int;

pub fn stdout_is_pipe() -> bool {
    !atty::is(atty::Stream::Stdout)
}
