//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! Commit metadata lookups
//!
//! Commits are only known to this service by repository URL and hash. Everything else (author,
//! message, parent) is fetched from the hosting service when a commit is seen for the first time.

use std::time::Duration;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Error;
use anyhow::Result;
use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use getset::Getters;
use serde::Deserialize;
use tracing::debug;
use tracing::trace;
use url::Url;

use crate::util::RepositoryUrl;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitMetadata {
    pub repository: RepositoryUrl,
    pub sha: String,
    pub parent_sha: Option<String>,
    pub message: String,
    pub author_name: String,
    pub author_login: Option<String>,
    pub author_avatar: Option<String>,
    pub committed_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait CommitMetadataSource: Send + Sync {
    /// Fetch metadata of commit `sha` in `repository`
    ///
    /// Fails if the source is unreachable or does not know the commit.
    async fn fetch(&self, repository: &RepositoryUrl, sha: &str) -> Result<CommitMetadata>;
}

/// Owner and name of a GitHub repository
#[derive(Clone, Debug, PartialEq, Eq, Getters)]
pub struct GitHubRepository {
    #[getset(get = "pub")]
    owner: String,

    #[getset(get = "pub")]
    name: String,
}

impl TryFrom<&RepositoryUrl> for GitHubRepository {
    type Error = Error;

    fn try_from(repository: &RepositoryUrl) -> Result<Self> {
        let url = Url::parse(repository.as_ref())
            .with_context(|| anyhow!("Parsing repository URL '{}'", repository))?;

        if url.host_str() != Some("github.com") {
            return Err(anyhow!("Not a GitHub repository: '{}'", repository));
        }

        let segments = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect::<Vec<_>>())
            .unwrap_or_default();

        match segments.as_slice() {
            [owner, name] => Ok(GitHubRepository {
                owner: owner.to_string(),
                name: name.trim_end_matches(".git").to_string(),
            }),
            _ => Err(anyhow!("Expected https://github.com/<owner>/<repo>, got '{}'", repository)),
        }
    }
}

pub struct GitHubClient {
    client: reqwest::Client,
    api_base: Url,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(api_base: Url, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Building HTTP client failed")?;

        Ok(GitHubClient {
            client,
            api_base,
            token,
        })
    }

    fn commit_url(&self, repo: &GitHubRepository, sha: &str) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("API base URL cannot be a base: {}", self.api_base))?
            .pop_if_empty()
            .extend(["repos", repo.owner().as_str(), repo.name().as_str(), "commits", sha]);
        Ok(url)
    }
}

#[async_trait]
impl CommitMetadataSource for GitHubClient {
    async fn fetch(&self, repository: &RepositoryUrl, sha: &str) -> Result<CommitMetadata> {
        let repo = GitHubRepository::try_from(repository)?;
        let url = self.commit_url(&repo, sha)?;
        trace!("Fetching commit metadata from {}", url);

        let mut request = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = self.token.as_ref() {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| anyhow!("Requesting {}", url))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            return Err(anyhow!("Commit {} not found in {}", sha, repository));
        }
        if !status.is_success() {
            return Err(anyhow!("GitHub answered {} for {}", status, url));
        }

        let commit = response
            .json::<GitHubCommitResponse>()
            .await
            .with_context(|| anyhow!("Decoding response of {}", url))?;

        debug!("Fetched metadata of {} in {}", commit.sha, repository);
        Ok(commit.into_metadata(repository.clone()))
    }
}

#[derive(Debug, Deserialize)]
struct GitHubCommitResponse {
    sha: String,
    commit: GitCommit,
    author: Option<GitHubUser>,
    #[serde(default)]
    parents: Vec<GitHubParent>,
}

#[derive(Debug, Deserialize)]
struct GitCommit {
    message: String,
    author: Option<GitAuthor>,
}

#[derive(Debug, Deserialize)]
struct GitAuthor {
    name: String,
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubParent {
    sha: String,
}

impl GitHubCommitResponse {
    fn into_metadata(self, repository: RepositoryUrl) -> CommitMetadata {
        let (author_name, committed_at) = self
            .commit
            .author
            .map(|a| (a.name, a.date))
            .unwrap_or_else(|| (String::new(), None));

        CommitMetadata {
            repository,
            sha: self.sha,
            parent_sha: self.parents.into_iter().next().map(|p| p.sha),
            message: self.commit.message,
            author_name,
            author_login: self.author.as_ref().map(|u| u.login.clone()),
            author_avatar: self.author.and_then(|u| u.avatar_url),
            committed_at,
        }
    }
}
