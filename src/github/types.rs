use crate::error::{ForkeditError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An `owner/repo` pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RepoName {
    pub owner: String,
    pub repo: String,
}

impl RepoName {
    pub fn new(owner: &str, repo: &str) -> Self {
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        }
    }
}

impl FromStr for RepoName {
    type Err = ForkeditError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((owner, repo))
                if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
            {
                Ok(Self::new(owner, repo))
            }
            _ => Err(ForkeditError::InvalidRepo(s.to_string())),
        }
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct User {
    pub login: String,
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Permissions {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub push: bool,
    #[serde(default)]
    pub pull: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Owner {
    pub login: String,
}

/// Repository record; also what the forks endpoint returns.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Repository {
    pub full_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub owner: Option<Owner>,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub permissions: Option<Permissions>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PullRequestRepo {
    pub full_name: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PullRequestRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
    #[serde(default)]
    pub sha: Option<String>,
    /// Null when the head fork has since been deleted.
    #[serde(default)]
    pub repo: Option<PullRequestRepo>,
}

impl PullRequestRef {
    pub fn repo_full_name(&self) -> Option<&str> {
        self.repo.as_ref().map(|r| r.full_name.as_str())
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub head: PullRequestRef,
    pub base: PullRequestRef,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GitObject {
    pub sha: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GitRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub object: GitObject,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ContentSummary {
    pub path: String,
    pub sha: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CommitSummary {
    pub sha: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of a contents API write.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CommitResult {
    #[serde(default)]
    pub content: Option<ContentSummary>,
    pub commit: CommitSummary,
}

/// Raw contents API read; `content` is absent for directories.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ContentItem {
    pub path: String,
    pub sha: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}

/// A decoded file and the blob sha needed to update it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    pub sha: String,
    pub content: String,
}
