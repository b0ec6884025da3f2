use crate::encoding::decode_content;
use crate::error::{ForkeditError, GitHubError, Result};
use crate::github::types::{RemoteFile, RepoName};
use async_trait::async_trait;
use octocrab::Octocrab;

/// Reads a single file from a repository branch.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch_file(
        &self,
        repo: &RepoName,
        branch: &str,
        path: &str,
        access_token: Option<&str>,
    ) -> Result<RemoteFile>;
}

/// Talks to the GitHub API directly with the caller's token.
#[derive(Clone, Debug, Default)]
pub struct OctocrabFetcher {
    base_uri: Option<String>,
}

impl OctocrabFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_uri(base_uri: &str) -> Self {
        Self {
            base_uri: Some(base_uri.to_string()),
        }
    }

    fn build(&self, access_token: Option<&str>) -> Result<Octocrab> {
        let mut builder = Octocrab::builder();
        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            builder = builder.personal_token(token.to_string());
        }
        if let Some(uri) = &self.base_uri {
            builder = builder.base_uri(uri.as_str())?;
        }
        Ok(builder.build()?)
    }
}

#[async_trait]
impl ContentFetcher for OctocrabFetcher {
    async fn fetch_file(
        &self,
        repo: &RepoName,
        branch: &str,
        path: &str,
        access_token: Option<&str>,
    ) -> Result<RemoteFile> {
        let octo = self.build(access_token)?;
        let items = octo
            .repos(&repo.owner, &repo.repo)
            .get_content()
            .path(path)
            .r#ref(branch)
            .send()
            .await
            .map_err(from_octocrab)?;

        let item = items
            .items
            .into_iter()
            .next()
            .ok_or_else(|| ForkeditError::NotAFile(path.to_string()))?;
        let encoded = item
            .content
            .ok_or_else(|| ForkeditError::NotAFile(item.path.clone()))?;

        Ok(RemoteFile {
            content: decode_content(&encoded)?,
            path: item.path,
            sha: item.sha,
        })
    }
}

fn from_octocrab(err: octocrab::Error) -> ForkeditError {
    match err {
        octocrab::Error::GitHub { source, .. } => {
            GitHubError::new(source.message.clone(), source.status_code.as_u16()).into()
        }
        other => other.into(),
    }
}
