use crate::encoding::{decode_content, encode_content};
use crate::error::{ForkeditError, GitHubError, Result};
use crate::github::proxy::{ProxyRequest, ProxyTransport};
use crate::github::types::{
    CommitResult, ContentItem, GitRef, PullRequest, RemoteFile, RepoName, Repository, User,
};
use crate::session::Session;
use serde_json::json;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_PR_TITLE: &str = "Update from forkedit";
pub const DEFAULT_PR_BODY: &str = "Please pull these changes in.";
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update from forkedit";

const UNAUTHORIZED: u16 = 401;
const NOT_FOUND: u16 = 404;

/// GitHub operations for one base repository, routed through the proxy.
/// Fork and branch identity come from the owned [`Session`].
#[derive(Clone)]
pub struct ProxyClient {
    transport: ProxyTransport,
    api_base: String,
    base_repo: RepoName,
    base_branch: String,
    session: Session,
}

impl ProxyClient {
    pub fn new(
        proxy_url: &str,
        base_repo: RepoName,
        base_branch: &str,
        session: Session,
    ) -> Result<Self> {
        Ok(Self {
            transport: ProxyTransport::new(proxy_url)?,
            api_base: DEFAULT_API_BASE.to_string(),
            base_repo,
            base_branch: base_branch.to_string(),
            session,
        })
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    pub fn checkout(&mut self, branch: &str) {
        self.session.set_head_branch(branch);
    }

    /// Joins `segments` onto the API base, percent-encoding each path
    /// component. Segments may contain `/`, which separates components.
    fn url(&self, segments: &[&str], query: Option<(&str, &str)>) -> Result<String> {
        let mut url = Url::parse(&self.api_base)?;
        url.path_segments_mut()
            .map_err(|_| ForkeditError::Config(format!("invalid api base {}", self.api_base)))?
            .pop_if_empty()
            .extend(
                segments
                    .iter()
                    .flat_map(|s| s.split('/'))
                    .filter(|s| !s.is_empty()),
            );
        if let Some((key, value)) = query {
            url.query_pairs_mut().append_pair(key, value);
        }
        Ok(url.into())
    }

    /// `None` when the proxy answers 401, i.e. nobody is signed in.
    pub async fn get_current_user(&self) -> Result<Option<User>> {
        let url = self.url(&["user"], None)?;
        let resp = self.transport.send(&ProxyRequest::get(url)).await?;
        if resp.status == UNAUTHORIZED {
            return Ok(None);
        }
        resp.into_result().map(Some)
    }

    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.get_current_user().await?.is_some())
    }

    pub async fn create_fork(&mut self) -> Result<Repository> {
        let base = &self.base_repo;
        let url = self.url(&["repos", &base.owner, &base.repo, "forks"], None)?;
        let fork: Repository = self
            .transport
            .send(&ProxyRequest::post(url, None))
            .await?
            .into_result()?;

        tracing::info!(fork = %fork.full_name, base = %self.base_repo, "fork created");
        self.session.set_fork(fork.full_name.clone());
        Ok(fork)
    }

    pub async fn create_pull_request(&self, title: &str, body: &str) -> Result<PullRequest> {
        let fork = self.session.fork()?;
        let title = if title.is_empty() { DEFAULT_PR_TITLE } else { title };
        let body = if body.is_empty() { DEFAULT_PR_BODY } else { body };

        let base = &self.base_repo;
        let url = self.url(&["repos", &base.owner, &base.repo, "pulls"], None)?;
        let data = json!({
            "title": title,
            "body": body,
            "head": format!("{}:{}", fork.owner, self.session.head_branch()),
            "base": self.base_branch,
        });
        let pr: PullRequest = self
            .transport
            .send(&ProxyRequest::post(url, Some(data)))
            .await?
            .into_result()?;

        tracing::info!(number = pr.number, base = %self.base_repo, "pull request opened");
        Ok(pr)
    }

    /// Only the first page of open pull requests is searched.
    pub async fn find_existing_pull_request(&self) -> Result<Option<PullRequest>> {
        let fork = self.session.fork()?.to_string();
        let base = self.base_repo.to_string();
        let branch = self.session.head_branch();

        let url = self.url(
            &["repos", &self.base_repo.owner, &self.base_repo.repo, "pulls"],
            None,
        )?;
        let pulls: Vec<PullRequest> = self
            .transport
            .send(&ProxyRequest::get(url))
            .await?
            .into_result()?;

        Ok(pulls.into_iter().find(|pr| {
            pr.head.ref_name == branch
                && pr.head.repo_full_name() == Some(fork.as_str())
                && pr.base.repo_full_name() == Some(base.as_str())
        }))
    }

    /// `None` when the branch does not exist on the fork.
    pub async fn get_branch_ref(&self) -> Result<Option<GitRef>> {
        let fork = self.session.fork()?;
        let url = self.url(
            &[
                "repos",
                &fork.owner,
                &fork.repo,
                "git/ref/heads",
                self.session.head_branch(),
            ],
            None,
        )?;
        let resp = self.transport.send(&ProxyRequest::get(url)).await?;
        if resp.status == NOT_FOUND {
            return Ok(None);
        }
        resp.into_result().map(Some)
    }

    pub async fn commit_file(
        &self,
        path: &str,
        sha: &str,
        content: &str,
        message: Option<&str>,
    ) -> Result<CommitResult> {
        let fork = self.session.fork()?;
        let url = self.url(&["repos", &fork.owner, &fork.repo, "contents", path], None)?;
        let data = json!({
            "message": message.unwrap_or(DEFAULT_COMMIT_MESSAGE),
            "content": encode_content(content),
            "sha": sha,
            "branch": self.session.head_branch(),
        });
        let result: CommitResult = self
            .transport
            .send(&ProxyRequest::put(url, data))
            .await?
            .into_result()?;

        tracing::info!(%fork, path, commit = %result.commit.sha, "file committed");
        Ok(result)
    }

    pub async fn get_repository(&self) -> Result<Repository> {
        let fork = self.session.fork()?;
        let url = self.url(&["repos", &fork.owner, &fork.repo], None)?;
        self.transport
            .send(&ProxyRequest::get(url))
            .await?
            .into_result()
    }

    /// Whether the signed-in user can push to the fork.
    pub async fn is_authorized(&self) -> Result<bool> {
        let repo = self.get_repository().await?;
        Ok(repo.permissions.map(|p| p.push).unwrap_or(false))
    }

    /// Branches `name` off the session's current branch on the fork. The
    /// session is left on its current branch; call [`Self::checkout`] to
    /// switch.
    pub async fn create_branch(&self, name: &str) -> Result<GitRef> {
        let fork = self.session.fork()?;
        let current = self.get_branch_ref().await?.ok_or_else(|| {
            GitHubError::new(
                format!("branch {} not found on {fork}", self.session.head_branch()),
                NOT_FOUND,
            )
        })?;

        let url = self.url(&["repos", &fork.owner, &fork.repo, "git/refs"], None)?;
        let data = json!({
            "ref": format!("refs/heads/{name}"),
            "sha": current.object.sha,
        });
        let created: GitRef = self
            .transport
            .send(&ProxyRequest::post(url, Some(data)))
            .await?
            .into_result()?;

        tracing::info!(%fork, branch = name, "branch created");
        Ok(created)
    }

    pub async fn fetch_file(&self, path: &str) -> Result<RemoteFile> {
        let fork = self.session.fork()?;
        let url = self.url(
            &["repos", &fork.owner, &fork.repo, "contents", path],
            Some(("ref", self.session.head_branch())),
        )?;
        let item: ContentItem = self
            .transport
            .send(&ProxyRequest::get(url))
            .await?
            .into_result()?;

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
