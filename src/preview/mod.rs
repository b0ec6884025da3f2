//! Render-time previews of unmerged edits.
//!
//! A page generator asks for one file from an editor's fork and branch and
//! gets back a props envelope it can serialize straight into the page. A
//! GitHub error (missing file, revoked token, deleted fork) is folded into
//! the envelope as data so the page can show it; anything else is returned
//! as an `Err`.

pub mod fetcher;

use crate::error::{ErrorData, ForkeditError, Result};
use crate::github::types::RepoName;
use fetcher::ContentFetcher;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewRequest {
    pub github_access_token: Option<String>,
    pub fork_full_name: String,
    pub head_branch: String,
    pub file_relative_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceProvider {
    pub fork_full_name: String,
    pub head_branch: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewFile<T> {
    pub sha: String,
    pub file_relative_path: String,
    pub data: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewProps<T> {
    pub preview: bool,
    pub source_provider: SourceProvider,
    pub file: Option<PreviewFile<T>>,
    pub error: Option<ErrorData>,
}

pub async fn get_github_preview_props<F, P, T>(
    request: &PreviewRequest,
    fetcher: &F,
    parse: P,
) -> Result<PreviewProps<T>>
where
    F: ContentFetcher + ?Sized,
    P: FnOnce(&str) -> Result<T>,
{
    let source_provider = SourceProvider {
        fork_full_name: request.fork_full_name.clone(),
        head_branch: request.head_branch.clone(),
    };
    let repo: RepoName = request.fork_full_name.parse()?;

    let fetched = fetcher
        .fetch_file(
            &repo,
            &request.head_branch,
            &request.file_relative_path,
            request.github_access_token.as_deref(),
        )
        .await;

    match fetched {
        Ok(remote) => Ok(PreviewProps {
            preview: true,
            source_provider,
            file: Some(PreviewFile {
                sha: remote.sha,
                file_relative_path: request.file_relative_path.clone(),
                data: parse(&remote.content)?,
            }),
            error: None,
        }),
        Err(ForkeditError::GitHub(err)) => {
            tracing::warn!(
                file = %request.file_relative_path,
                repo = %request.fork_full_name,
                branch = %request.head_branch,
                has_token = request
                    .github_access_token
                    .as_deref()
                    .is_some_and(|t| !t.is_empty()),
                status = err.status,
                "could not load preview content: {}",
                err.message
            );
            Ok(PreviewProps {
                preview: true,
                source_provider,
                file: None,
                error: Some(err.to_data()),
            })
        }
        Err(other) => Err(other),
    }
}

pub fn parse_json<T: DeserializeOwned>(content: &str) -> Result<T> {
    Ok(serde_json::from_str(content)?)
}

pub fn parse_toml<T: DeserializeOwned>(content: &str) -> Result<T> {
    Ok(toml::from_str(content)?)
}

pub fn parse_text(content: &str) -> Result<String> {
    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GitHubError;
    use crate::github::types::RemoteFile;
    use crate::test_utils::CapturedLogs;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    enum Outcome {
        File(&'static str),
        GitHub(u16),
        Io,
    }

    struct MockFetcher {
        outcome: Outcome,
        seen: Mutex<Option<(String, String, String, Option<String>)>>,
    }

    impl MockFetcher {
        fn new(outcome: Outcome) -> Self {
            Self {
                outcome,
                seen: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl ContentFetcher for MockFetcher {
        async fn fetch_file(
            &self,
            repo: &RepoName,
            branch: &str,
            path: &str,
            access_token: Option<&str>,
        ) -> Result<RemoteFile> {
            *self.seen.lock().unwrap() = Some((
                repo.to_string(),
                branch.to_string(),
                path.to_string(),
                access_token.map(str::to_string),
            ));
            match self.outcome {
                Outcome::File(content) => Ok(RemoteFile {
                    path: path.to_string(),
                    sha: "blob123".to_string(),
                    content: content.to_string(),
                }),
                Outcome::GitHub(status) => Err(GitHubError::new("Not Found", status).into()),
                Outcome::Io => Err(std::io::Error::other("connection reset").into()),
            }
        }
    }

    fn request() -> PreviewRequest {
        PreviewRequest {
            github_access_token: Some("secret".to_string()),
            fork_full_name: "alice/site".to_string(),
            head_branch: "edits".to_string(),
            file_relative_path: "content/home.json".to_string(),
        }
    }

    #[tokio::test]
    async fn parses_fetched_file() {
        let fetcher = MockFetcher::new(Outcome::File(r#"{"title":"Home"}"#));
        let props = get_github_preview_props(&request(), &fetcher, parse_json::<Value>)
            .await
            .unwrap();

        assert!(props.preview);
        assert!(props.error.is_none());
        let file = props.file.unwrap();
        assert_eq!(file.sha, "blob123");
        assert_eq!(file.file_relative_path, "content/home.json");
        assert_eq!(file.data["title"], "Home");

        let seen = fetcher.seen.lock().unwrap().clone().unwrap();
        assert_eq!(
            seen,
            (
                "alice/site".to_string(),
                "edits".to_string(),
                "content/home.json".to_string(),
                Some("secret".to_string())
            )
        );
    }

    #[tokio::test]
    async fn github_404_becomes_error_data() {
        let fetcher = MockFetcher::new(Outcome::GitHub(404));
        let props = get_github_preview_props(&request(), &fetcher, parse_json::<Value>)
            .await
            .unwrap();

        assert!(props.preview);
        assert!(props.file.is_none());
        assert_eq!(props.error.as_ref().map(|e| e.status), Some(404));

        let json = serde_json::to_value(&props).unwrap();
        assert_eq!(json["file"], Value::Null);
        assert_eq!(json["error"]["status"], 404);
        assert_eq!(json["preview"], true);
        assert_eq!(json["sourceProvider"]["forkFullName"], "alice/site");
        assert_eq!(json["sourceProvider"]["headBranch"], "edits");
    }

    #[tokio::test]
    async fn github_error_log_reports_token_presence_only() {
        let logs = CapturedLogs::default();
        let _guard = tracing::subscriber::set_default(logs.subscriber());

        let fetcher = MockFetcher::new(Outcome::GitHub(404));
        get_github_preview_props(&request(), &fetcher, parse_text)
            .await
            .unwrap();

        let out = logs.contents();
        assert!(out.contains("WARN"), "{out}");
        assert!(out.contains("has_token=true"), "{out}");
        assert!(out.contains("content/home.json"), "{out}");
        assert!(out.contains("alice/site"), "{out}");
        assert!(!out.contains("secret"), "{out}");
    }

    #[tokio::test]
    async fn github_error_log_without_token() {
        let logs = CapturedLogs::default();
        let _guard = tracing::subscriber::set_default(logs.subscriber());

        let mut req = request();
        req.github_access_token = None;
        let fetcher = MockFetcher::new(Outcome::GitHub(401));
        get_github_preview_props(&req, &fetcher, parse_text)
            .await
            .unwrap();

        assert!(logs.contents().contains("has_token=false"));
    }

    #[tokio::test]
    async fn other_failures_propagate() {
        let fetcher = MockFetcher::new(Outcome::Io);
        let err = get_github_preview_props(&request(), &fetcher, parse_text)
            .await
            .unwrap_err();
        assert!(matches!(err, ForkeditError::Io(_)));
    }

    #[tokio::test]
    async fn parse_failures_propagate() {
        let fetcher = MockFetcher::new(Outcome::File("not json"));
        let err = get_github_preview_props(&request(), &fetcher, parse_json::<Value>)
            .await
            .unwrap_err();
        assert!(matches!(err, ForkeditError::Json(_)));
    }

    #[tokio::test]
    async fn serialized_success_uses_camel_case() {
        let fetcher = MockFetcher::new(Outcome::File("title = \"Home\"\n"));
        let props = get_github_preview_props(&request(), &fetcher, parse_toml::<Value>)
            .await
            .unwrap();

        let json = serde_json::to_value(&props).unwrap();
        assert_eq!(json["file"]["fileRelativePath"], "content/home.json");
        assert_eq!(json["file"]["data"], json!({ "title": "Home" }));
        assert_eq!(json["error"], Value::Null);
    }

    #[tokio::test]
    async fn bad_fork_name_propagates() {
        let mut req = request();
        req.fork_full_name = "not-a-repo".to_string();
        let fetcher = MockFetcher::new(Outcome::File("x"));
        let err = get_github_preview_props(&req, &fetcher, parse_text)
            .await
            .unwrap_err();
        assert!(matches!(err, ForkeditError::InvalidRepo(_)));
    }
}
