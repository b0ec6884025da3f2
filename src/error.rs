use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A non-2xx answer from GitHub, as relayed by the proxy or returned to the
/// preview fetcher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("github returned {status}: {message}")]
pub struct GitHubError {
    pub message: String,
    pub status: u16,
}

impl GitHubError {
    pub fn new(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }

    pub fn to_data(&self) -> ErrorData {
        ErrorData {
            version: ErrorData::VERSION,
            message: self.message.clone(),
            status: self.status,
        }
    }
}

/// Plain-data form of a [`GitHubError`] that can cross a render boundary as
/// JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorData {
    pub version: u32,
    pub message: String,
    pub status: u16,
}

impl ErrorData {
    pub const VERSION: u32 = 1;
}

#[derive(Error, Debug)]
pub enum ForkeditError {
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error("no fork recorded in the session; create a fork first")]
    MissingFork,

    #[error("invalid repository name {0:?}: expected owner/repo")]
    InvalidRepo(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("octocrab error: {0}")]
    Octocrab(#[from] octocrab::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("toml encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("content is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("{0} is not a file")]
    NotAFile(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ForkeditError {
    /// The GitHub-originated error, if this is one.
    pub fn as_github(&self) -> Option<&GitHubError> {
        match self {
            ForkeditError::GitHub(e) => Some(e),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.as_github().map(|e| e.status)
    }
}

pub type Result<T> = std::result::Result<T, ForkeditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_data_carries_status_and_version() {
        let err = GitHubError::new("Not Found", 404);
        let data = err.to_data();
        assert_eq!(data.status, 404);
        assert_eq!(data.version, ErrorData::VERSION);

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["message"], "Not Found");
        assert_eq!(json["status"], 404);
    }

    #[test]
    fn status_only_for_github_errors() {
        let gh: ForkeditError = GitHubError::new("Conflict", 409).into();
        assert_eq!(gh.status(), Some(409));
        assert_eq!(ForkeditError::MissingFork.status(), None);
    }
}
