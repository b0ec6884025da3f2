use crate::error::{ForkeditError, Result};
use crate::github::types::RepoName;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const FORK_KEY: &str = "fork_full_name";
pub const BRANCH_KEY: &str = "head_branch";
pub const DEFAULT_BRANCH: &str = "master";

/// Everything outside `[A-Za-z0-9/._-]` is escaped in cookie values.
const COOKIE_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'.')
    .remove(b'_')
    .remove(b'-');

/// Fork and branch the editor is working on. Browser front ends keep these
/// two slots in `SameSite=Strict` cookies under [`FORK_KEY`] and
/// [`BRANCH_KEY`]; the CLI keeps them in a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fork_full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_branch: Option<String>,
}

impl Session {
    pub fn new(fork_full_name: Option<String>, head_branch: Option<String>) -> Self {
        Self {
            fork_full_name,
            head_branch,
        }
    }

    pub fn fork(&self) -> Result<RepoName> {
        match self.fork_full_name.as_deref() {
            Some(name) if !name.is_empty() => name.parse(),
            _ => Err(ForkeditError::MissingFork),
        }
    }

    pub fn head_branch(&self) -> &str {
        match self.head_branch.as_deref() {
            Some(b) if !b.is_empty() => b,
            _ => DEFAULT_BRANCH,
        }
    }

    pub fn set_fork(&mut self, full_name: impl Into<String>) {
        self.fork_full_name = Some(full_name.into());
    }

    pub fn set_head_branch(&mut self, branch: impl Into<String>) {
        self.head_branch = Some(branch.into());
    }

    /// `Set-Cookie` values for the slots that are set.
    pub fn set_cookie_headers(&self) -> Vec<String> {
        [
            (FORK_KEY, &self.fork_full_name),
            (BRANCH_KEY, &self.head_branch),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_ref()
                .map(|v| {
                    let v = utf8_percent_encode(v, COOKIE_VALUE);
                    format!("{key}={v}; Path=/; SameSite=Strict")
                })
        })
        .collect()
    }

    /// Reads the two slots out of a `Cookie` request header.
    pub fn from_cookie_header(header: &str) -> Self {
        let mut session = Session::default();
        for pair in header.split(';') {
            let Some((key, value)) = pair.trim().split_once('=') else {
                continue;
            };
            let value = percent_decode_str(value.trim()).decode_utf8_lossy();
            if value.is_empty() {
                continue;
            }
            match key.trim() {
                FORK_KEY => session.set_fork(value.into_owned()),
                BRANCH_KEY => session.set_head_branch(value.into_owned()),
                _ => {}
            }
        }
        session
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}
