use crate::github::client::DEFAULT_API_BASE;
use crate::session::DEFAULT_BRANCH;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    pub proxy_url: String,
    pub api_base: String,
    pub base_repo: Option<String>,
    pub base_branch: String,
    pub github_token: Option<String>,
    pub session_path: Option<PathBuf>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("proxy_url", &self.proxy_url)
            .field("api_base", &self.api_base)
            .field("base_repo", &self.base_repo)
            .field("base_branch", &self.base_branch)
            .field("github_token", &self.github_token.as_ref().map(|_| "[REDACTED]"))
            .field("session_path", &self.session_path)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy_url: "http://localhost:3000/api/proxy-github".to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            base_repo: None,
            base_branch: DEFAULT_BRANCH.to_string(),
            github_token: None,
            session_path: None,
        }
    }
}

impl Config {
    pub fn load(config_file: Option<PathBuf>) -> Self {
        let config_file = config_file.unwrap_or_else(|| config_dir().join("forkedit").join("config.toml"));
        Self::load_from(&config_file)
    }

    fn load_from(config_file: &Path) -> Self {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        if config_file.exists() {
            figment = figment.merge(Toml::file(config_file));
        }

        figment = figment.merge(Env::prefixed("FORKEDIT_")).merge(
            Env::raw()
                .only(&["GITHUB_TOKEN"])
                .map(|_| "github_token".into()),
        );

        match figment.extract() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("config parse error, using defaults: {e}");
                Config::default()
            }
        }
    }

    pub fn session_path(&self) -> PathBuf {
        self.session_path
            .clone()
            .unwrap_or_else(|| config_dir().join("forkedit").join("session.toml"))
    }
}

pub fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from("."))
}
