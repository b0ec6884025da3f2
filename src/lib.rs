//! Fork-and-pull-request content editing against GitHub.
//!
//! [`github::client::ProxyClient`] drives the editing flow (fork, branch,
//! commit, pull request) through a credential-holding proxy.
//! [`preview::get_github_preview_props`] reads a file straight from an
//! editor's fork so unmerged changes can be rendered.

pub mod config;
pub mod encoding;
pub mod error;
pub mod github;
pub mod preview;
pub mod session;
#[cfg(test)]
mod test_utils;

pub use error::{ErrorData, ForkeditError, GitHubError, Result};
pub use session::Session;
