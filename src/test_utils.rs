#![cfg(test)]

use crate::github::client::ProxyClient;
use crate::github::types::RepoName;
use crate::session::Session;
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Value};
use std::io::Write;
use std::sync::{Arc, Mutex};

pub const API_BASE: &str = "https://api.github.com";

pub fn client_for(server: &ServerGuard, session: Session) -> ProxyClient {
    ProxyClient::new(
        &format!("{}/proxy", server.url()),
        RepoName::new("octo", "site"),
        "main",
        session,
    )
    .unwrap()
    .with_api_base(API_BASE)
}

/// Mocks the proxy relaying `method path` to GitHub and answering with
/// `status` and `body`.
pub async fn proxied(
    server: &mut ServerGuard,
    method: &str,
    path: &str,
    status: usize,
    body: Value,
) -> Mock {
    server
        .mock("POST", "/proxy")
        .match_body(Matcher::PartialJson(json!({
            "url": format!("{API_BASE}{path}"),
            "method": method,
        })))
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

pub fn pull_request_json(number: u64, head_ref: &str, head_repo: &str, base_repo: &str) -> Value {
    json!({
        "number": number,
        "title": format!("PR {number}"),
        "state": "open",
        "head": { "ref": head_ref, "sha": "h", "repo": { "full_name": head_repo } },
        "base": { "ref": "main", "sha": "b", "repo": { "full_name": base_repo } }
    })
}

/// In-memory sink for a test `tracing` subscriber.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        let sink = self.clone();
        tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || sink.clone())
            .finish()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
