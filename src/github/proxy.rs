use crate::error::{GitHubError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
}

/// What gets POSTed to the proxy. The proxy attaches credentials, replays
/// the call against `url` and relays status and body unchanged.
#[derive(Debug, Clone, Serialize)]
pub struct ProxyRequest {
    pub url: String,
    pub method: Method,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ProxyRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            data: None,
        }
    }

    pub fn post(url: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            url: url.into(),
            method: Method::Post,
            data,
        }
    }

    pub fn put(url: impl Into<String>, data: Value) -> Self {
        Self {
            url: url.into(),
            method: Method::Put,
            data: Some(data),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Value,
}

impl ProxyResponse {
    pub fn is_success(&self) -> bool {
        self.status / 100 == 2
    }

    pub fn into_result<T: DeserializeOwned>(self) -> Result<T> {
        if !self.is_success() {
            return Err(GitHubError::new(self.status_text, self.status).into());
        }
        Ok(serde_json::from_value(self.body)?)
    }
}

#[derive(Clone)]
pub struct ProxyTransport {
    http: reqwest::Client,
    proxy_url: String,
}

impl ProxyTransport {
    pub fn new(proxy_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            proxy_url: proxy_url.to_string(),
        })
    }

    pub async fn send(&self, request: &ProxyRequest) -> Result<ProxyResponse> {
        tracing::debug!(method = ?request.method, url = %request.url, "proxying github request");

        let response = self.http.post(&self.proxy_url).json(request).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };

        Ok(ProxyResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}
