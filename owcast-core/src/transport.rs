use async_trait::async_trait;
use reqwest::Client;
use std::fmt::Debug;
use thiserror::Error;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No response was received.
    #[error("{0}")]
    Connect(String),

    /// The request could not be built, so nothing was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A status arrived but the body could not be read.
    #[error("failed to read HTTP {status} response body: {message}")]
    Body { status: u16, message: String },
}

#[async_trait]
pub trait HttpTransport: Send + Sync + Debug {
    /// Issue a single GET; no retries.
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<RawResponse, TransportError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self { http: Client::new() }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<RawResponse, TransportError> {
        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(describe)?;

        let status = res.status().as_u16();
        let body = res.text().await.map_err(|e| TransportError::Body {
            status,
            message: e.without_url().to_string(),
        })?;

        Ok(RawResponse { status, body })
    }
}

fn describe(err: reqwest::Error) -> TransportError {
    // The request URL carries the appid; keep it out of messages.
    let err = err.without_url();
    if err.is_builder() {
        TransportError::InvalidRequest(err.to_string())
    } else if err.is_connect() {
        TransportError::Connect(format!(
            "connection failed ({err}). Check your internet connection."
        ))
    } else if err.is_timeout() {
        TransportError::Connect(format!("request timed out ({err})"))
    } else {
        TransportError::Connect(err.to_string())
    }
}
