//! Pluggable transports.
//!
//! The client only needs something that POSTs flat arguments to a URL and
//! hands back the decoded JSON body. [`HttpTransport`] does that with
//! reqwest; [`FnTransport`] wraps any async closure; [`EnvelopeTransport`]
//! adapts transports whose bodies arrive wrapped in another object.

use crate::args::RequestArgs;
use crate::config::{BodyEncoding, ClientConfig};
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by transports
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Query endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Response has nothing at {0}")]
    MissingEnvelope(String),

    #[error("{0}")]
    Other(String),
}

/// Posts request arguments and returns the decoded response body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, url: &str, args: &RequestArgs) -> Result<Value, TransportError>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    encoding: BodyEncoding,
    timeout: Duration,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            encoding: BodyEncoding::Form,
            timeout: Duration::from_secs(30),
        }
    }

    /// Build from client configuration (encoding, timeout, user agent).
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            encoding: config.encoding,
            timeout: config.timeout(),
        })
    }

    pub fn with_encoding(mut self, encoding: BodyEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, url: &str, args: &RequestArgs) -> Result<Value, TransportError> {
        let request = self.client.post(url).timeout(self.timeout);
        let request = match self.encoding {
            BodyEncoding::Form => request.form(&args.to_form_pairs()),
            BodyEncoding::Json => request.json(args),
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Transport backed by an async closure.
///
/// ```rust,ignore
/// let transport = FnTransport::new(|_url, _args| {
///     async move { Ok(serde_json::json!({"result": {}})) }.boxed()
/// });
/// ```
pub struct FnTransport<F>(F);

impl<F> FnTransport<F>
where
    F: Fn(String, RequestArgs) -> BoxFuture<'static, Result<Value, TransportError>> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> Transport for FnTransport<F>
where
    F: Fn(String, RequestArgs) -> BoxFuture<'static, Result<Value, TransportError>> + Send + Sync,
{
    async fn post(&self, url: &str, args: &RequestArgs) -> Result<Value, TransportError> {
        (self.0)(url.to_string(), args.clone()).await
    }
}

/// Unwraps bodies that an underlying transport returns inside another
/// object, e.g. `{"status": 200, "data": {...}}` with pointer `/data`.
pub struct EnvelopeTransport<T> {
    inner: T,
    pointer: String,
}

impl<T: Transport> EnvelopeTransport<T> {
    /// `pointer` is a JSON pointer (RFC 6901) to the response body.
    pub fn new(inner: T, pointer: impl Into<String>) -> Self {
        Self {
            inner,
            pointer: pointer.into(),
        }
    }
}

#[async_trait]
impl<T: Transport> Transport for EnvelopeTransport<T> {
    async fn post(&self, url: &str, args: &RequestArgs) -> Result<Value, TransportError> {
        let mut wrapped = self.inner.post(url, args).await?;
        wrapped
            .pointer_mut(&self.pointer)
            .map(Value::take)
            .ok_or_else(|| TransportError::MissingEnvelope(self.pointer.clone()))
    }
}
