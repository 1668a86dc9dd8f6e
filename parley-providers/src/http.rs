//! HTTP client abstraction and utilities

use crate::constants::DEFAULT_TIMEOUT_SECS;
use crate::error::HttpError;
use bytes::Bytes;
use futures::Stream;
use parley_core::Error;
use pin_project::pin_project;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{Instant, Sleep};

/// Type alias for response byte streams
pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>;

/// HTTP client abstraction
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync {
    /// Send a POST request and decode the JSON reply
    async fn post(&self, url: &str, headers: HeaderMap, body: Value) -> Result<Value, HttpError>;

    /// Send a POST request and hand back the raw body stream
    async fn post_stream(
        &self,
        url: &str,
        headers: HeaderMap,
        body: Value,
    ) -> Result<ResponseStream, HttpError>;
}

/// Default HTTP client implementation using reqwest
///
/// Every call is bounded. One-shot requests carry a total timeout. Streaming
/// requests bound the wait for response headers, and the body is then bounded
/// by an idle timeout between chunks, so a long healthy stream is never cut
/// but a stalled one is.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestClient {
    /// Create a new HTTP client with the default timeout
    pub fn new() -> Result<Self, Error> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a new HTTP client with a custom timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    /// The configured timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, HttpError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(HttpError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait::async_trait]
impl HttpClient for ReqwestClient {
    async fn post(&self, url: &str, headers: HeaderMap, body: Value) -> Result<Value, HttpError> {
        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let bytes = response.bytes().await?;

        serde_json::from_slice(&bytes).map_err(HttpError::Decode)
    }

    async fn post_stream(
        &self,
        url: &str,
        headers: HeaderMap,
        body: Value,
    ) -> Result<ResponseStream, HttpError> {
        let request = self.client.post(url).headers(headers).json(&body).send();

        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| HttpError::Timeout)??;

        let response = tokio::time::timeout(self.timeout, Self::check_status(response))
            .await
            .map_err(|_| HttpError::Timeout)??;

        let bytes = response.bytes_stream();
        Ok(Box::pin(IdleTimeout::new(bytes, self.timeout)))
    }
}

/// Stream adapter that fails once the inner stream goes quiet for too long
///
/// After the idle error is yielded the stream ends.
#[pin_project]
pub struct IdleTimeout<S> {
    #[pin]
    inner: S,
    #[pin]
    sleep: Sleep,
    idle: Duration,
    expired: bool,
}

impl<S> IdleTimeout<S> {
    /// Wrap a stream with an idle limit
    pub fn new(inner: S, idle: Duration) -> Self {
        Self {
            inner,
            sleep: tokio::time::sleep(idle),
            idle,
            expired: false,
        }
    }
}

impl<S, E> Stream for IdleTimeout<S>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<HttpError>,
{
    type Item = Result<Bytes, HttpError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        if *this.expired {
            return Poll::Ready(None);
        }

        match this.inner.poll_next(cx) {
            Poll::Ready(Some(item)) => {
                let deadline = Instant::now() + *this.idle;
                this.sleep.as_mut().reset(deadline);
                Poll::Ready(Some(item.map_err(Into::into)))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => match this.sleep.as_mut().poll(cx) {
                Poll::Ready(()) => {
                    *this.expired = true;
                    Poll::Ready(Some(Err(HttpError::Idle(*this.idle))))
                }
                Poll::Pending => Poll::Pending,
            },
        }
    }
}

/// Helper to create JSON headers with bearer authorization
pub fn create_headers(api_key: &str, additional: Option<HeaderMap>) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();

    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| Error::Configuration(format!("Invalid API key: {}", e)))?,
    );

    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Some(additional) = additional {
        headers.extend(additional);
    }

    Ok(headers)
}
