//! [`Upstream`] implementation over a reqwest client.

use async_trait::async_trait;
use keepsake_core::{FetchRequest, Payload, Upstream, UpstreamError};
use tracing::debug;

/// Upstream that sends requests through a [`reqwest::Client`].
///
/// Cloning is cheap; clones share the client's connection pool.
#[derive(Debug, Clone, Default)]
pub struct ReqwestUpstream {
    client: reqwest::Client,
}

impl ReqwestUpstream {
    /// Wraps `client`.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// The wrapped client.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    fn build(&self, request: &FetchRequest) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone());
        match request.body() {
            Some(body) => builder.body(body.clone()),
            None => builder,
        }
    }
}

impl From<reqwest::Client> for ReqwestUpstream {
    fn from(client: reqwest::Client) -> Self {
        Self::new(client)
    }
}

#[async_trait]
impl Upstream for ReqwestUpstream {
    async fn call(&self, request: &FetchRequest) -> Result<Payload, UpstreamError> {
        let response = self.build(request).send().await.map_err(classify)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(classify)?;
        debug!(
            method = %request.method(),
            url = %request.url(),
            status = status.as_u16(),
            "upstream responded"
        );

        Ok(Payload::new(status, headers, body))
    }
}

fn classify(error: reqwest::Error) -> UpstreamError {
    if error.is_timeout() {
        UpstreamError::timeout(error)
    } else if error.is_connect() {
        UpstreamError::connect(error)
    } else {
        UpstreamError::other(error)
    }
}
