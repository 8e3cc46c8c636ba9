//! HTTP transport: the terminal pipeline stage.

use std::time::Duration;

use futures_util::future::BoxFuture;

use crate::error::{NetworkError, Result};
use crate::middleware::Transport;
use crate::request::{NetworkRequest, Request, RequestBody};
use crate::response::GraphQLResponse;

/// Configuration for the HTTP transport.
#[derive(Clone, Debug)]
pub struct HttpTransportConfig {
    /// Request timeout.
    pub timeout: Option<Duration>,
    /// Connect timeout.
    pub connect_timeout: Option<Duration>,
    /// User agent.
    pub user_agent: Option<String>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
            user_agent: Some(format!(
                "HorizonLattice/{} (Rust)",
                env!("CARGO_PKG_VERSION")
            )),
        }
    }
}

/// Builder for creating an HTTP transport.
#[derive(Default)]
pub struct HttpTransportBuilder {
    config: HttpTransportConfig,
    client: Option<reqwest::Client>,
}

impl HttpTransportBuilder {
    /// Create a builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Disable the request timeout.
    pub fn no_timeout(mut self) -> Self {
        self.config.timeout = None;
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Use an existing reqwest client. Timeouts and user agent are then ignored.
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<HttpTransport> {
        let client = match self.client {
            Some(client) => client,
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = self.config.timeout {
                    builder = builder.timeout(timeout);
                }
                if let Some(timeout) = self.config.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                if let Some(ref user_agent) = self.config.user_agent {
                    builder = builder.user_agent(user_agent);
                }
                builder
                    .build()
                    .map_err(|e| NetworkError::Request(format!("Failed to build HTTP client: {e}")))?
            }
        };

        Ok(HttpTransport {
            client,
            config: self.config,
        })
    }
}

/// Sends each attempt as one HTTP request and parses the GraphQL response.
///
/// Non-2xx statuses become [`NetworkError::HttpStatus`]. Batches are rejected.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: HttpTransportConfig,
}

impl HttpTransport {
    /// Create a transport with default configuration.
    pub fn new() -> Result<Self> {
        HttpTransportBuilder::new().build()
    }

    /// Create a builder.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::new()
    }

    /// Get the configuration.
    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    /// Send a single attempt.
    pub async fn send(&self, request: Request) -> Result<GraphQLResponse> {
        let opts = request.fetch_opts();
        let url = opts
            .url
            .as_deref()
            .ok_or_else(|| NetworkError::InvalidUrl("Request has no URL".into()))?;
        let url = url::Url::parse(url)?;

        tracing::trace!(
            target: "horizon_lattice_apq::transport",
            method = %opts.method,
            url = %url,
            "Sending GraphQL request"
        );

        let mut req_builder = self
            .client
            .request(opts.method.to_reqwest(), url)
            .headers(opts.headers.clone());

        if let RequestBody::Text(text) = &opts.body {
            req_builder = req_builder.body(text.clone());
        }

        let response = req_builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            // A body that cannot be read leaves the message empty.
            let message = response.text().await.ok();
            tracing::debug!(
                target: "horizon_lattice_apq::transport",
                status = status.as_u16(),
                "GraphQL request failed"
            );
            return Err(NetworkError::HttpStatus {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<GraphQLResponse>().await?)
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, request: NetworkRequest) -> BoxFuture<'_, Result<GraphQLResponse>> {
        Box::pin(async move {
            match request {
                NetworkRequest::Single(request) => self.send(request).await,
                NetworkRequest::Batch(_) => Err(NetworkError::ProtocolMisuse(
                    "HttpTransport does not send batched requests".into(),
                )),
            }
        })
    }
}
