//! The pipeline host that owns the middleware chain.

use std::sync::Arc;

use crate::error::{NetworkError, Result};
use crate::middleware::{Middleware, Next, Transport};
use crate::operation::Operation;
use crate::request::{FetchOptions, HttpMethod, NetworkRequest, Request, Variables};
use crate::response::GraphQLResponse;
use crate::transport::HttpTransport;

/// Builder for creating a network layer.
pub struct NetworkLayerBuilder {
    url: String,
    default_headers: http::HeaderMap,
    middlewares: Vec<Arc<dyn Middleware>>,
    transport: Option<Arc<dyn Transport>>,
    header_error: Option<NetworkError>,
}

impl NetworkLayerBuilder {
    /// Create a builder for the given GraphQL endpoint.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            default_headers: http::HeaderMap::new(),
            middlewares: Vec::new(),
            transport: None,
            header_error: None,
        }
    }

    /// Add a default header to all requests.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (
            http::HeaderName::try_from(name),
            http::HeaderValue::try_from(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.default_headers.insert(name, value);
            }
            (Err(err), _) => {
                self.header_error.get_or_insert(err.into());
            }
            (_, Err(err)) => {
                self.header_error.get_or_insert(err.into());
            }
        }
        self
    }

    /// Set bearer token authentication.
    pub fn bearer_auth(self, token: impl AsRef<str>) -> Self {
        let value = format!("Bearer {}", token.as_ref());
        self.header("Authorization", &value)
    }

    /// Append a middleware. Middleware runs in the order it is added.
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Append a shared middleware.
    pub fn shared_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Use a custom transport instead of [`HttpTransport`].
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Build the network layer.
    pub fn build(self) -> Result<NetworkLayer> {
        if let Some(err) = self.header_error {
            return Err(err);
        }
        url::Url::parse(&self.url)?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new()?),
        };

        Ok(NetworkLayer {
            inner: Arc::new(NetworkLayerInner {
                url: self.url,
                default_headers: self.default_headers,
                middlewares: self.middlewares,
                transport,
            }),
        })
    }
}

struct NetworkLayerInner {
    url: String,
    default_headers: http::HeaderMap,
    middlewares: Vec<Arc<dyn Middleware>>,
    transport: Arc<dyn Transport>,
}

/// Runs GraphQL requests through an ordered middleware chain and a transport.
///
/// # Example
///
/// ```ignore
/// use horizon_lattice_apq::{NetworkLayer, Operation, PersistedQueries};
///
/// let network = NetworkLayer::builder("https://api.example.com/graphql")
///     .bearer_auth("my-token")
///     .middleware(PersistedQueries::builder().build()?)
///     .build()?;
///
/// let operation = Operation::query("Viewer").id(VIEWER_QUERY_HASH);
/// let response = network.fetch(operation, Default::default()).await?;
/// ```
#[derive(Clone)]
pub struct NetworkLayer {
    inner: Arc<NetworkLayerInner>,
}

impl NetworkLayer {
    /// Create a builder for the given GraphQL endpoint.
    pub fn builder(url: impl Into<String>) -> NetworkLayerBuilder {
        NetworkLayerBuilder::new(url)
    }

    /// Get the endpoint URL.
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Get the number of configured middlewares.
    pub fn middleware_count(&self) -> usize {
        self.inner.middlewares.len()
    }

    /// Build the request the layer would send for `operation`.
    ///
    /// The request is a JSON POST to the endpoint carrying the default headers.
    pub fn request(&self, operation: Operation, variables: Variables) -> Request {
        let mut fetch_opts = FetchOptions::new(HttpMethod::Post, self.inner.url.clone())
            .header(http::header::CONTENT_TYPE, "application/json")
            .header(http::header::ACCEPT, "application/json");
        fetch_opts.headers.extend(self.inner.default_headers.clone());

        Request::new(operation)
            .with_variables(variables)
            .with_fetch_opts(fetch_opts)
    }

    /// Fetch a query or mutation.
    ///
    /// Subscriptions need a streaming transport and are rejected.
    pub async fn fetch(
        &self,
        operation: Operation,
        variables: Variables,
    ) -> Result<GraphQLResponse> {
        if operation.is_subscription() {
            return Err(NetworkError::Request(
                "Use a subscription transport for subscription operations".into(),
            ));
        }
        self.execute(self.request(operation, variables)).await
    }

    /// Run a request through the middleware chain.
    pub async fn execute(&self, request: impl Into<NetworkRequest>) -> Result<GraphQLResponse> {
        Next::new(&self.inner.middlewares, self.inner.transport.as_ref())
            .run(request.into())
            .await
    }
}

impl std::fmt::Debug for NetworkLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkLayer")
            .field("url", &self.inner.url)
            .field("middlewares", &self.inner.middlewares.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestBody;
    use crate::testing::RecordingTransport;

    #[test]
    fn test_builder_defaults() {
        let network = NetworkLayer::builder("https://api.example.com/graphql")
            .build()
            .unwrap();

        assert_eq!(network.url(), "https://api.example.com/graphql");
        assert_eq!(network.middleware_count(), 0);
    }

    #[test]
    fn test_builder_rejects_invalid_url() {
        let err = NetworkLayer::builder("graphql").build().unwrap_err();
        assert!(matches!(err, NetworkError::InvalidUrl(_)));
    }

    #[test]
    fn test_builder_rejects_invalid_header() {
        let err = NetworkLayer::builder("https://api.example.com/graphql")
            .header("bad header", "value")
            .build()
            .unwrap_err();
        assert!(matches!(err, NetworkError::InvalidHeader(_)));
    }

    #[test]
    fn test_request_carries_defaults() {
        let network = NetworkLayer::builder("https://api.example.com/graphql")
            .bearer_auth("my-token")
            .transport(RecordingTransport::new())
            .build()
            .unwrap();

        let request = network.request(Operation::query("Viewer"), Variables::new());
        let opts = request.fetch_opts();

        assert_eq!(opts.method, HttpMethod::Post);
        assert_eq!(opts.url.as_deref(), Some("https://api.example.com/graphql"));
        assert_eq!(opts.body, RequestBody::None);
        assert_eq!(
            opts.headers.get("authorization").and_then(|v| v.to_str().ok()),
            Some("Bearer my-token")
        );
        assert_eq!(
            opts.headers.get("content-type").and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn test_fetch_rejects_subscriptions() {
        let network = NetworkLayer::builder("https://api.example.com/graphql")
            .transport(RecordingTransport::new())
            .build()
            .unwrap();

        let err = network
            .fetch(Operation::subscription("OnMessage"), Variables::new())
            .await
            .unwrap_err();
        assert!(matches!(err, NetworkError::Request(_)));
    }
}
