//! Automatic Persisted Queries middleware.
//!
//! Sends a content hash in place of the query document. If the server answers
//! with a single `PersistedQueryNotFound` error, the request is sent exactly
//! once more with the full document so the server can store it. A
//! `PersistedQueryNotSupported` answer is returned as-is; every other response
//! and every transport error passes through untouched.
//!
//! # Example
//!
//! ```ignore
//! use horizon_lattice_apq::{NetworkLayer, Operation, PersistedQueries};
//!
//! let persisted_queries = PersistedQueries::builder()
//!     .use_get_for_hashed_queries(true)
//!     .hash(|query| sha256_hex(query))
//!     .build()?;
//!
//! let network = NetworkLayer::builder("https://api.example.com/graphql")
//!     .middleware(persisted_queries)
//!     .build()?;
//!
//! let response = network
//!     .fetch(Operation::from_document("GetUser", "query GetUser { user { id } }"), Default::default())
//!     .await?;
//! ```

use std::sync::Arc;

use futures_util::future::BoxFuture;
use url::Url;

use crate::error::{NetworkError, Result};
use crate::middleware::{Middleware, Next};
use crate::operation::{Operation, OperationKind};
use crate::payload::PersistedQueryPayload;
use crate::request::{FetchOptions, HttpMethod, NetworkRequest, Request, RequestBody};
use crate::response::{GraphQLResponse, PersistedQuerySignal};

/// Endpoint used to build GET URLs for requests that carry no URL.
pub const DEFAULT_ENDPOINT: &str = "http://localhost/graphql";

const MISSING_IDENTITY_MESSAGE: &str =
    "Either query id or hashing function & query must be defined!";

const BATCH_MESSAGE: &str = "Batched requests are not supported by current version.";

/// A function from query document to its hex-encoded SHA-256 hash.
pub type QueryHasher = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Configuration for the persisted queries middleware.
#[derive(Clone, Debug)]
pub struct PersistedQueriesConfig {
    /// Send hash-only queries (never mutations) as GET requests.
    pub use_get_for_hashed_queries: bool,
    /// Base URL for GET requests whose fetch options carry no URL.
    ///
    /// Relative request URLs are resolved against it.
    pub default_endpoint: String,
}

impl Default for PersistedQueriesConfig {
    fn default() -> Self {
        Self {
            use_get_for_hashed_queries: false,
            default_endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

/// Builder for [`PersistedQueries`].
#[derive(Default)]
pub struct PersistedQueriesBuilder {
    config: PersistedQueriesConfig,
    hasher: Option<QueryHasher>,
}

impl PersistedQueriesBuilder {
    /// Create a builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Send hash-only queries as GET requests.
    ///
    /// Mutations and subscriptions keep their original method.
    pub fn use_get_for_hashed_queries(mut self, enabled: bool) -> Self {
        self.config.use_get_for_hashed_queries = enabled;
        self
    }

    /// Set the function used to hash operations that carry no id.
    pub fn hash<F>(mut self, hasher: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.hasher = Some(Arc::new(hasher));
        self
    }

    /// Set a shared hash function.
    pub fn hasher(mut self, hasher: QueryHasher) -> Self {
        self.hasher = Some(hasher);
        self
    }

    /// Set the base URL for GET requests.
    pub fn default_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.default_endpoint = url.into();
        self
    }

    /// Replace the whole configuration, keeping the hash function.
    pub fn config(mut self, config: PersistedQueriesConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the middleware.
    ///
    /// Fails if the default endpoint is not an absolute URL.
    pub fn build(self) -> Result<PersistedQueries> {
        let default_endpoint = Url::parse(&self.config.default_endpoint)?;
        Ok(PersistedQueries {
            config: self.config,
            default_endpoint,
            hasher: self.hasher,
        })
    }
}

/// Middleware implementing the client side of Automatic Persisted Queries.
///
/// The configuration is read-only after construction, so one instance can
/// serve any number of concurrent requests.
#[derive(Clone)]
pub struct PersistedQueries {
    config: PersistedQueriesConfig,
    default_endpoint: Url,
    hasher: Option<QueryHasher>,
}

impl PersistedQueries {
    /// Create a builder.
    pub fn builder() -> PersistedQueriesBuilder {
        PersistedQueriesBuilder::new()
    }

    /// Get the configuration.
    pub fn config(&self) -> &PersistedQueriesConfig {
        &self.config
    }

    /// Resolve the hash identifying `operation`.
    ///
    /// A non-empty `id` wins and the hash function is not called. Otherwise
    /// both a hash function and a non-empty document are required.
    pub fn resolve_hash(&self, operation: &Operation) -> Result<String> {
        if let Some(id) = operation.persisted_id() {
            return Ok(id.to_string());
        }

        match (&self.hasher, operation.document()) {
            (Some(hasher), Some(document)) => Ok(hasher(document)),
            _ => Err(NetworkError::Configuration(MISSING_IDENTITY_MESSAGE.into())),
        }
    }

    /// Run the negotiation for one request.
    pub async fn transform(&self, request: Request, next: Next<'_>) -> Result<GraphQLResponse> {
        let operation = request.operation();
        let payload = PersistedQueryPayload::new(
            operation.name.clone(),
            request.variables().clone(),
            self.resolve_hash(operation)?,
        );

        let optimistic = self.hashed_attempt(&request, &payload)?;
        tracing::debug!(
            target: "horizon_lattice_apq::persisted_queries",
            operation = %operation.name,
            method = %optimistic.fetch_opts().method,
            hash = payload.sha256_hash(),
            "Sending persisted query"
        );

        let response = next.run(optimistic.into()).await?;

        match response.persisted_query_signal() {
            Some(PersistedQuerySignal::NotSupported) => {
                tracing::warn!(
                    target: "horizon_lattice_apq::persisted_queries",
                    operation = %operation.name,
                    "Server does not support persisted queries"
                );
                Ok(response)
            }
            Some(PersistedQuerySignal::NotFound) => {
                tracing::debug!(
                    target: "horizon_lattice_apq::persisted_queries",
                    operation = %operation.name,
                    hash = payload.sha256_hash(),
                    "Persisted query not found, resending with document"
                );
                let fallback = self.negotiation_attempt(&request, &payload)?;
                next.run(fallback.into()).await
            }
            None => {
                tracing::trace!(
                    target: "horizon_lattice_apq::persisted_queries",
                    operation = %operation.name,
                    errors = response.errors.len(),
                    "Passing response through"
                );
                Ok(response)
            }
        }
    }

    /// The optimistic attempt carrying only the hash.
    fn hashed_attempt(&self, request: &Request, payload: &PersistedQueryPayload) -> Result<Request> {
        let original = request.fetch_opts();

        if self.config.use_get_for_hashed_queries
            && request.operation().operation_kind == OperationKind::Query
        {
            let url = self.hashed_query_url(original.url.as_deref(), payload)?;
            return Ok(request.with_fetch_opts(FetchOptions {
                method: HttpMethod::Get,
                url: Some(url.into()),
                headers: original.headers.clone(),
                body: RequestBody::None,
            }));
        }

        Ok(request.with_fetch_opts(FetchOptions {
            body: RequestBody::Text(payload.to_body()?),
            ..original.clone()
        }))
    }

    /// The single retry carrying hash and document, using the original method.
    fn negotiation_attempt(
        &self,
        request: &Request,
        payload: &PersistedQueryPayload,
    ) -> Result<Request> {
        let document = request.operation().document();
        if document.is_none() {
            tracing::warn!(
                target: "horizon_lattice_apq::persisted_queries",
                operation = %request.operation().name,
                "No query document to negotiate with"
            );
        }

        Ok(request.with_fetch_opts(FetchOptions {
            body: RequestBody::Text(payload.with_query(document).to_body()?),
            ..request.fetch_opts().clone()
        }))
    }

    fn hashed_query_url(&self, base: Option<&str>, payload: &PersistedQueryPayload) -> Result<Url> {
        let mut url = match base {
            Some(base) => match Url::parse(base) {
                Ok(url) => url,
                Err(url::ParseError::RelativeUrlWithoutBase) => self.default_endpoint.join(base)?,
                Err(err) => return Err(err.into()),
            },
            None => self.default_endpoint.clone(),
        };

        let pairs = payload.query_pairs()?;
        url.query_pairs_mut().extend_pairs(pairs);
        Ok(url)
    }
}

impl Middleware for PersistedQueries {
    fn process<'a>(
        &'a self,
        request: NetworkRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<GraphQLResponse>> {
        Box::pin(async move {
            match request {
                NetworkRequest::Single(request) => self.transform(request, next).await,
                NetworkRequest::Batch(_) => Err(NetworkError::ProtocolMisuse(BATCH_MESSAGE.into())),
            }
        })
    }
}

impl std::fmt::Debug for PersistedQueries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedQueries")
            .field("config", &self.config)
            .field("has_hasher", &self.hasher.is_some())
            .finish()
    }
}
