//! Automatic Persisted Queries for Horizon Lattice.
//!
//! This crate provides the client side of the Automatic Persisted Queries
//! (APQ) protocol as middleware for a GraphQL network layer:
//!
//! - **Hash-first requests**: the query document is replaced by its SHA-256
//!   hash, either precomputed (`Operation::id`) or computed on demand by a
//!   caller-supplied hash function
//! - **GET for queries**: hash-only queries can be sent as cacheable GET
//!   requests; mutations always keep their original method
//! - **Negotiation**: a `PersistedQueryNotFound` answer triggers exactly one
//!   retry carrying the full document, sent with the original method
//!
//! # Example
//!
//! ```ignore
//! use horizon_lattice_apq::{NetworkLayer, Operation, PersistedQueries};
//!
//! let network = NetworkLayer::builder("https://api.example.com/graphql")
//!     .middleware(
//!         PersistedQueries::builder()
//!             .use_get_for_hashed_queries(true)
//!             .hash(|query| sha256_hex(query))
//!             .build()?,
//!     )
//!     .build()?;
//!
//! let operation = Operation::from_document(
//!     "GetUser",
//!     "query GetUser { getUser { id name } }",
//! );
//! let response = network.fetch(operation, Default::default()).await?;
//! ```
//!
//! # Writing Middleware
//!
//! ```ignore
//! use horizon_lattice_apq::{Middleware, NetworkRequest, Next, GraphQLResponse, Result};
//! use futures_util::future::BoxFuture;
//!
//! struct Logger;
//!
//! impl Middleware for Logger {
//!     fn process<'a>(
//!         &'a self,
//!         request: NetworkRequest,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Result<GraphQLResponse>> {
//!         Box::pin(async move {
//!             let response = next.run(request).await?;
//!             println!("errors: {}", response.errors.len());
//!             Ok(response)
//!         })
//!     }
//! }
//! ```

mod error;
mod middleware;
mod network_layer;
mod operation;
mod payload;
mod persisted_queries;
mod request;
mod response;
pub mod testing;
mod transport;

pub use error::{NetworkError, Result};
pub use middleware::{Middleware, Next, Transport};
pub use network_layer::{NetworkLayer, NetworkLayerBuilder};
pub use operation::{Operation, OperationKind};
pub use payload::{PERSISTED_QUERY_VERSION, PayloadExtensions, PersistedQuery, PersistedQueryPayload};
pub use persisted_queries::{
    DEFAULT_ENDPOINT, PersistedQueries, PersistedQueriesBuilder, PersistedQueriesConfig,
    QueryHasher,
};
pub use request::{
    BatchRequest, FetchOptions, HttpMethod, NetworkRequest, Request, RequestBody, Variables,
};
pub use response::{
    GraphQLError, GraphQLLocation, GraphQLResponse, PERSISTED_QUERY_NOT_FOUND,
    PERSISTED_QUERY_NOT_SUPPORTED, PathSegment, PersistedQuerySignal,
};
pub use transport::{HttpTransport, HttpTransportBuilder, HttpTransportConfig};
