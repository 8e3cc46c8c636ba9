//! Middleware and transport seams of the request pipeline.
//!
//! A pipeline is an ordered list of [`Middleware`] ending in a [`Transport`].
//! Each middleware receives the request and a [`Next`] continuation for the
//! rest of the chain. `Next` is `Copy`, so a middleware may call it more than
//! once, e.g. to retry with a corrected request.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::error::Result;
use crate::request::NetworkRequest;
use crate::response::GraphQLResponse;

/// A pipeline stage that can inspect and rewrite requests and responses.
pub trait Middleware: Send + Sync {
    /// Handle a request, delegating to `next` for the rest of the chain.
    fn process<'a>(
        &'a self,
        request: NetworkRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<GraphQLResponse>>;
}

/// The terminal pipeline stage that performs the network call.
pub trait Transport: Send + Sync {
    /// Send one physical request and parse the GraphQL response.
    fn fetch(&self, request: NetworkRequest) -> BoxFuture<'_, Result<GraphQLResponse>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn fetch(&self, request: NetworkRequest) -> BoxFuture<'_, Result<GraphQLResponse>> {
        (**self).fetch(request)
    }
}

/// The remainder of a pipeline after the current middleware.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    middlewares: &'a [Arc<dyn Middleware>],
    transport: &'a dyn Transport,
}

impl<'a> Next<'a> {
    /// Create a continuation over `middlewares` followed by `transport`.
    pub fn new(middlewares: &'a [Arc<dyn Middleware>], transport: &'a dyn Transport) -> Self {
        Self {
            middlewares,
            transport,
        }
    }

    /// Run the rest of the chain.
    pub fn run(self, request: NetworkRequest) -> BoxFuture<'a, Result<GraphQLResponse>> {
        match self.middlewares.split_first() {
            Some((middleware, rest)) => middleware.process(request, Next::new(rest, self.transport)),
            None => self.transport.fetch(request),
        }
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("remaining_middlewares", &self.middlewares.len())
            .finish()
    }
}
