//! In-memory transport for exercising middleware without a server.

use std::collections::VecDeque;

use futures_util::future::{self, BoxFuture};
use parking_lot::Mutex;
use serde_json::json;

use crate::error::{NetworkError, Result};
use crate::middleware::Transport;
use crate::request::{NetworkRequest, Request};
use crate::response::GraphQLResponse;

/// A transport that records every attempt and replays queued responses.
///
/// When the queue is empty it answers with `{"data": {}}`.
///
/// # Example
///
/// ```ignore
/// let transport = RecordingTransport::new()
///     .respond_with(GraphQLResponse::from_errors([GraphQLError::new("PersistedQueryNotFound")]));
/// ```
#[derive(Debug, Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<Request>>,
    responses: Mutex<VecDeque<Result<GraphQLResponse>>>,
}

impl RecordingTransport {
    /// Create a transport with no queued responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next unanswered call.
    pub fn respond_with(self, response: GraphQLResponse) -> Self {
        self.responses.lock().push_back(Ok(response));
        self
    }

    /// Queue a transport failure for the next unanswered call.
    pub fn fail_with(self, error: NetworkError) -> Self {
        self.responses.lock().push_back(Err(error));
        self
    }

    /// The attempts received so far, in order.
    pub fn calls(&self) -> Vec<Request> {
        self.calls.lock().clone()
    }

    /// The number of attempts received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Transport for RecordingTransport {
    fn fetch(&self, request: NetworkRequest) -> BoxFuture<'_, Result<GraphQLResponse>> {
        let result = match request {
            NetworkRequest::Single(request) => {
                self.calls.lock().push(request);
                self.responses
                    .lock()
                    .pop_front()
                    .unwrap_or_else(|| Ok(GraphQLResponse::from_data(json!({}))))
            }
            NetworkRequest::Batch(_) => Err(NetworkError::ProtocolMisuse(
                "RecordingTransport does not accept batched requests".into(),
            )),
        };
        Box::pin(future::ready(result))
    }
}
