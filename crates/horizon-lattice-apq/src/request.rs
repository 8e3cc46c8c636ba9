//! Request types flowing through the middleware pipeline.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::operation::Operation;

/// Variables passed alongside an operation.
pub type Variables = Map<String, Value>;

/// HTTP request methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    /// HTTP GET method.
    Get,
    /// HTTP POST method.
    #[default]
    Post,
    /// HTTP PUT method.
    Put,
    /// HTTP PATCH method.
    Patch,
}

impl HttpMethod {
    /// Convert to reqwest method.
    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Patch => write!(f, "PATCH"),
        }
    }
}

/// The body of an HTTP request.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestBody {
    /// No body.
    #[default]
    None,
    /// Plain text body, typically pre-serialized JSON.
    Text(String),
}

impl RequestBody {
    /// Check if there is no body.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Get the body as text, if it is a text body.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::None => None,
        }
    }
}

/// Transport options for a single physical attempt.
///
/// Middleware never mutates the options a request was created with; it
/// derives a fresh value per attempt with [`Request::with_fetch_opts`].
#[derive(Clone, Debug, Default)]
pub struct FetchOptions {
    /// The HTTP method.
    pub method: HttpMethod,
    /// The request URL. When absent the stage performing the call decides.
    pub url: Option<String>,
    /// Request headers.
    pub headers: http::HeaderMap,
    /// Request body.
    pub body: RequestBody,
}

impl FetchOptions {
    /// Create fetch options for the given method and URL.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: Some(url.into()),
            headers: http::HeaderMap::new(),
            body: RequestBody::None,
        }
    }

    /// Add a header.
    pub fn header(
        mut self,
        name: impl TryInto<http::HeaderName>,
        value: impl TryInto<http::HeaderValue>,
    ) -> Self {
        if let (Ok(name), Ok(value)) = (name.try_into(), value.try_into()) {
            self.headers.insert(name, value);
        }
        self
    }
}

/// A single GraphQL request: an operation, its variables, and how to send it.
#[derive(Clone, Debug)]
pub struct Request {
    operation: Arc<Operation>,
    variables: Variables,
    fetch_opts: FetchOptions,
}

impl Request {
    /// Create a request with default fetch options (POST, no URL).
    pub fn new(operation: Operation) -> Self {
        Self {
            operation: Arc::new(operation),
            variables: Variables::new(),
            fetch_opts: FetchOptions::default(),
        }
    }

    /// Set the variables.
    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    /// Set a single variable.
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Derive a request with other fetch options, sharing the operation.
    ///
    /// Each physical attempt gets its own request value this way.
    pub fn with_fetch_opts(&self, fetch_opts: FetchOptions) -> Self {
        Self {
            operation: Arc::clone(&self.operation),
            variables: self.variables.clone(),
            fetch_opts,
        }
    }

    /// Get the operation.
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Get the variables.
    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// Get the fetch options.
    pub fn fetch_opts(&self) -> &FetchOptions {
        &self.fetch_opts
    }
}

/// Several requests sent together.
///
/// Batches are only carried by the pipeline; no stage in this crate sends them.
#[derive(Clone, Debug, Default)]
pub struct BatchRequest {
    /// The batched requests.
    pub requests: Vec<Request>,
}

impl BatchRequest {
    /// Create a batch from requests.
    pub fn new(requests: impl IntoIterator<Item = Request>) -> Self {
        Self {
            requests: requests.into_iter().collect(),
        }
    }
}

/// The unit passed between pipeline stages.
#[derive(Clone, Debug)]
pub enum NetworkRequest {
    /// A single operation.
    Single(Request),
    /// A batch of operations.
    Batch(BatchRequest),
}

impl NetworkRequest {
    /// Check if this is a batch.
    pub fn is_batch(&self) -> bool {
        matches!(self, Self::Batch(_))
    }
}

impl From<Request> for NetworkRequest {
    fn from(request: Request) -> Self {
        Self::Single(request)
    }
}

impl From<BatchRequest> for NetworkRequest {
    fn from(batch: BatchRequest) -> Self {
        Self::Batch(batch)
    }
}
