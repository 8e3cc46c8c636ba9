//! GraphQL response types.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fmt;

use crate::error::NetworkError;

/// Error message a server returns when it does not implement persisted queries.
pub const PERSISTED_QUERY_NOT_SUPPORTED: &str = "PersistedQueryNotSupported";

/// Error message a server returns when it does not know the sent hash.
pub const PERSISTED_QUERY_NOT_FOUND: &str = "PersistedQueryNotFound";

/// A persisted query protocol signal carried in a GraphQL error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersistedQuerySignal {
    /// The server does not support persisted queries. Never retried.
    NotSupported,
    /// The server has no document for the hash. Resend with the full query.
    NotFound,
}

impl PersistedQuerySignal {
    /// All recognized signals.
    pub const ALL: [Self; 2] = [Self::NotSupported, Self::NotFound];

    /// The literal error message for this signal.
    pub fn message(self) -> &'static str {
        match self {
            Self::NotSupported => PERSISTED_QUERY_NOT_SUPPORTED,
            Self::NotFound => PERSISTED_QUERY_NOT_FOUND,
        }
    }

    /// Match an error message against the recognized signals.
    pub fn from_message(message: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|signal| signal.message() == message)
    }
}

impl fmt::Display for PersistedQuerySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A GraphQL error returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    /// The error message.
    pub message: String,

    /// Locations in the document where the error occurred.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<GraphQLLocation>,

    /// Path to the field that caused the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,

    /// Additional error metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphQLError {
    /// Create an error with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: None,
            extensions: None,
        }
    }
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref path) = self.path {
            write!(f, " (at ")?;
            for (i, segment) in path.iter().enumerate() {
                if i > 0 {
                    write!(f, ".")?;
                }
                match segment {
                    PathSegment::Field(name) => write!(f, "{}", name)?,
                    PathSegment::Index(idx) => write!(f, "[{}]", idx)?,
                }
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl std::error::Error for GraphQLError {}

/// A location in a GraphQL document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQLLocation {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub column: u32,
}

/// A segment in an error path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// A field name.
    Field(String),
    /// An array index.
    Index(usize),
}

/// A GraphQL response from the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQLResponse {
    /// The data returned by the operation.
    #[serde(default)]
    pub data: Option<Value>,

    /// Errors that occurred during execution.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,

    /// Additional response metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphQLResponse {
    /// Create a successful response carrying data.
    pub fn from_data(data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    /// Create a response carrying only errors.
    pub fn from_errors(errors: impl IntoIterator<Item = GraphQLError>) -> Self {
        Self {
            data: None,
            errors: errors.into_iter().collect(),
            extensions: None,
        }
    }

    /// Check if the response contains errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Check if the response was successful (has data and no errors).
    pub fn is_success(&self) -> bool {
        self.data.is_some() && self.errors.is_empty()
    }

    /// Get the first error, if any.
    pub fn first_error(&self) -> Option<&GraphQLError> {
        self.errors.first()
    }

    /// The persisted query signal carried by this response.
    ///
    /// Only a response with exactly one error can carry a signal; responses
    /// with zero or several errors are ordinary results.
    pub fn persisted_query_signal(&self) -> Option<PersistedQuerySignal> {
        match self.errors.as_slice() {
            [error] => PersistedQuerySignal::from_message(&error.message),
            _ => None,
        }
    }

    /// Get all errors as a combined message.
    pub fn error_message(&self) -> Option<String> {
        if self.errors.is_empty() {
            None
        } else {
            Some(
                self.errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        }
    }

    /// Parse the data as a specific type.
    ///
    /// Returns an error if the response has errors or if parsing fails.
    pub fn data<T: DeserializeOwned>(&self) -> Result<T, NetworkError> {
        if let Some(ref errors) = self.error_message() {
            return Err(NetworkError::Request(format!("GraphQL error: {}", errors)));
        }

        match &self.data {
            Some(data) => serde_json::from_value(data.clone()).map_err(|e| {
                NetworkError::Json(format!("Failed to deserialize GraphQL response: {}", e))
            }),
            None => Err(NetworkError::InvalidBody("No data in GraphQL response".into())),
        }
    }
}
