//! Wire payload for persisted query requests.

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::request::Variables;

/// Persisted query protocol version sent in every payload.
pub const PERSISTED_QUERY_VERSION: u32 = 1;

/// The `extensions.persistedQuery` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedQuery {
    /// Protocol version, always [`PERSISTED_QUERY_VERSION`].
    pub version: u32,
    /// Hex-encoded SHA-256 of the query document.
    pub sha256_hash: String,
}

/// The `extensions` object of a persisted query payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadExtensions {
    /// The persisted query descriptor.
    pub persisted_query: PersistedQuery,
}

/// The body of a persisted query request.
///
/// Serializes as
/// `{ operationName, variables, extensions: { persistedQuery: { version, sha256Hash } } }`
/// with a trailing `query` field only on the fallback attempt. Field order is
/// the wire order for both JSON bodies and GET query strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedQueryPayload {
    /// The operation name.
    pub operation_name: String,
    /// Operation variables.
    pub variables: Variables,
    /// Protocol extensions.
    pub extensions: PayloadExtensions,
    /// The full query document, sent only when negotiating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl PersistedQueryPayload {
    /// Create a hash-only payload.
    pub fn new(
        operation_name: impl Into<String>,
        variables: Variables,
        sha256_hash: impl Into<String>,
    ) -> Self {
        Self {
            operation_name: operation_name.into(),
            variables,
            extensions: PayloadExtensions {
                persisted_query: PersistedQuery {
                    version: PERSISTED_QUERY_VERSION,
                    sha256_hash: sha256_hash.into(),
                },
            },
            query: None,
        }
    }

    /// A copy of this payload extended with the full query document.
    pub fn with_query(&self, query: Option<&str>) -> Self {
        Self {
            query: query.map(str::to_owned),
            ..self.clone()
        }
    }

    /// The hash carried by this payload.
    pub fn sha256_hash(&self) -> &str {
        &self.extensions.persisted_query.sha256_hash
    }

    /// Serialize to a JSON body.
    pub fn to_body(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Encode the top-level fields as query parameters, in payload order.
    ///
    /// String fields are sent as-is; object fields are JSON-serialized.
    pub fn query_pairs(&self) -> Result<Vec<(&'static str, String)>> {
        let mut pairs = vec![
            ("operationName", self.operation_name.clone()),
            ("variables", serde_json::to_string(&self.variables)?),
            ("extensions", serde_json::to_string(&self.extensions)?),
        ];
        if let Some(query) = &self.query {
            pairs.push(("query", query.clone()));
        }
        Ok(pairs)
    }

    /// Convert to a JSON value.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
