//! GraphQL operation descriptors.

use serde::{Deserialize, Serialize};

/// A GraphQL operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// A query operation (read-only).
    #[default]
    Query,
    /// A mutation operation (modifies data).
    Mutation,
    /// A subscription operation (real-time updates).
    Subscription,
}

impl OperationKind {
    /// Infer the operation kind from a query document.
    ///
    /// Comments, strings and fragment definitions are skipped; the first
    /// operation definition decides. Anonymous shorthand documents (`{ ... }`)
    /// and documents without any operation are queries.
    pub fn infer(document: &str) -> Self {
        operation_definitions(document)
            .first()
            .map(|(kind, _)| *kind)
            .unwrap_or_default()
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "query" => Some(Self::Query),
            "mutation" => Some(Self::Mutation),
            "subscription" => Some(Self::Subscription),
            _ => None,
        }
    }
}

/// The operation definitions of a document as (kind, name) pairs, in order.
fn operation_definitions(document: &str) -> Vec<(OperationKind, Option<&str>)> {
    let mut definitions = Vec::new();
    let mut header: Vec<&str> = Vec::new();

    for token in top_level_tokens(document) {
        if token != "{" {
            header.push(token);
            continue;
        }
        match header.first() {
            None => definitions.push((OperationKind::Query, None)),
            Some(keyword) => {
                if let Some(kind) = OperationKind::from_keyword(keyword) {
                    let name = header.get(1).copied().filter(|name| *name != "@");
                    definitions.push((kind, name));
                }
            }
        }
        header.clear();
    }

    definitions
}

/// Names, `@` and `{` tokens outside selection sets and argument lists.
fn top_level_tokens(document: &str) -> Vec<&str> {
    let bytes = document.as_bytes();
    let mut tokens = Vec::new();
    let mut brace_depth = 0usize;
    let mut paren_depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        let top_level = brace_depth == 0 && paren_depth == 0;
        match bytes[i] {
            b'#' => {
                while i < bytes.len() && bytes[i] != b'\n' && bytes[i] != b'\r' {
                    i += 1;
                }
                continue;
            }
            b'"' => {
                i = skip_string(bytes, i);
                continue;
            }
            b'{' => {
                if top_level {
                    tokens.push("{");
                }
                brace_depth += 1;
            }
            b'}' => brace_depth = brace_depth.saturating_sub(1),
            b'(' => paren_depth += 1,
            b')' => paren_depth = paren_depth.saturating_sub(1),
            b'@' if top_level => tokens.push("@"),
            b if b.is_ascii_alphabetic() || b == b'_' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                if top_level {
                    tokens.push(&document[start..i]);
                }
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    tokens
}

/// Index just past the string literal starting at `start`.
fn skip_string(bytes: &[u8], start: usize) -> usize {
    if bytes[start..].starts_with(b"\"\"\"") {
        let mut i = start + 3;
        while i < bytes.len() {
            if bytes[i] == b'\\' && bytes[i + 1..].starts_with(b"\"\"\"") {
                i += 4;
            } else if bytes[i..].starts_with(b"\"\"\"") {
                return i + 3;
            } else {
                i += 1;
            }
        }
        return bytes.len();
    }

    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            b'\n' | b'\r' => return i,
            _ => i += 1,
        }
    }
    bytes.len()
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::Mutation => write!(f, "mutation"),
            Self::Subscription => write!(f, "subscription"),
        }
    }
}

/// A read-only description of a GraphQL operation.
///
/// An operation is identified either by a precomputed content hash (`id`) or
/// by its document `text`, which a configured hash function turns into an id
/// on demand.
///
/// # Example
///
/// ```ignore
/// use horizon_lattice_apq::Operation;
///
/// let operation = Operation::query("GetUser")
///     .text("query GetUser { user { id name } }")
///     .id("3b569978eefa6cb3241ee5b5abd4ed861d8625030cb91cbcdb0272412aed7b47");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// The operation name sent as `operationName`.
    pub name: String,

    /// The full query document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// A precomputed content hash of the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The operation kind.
    #[serde(default)]
    pub operation_kind: OperationKind,
}

impl Operation {
    /// Create an operation of the given kind.
    pub fn new(name: impl Into<String>, operation_kind: OperationKind) -> Self {
        Self {
            name: name.into(),
            text: None,
            id: None,
            operation_kind,
        }
    }

    /// Create a query operation.
    pub fn query(name: impl Into<String>) -> Self {
        Self::new(name, OperationKind::Query)
    }

    /// Create a mutation operation.
    pub fn mutation(name: impl Into<String>) -> Self {
        Self::new(name, OperationKind::Mutation)
    }

    /// Create a subscription operation.
    pub fn subscription(name: impl Into<String>) -> Self {
        Self::new(name, OperationKind::Subscription)
    }

    /// Create an operation from a document, inferring its kind.
    ///
    /// The kind comes from the operation definition called `name`, or from
    /// the first operation definition when none matches.
    pub fn from_document(name: impl Into<String>, text: impl Into<String>) -> Self {
        let name = name.into();
        let text = text.into();
        let definitions = operation_definitions(&text);
        let operation_kind = definitions
            .iter()
            .find(|(_, defined)| *defined == Some(name.as_str()))
            .or_else(|| definitions.first())
            .map(|(kind, _)| *kind)
            .unwrap_or_default();
        Self {
            name,
            text: Some(text),
            id: None,
            operation_kind,
        }
    }

    /// Set the query document.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the precomputed content hash.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// The precomputed hash, ignoring empty strings.
    pub fn persisted_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// The query document, ignoring empty strings.
    pub fn document(&self) -> Option<&str> {
        self.text.as_deref().filter(|text| !text.is_empty())
    }

    /// Check if this is a subscription.
    pub fn is_subscription(&self) -> bool {
        self.operation_kind == OperationKind::Subscription
    }
}
