use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Error object reported by an OVSDB server.
///
/// Appears either as the JSON-RPC `error` member or as one element of a
/// `transact` result array.
///
/// # Example JSON
///
/// ```json
/// {"error": "unknown database", "details": "get_schema request specifies unknown database Foo"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Short error tag, e.g. `"syntax error"` or `"constraint violation"`
    pub error: String,

    /// Optional human-readable explanation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorDetail {
    /// Interpret a JSON-RPC `error` member, which servers send either as an
    /// object or as a bare string.
    pub fn from_rpc_error(raw: &JsonValue) -> Self {
        match raw {
            JsonValue::String(s) => Self {
                error: s.clone(),
                details: None,
            },
            other => serde_json::from_value(other.clone()).unwrap_or_else(|_| Self {
                error: other.to_string(),
                details: None,
            }),
        }
    }

    /// Extract the error from one `transact` result element, if it is one.
    pub fn from_outcome(raw: &JsonValue) -> Option<Self> {
        match raw.get("error")? {
            JsonValue::Null => None,
            _ => Some(Self::from_rpc_error(raw)),
        }
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{}: {}", self.error, details),
            None => write!(f, "{}", self.error),
        }
    }
}
