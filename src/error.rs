//! Error types for ovsdb-link.
//!
//! Every public operation returns [`Result`]; nothing in the library panics
//! on malformed input.

use thiserror::Error;

/// Result type for ovsdb-link operations.
pub type Result<T> = std::result::Result<T, OvsdbLinkError>;

/// Errors that can occur while talking to an OVSDB server.
#[derive(Error, Debug)]
pub enum OvsdbLinkError {
    /// Malformed connection string (unsupported scheme, wrong segment count, empty).
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The transport could not be established or broke mid-call.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Query or condition text does not match the supported grammar.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Error envelope from the server, or a response that is not valid JSON-RPC.
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// Schema document lacks required structure, or a query references
    /// a table/column absent from it.
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// A raw value could not be decoded under the requested type.
    #[error("Decode error: {0}")]
    DecodeError(#[from] DecodeError),

    /// No correlated response within the configured timeout.
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// A named database does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The client was closed, or its transport was dropped after a failure.
    #[error("Client is closed")]
    Closed,

    /// Configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A request could not be serialized.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Typed-decoding failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The column has no declared type in the schema.
    #[error("unknown column '{column}' in table '{table}'")]
    UnknownColumn { table: String, column: String },

    /// The caller asked for a type that differs from the declared one.
    #[error("column '{column}' is declared as '{declared}', not '{requested}'")]
    TypeMismatch {
        column: String,
        declared: String,
        requested: String,
    },

    /// The raw value's shape does not match the declared type.
    #[error("column '{column}' expected {expected}: {reason}")]
    InvalidValue {
        column: String,
        expected: String,
        reason: String,
    },

    /// An optional scalar column holds no value (`["set", []]` on the wire).
    #[error("column '{column}' has no value")]
    Absent { column: String },
}

impl OvsdbLinkError {
    /// True when the client transport is gone and a reconnect is required.
    pub fn requires_reconnect(&self) -> bool {
        matches!(
            self,
            OvsdbLinkError::Closed
                | OvsdbLinkError::ConnectionError(_)
                | OvsdbLinkError::TimeoutError(_)
        )
    }
}

impl From<serde_json::Error> for OvsdbLinkError {
    fn from(err: serde_json::Error) -> Self {
        OvsdbLinkError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for OvsdbLinkError {
    fn from(err: toml::de::Error) -> Self {
        OvsdbLinkError::ConfigurationError(format!("TOML parse error: {}", err))
    }
}
