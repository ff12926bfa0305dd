use serde::Deserialize;
use serde_json::Value as JsonValue;

/// Any JSON-RPC message read from the server.
///
/// Responses carry `result`/`error`; server-initiated requests and
/// notifications carry `method`/`params`.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcMessage {
    #[serde(default)]
    pub method: Option<String>,

    #[serde(default)]
    pub params: Option<JsonValue>,

    #[serde(default)]
    pub result: Option<JsonValue>,

    #[serde(default)]
    pub error: Option<JsonValue>,

    #[serde(default)]
    pub id: JsonValue,
}

impl JsonRpcMessage {
    pub fn is_request(&self) -> bool {
        self.method.is_some()
    }

    /// Whether this message answers the request with numeric id `id`.
    pub fn answers(&self, id: u64) -> bool {
        self.id.as_u64() == Some(id)
    }
}
