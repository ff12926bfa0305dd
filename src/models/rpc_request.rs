use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Outgoing JSON-RPC request.
///
/// `params` is serialized in place so that operations keep their
/// canonical key order on the wire.
///
/// # Example JSON
///
/// ```json
/// {"method": "transact", "params": ["Open_vSwitch", {"op": "select", "table": "Bridge", "where": []}], "id": 3}
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<P> {
    pub method: String,
    pub params: P,
    pub id: u64,
}

impl<P> JsonRpcRequest<P> {
    pub fn new(method: impl Into<String>, params: P, id: u64) -> Self {
        Self {
            method: method.into(),
            params,
            id,
        }
    }
}

/// Reply sent back for a server-initiated request (only `echo` in practice).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcReply {
    pub result: JsonValue,
    pub error: JsonValue,
    pub id: JsonValue,
}

impl JsonRpcReply {
    pub fn success(id: JsonValue, result: JsonValue) -> Self {
        Self {
            result,
            error: JsonValue::Null,
            id,
        }
    }
}
