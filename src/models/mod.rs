//! Data models for ovsdb-link.
//!
//! Schema and value types, the select query model, the JSON-RPC
//! envelopes exchanged with the server, and the OVN northbound records.

pub mod acl;
pub mod column_type;
pub mod condition;
pub mod coverage_counter;
pub mod error_detail;
pub mod logical_switch_port;
pub mod operation;
pub mod result_set;
pub mod rpc_message;
pub mod rpc_request;
pub mod schema;
pub mod typed_value;


pub use acl::Acl;
pub use column_type::{AtomicType, BaseType, ColumnType, DataType, MaxSize};
pub use condition::{Condition, ConditionFunction};
pub use coverage_counter::CoverageCounter;
pub use error_detail::ErrorDetail;
pub use logical_switch_port::{LogicalPortAddress, LogicalSwitchPort, MacAddress};
pub use operation::{IntoOperation, Operation};
pub use result_set::{ResultSet, Row};
pub use rpc_message::JsonRpcMessage;
pub use rpc_request::{JsonRpcReply, JsonRpcRequest};
pub use schema::{DatabaseSchema, TableSchema};
pub use typed_value::TypedValue;
