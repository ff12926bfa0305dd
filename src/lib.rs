//! # ovsdb-link
//!
//! Async client for OVSDB servers (Open vSwitch and OVN databases) over
//! the JSON-RPC protocol of RFC 7047.
//!
//! ## Architecture
//!
//! ```text
//! query text ──► Operation ──► OvsdbClient::transact ──► ResultSet
//!                    ▲                  │                    │
//!                    │ bind             │ JSON-RPC           │ typed_value
//!               DatabaseSchema ◄── get_schema           TypedValue
//! ```
//!
//! ## Queries
//!
//! Selects are written in a small SQL-like form:
//!
//! ```text
//! SELECT <col>[, <col>...] | * FROM <table> [WHERE <col>==<value>]
//! ```
//!
//! Rows come back raw and are decoded on demand under the column type the
//! schema declares.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ovsdb_link::{OvsdbClient, OvsdbTimeouts};
//!
//! # async fn example() -> ovsdb_link::Result<()> {
//! let client = OvsdbClient::builder()
//!     .endpoint("unix:/var/run/openvswitch/db.sock")
//!     .timeouts(OvsdbTimeouts::fast())
//!     .connect()
//!     .await?;
//!
//! let schema = client.get_schema("Open_vSwitch").await?;
//! let rs = client
//!     .transact("Open_vSwitch", "SELECT name, ports FROM Bridge")
//!     .await?;
//! for i in 0..rs.len() {
//!     let name = rs.typed_value(i, "name", &schema)?;
//!     let ports = rs.typed_value(i, "ports", &schema)?;
//!     println!("{} has {} ports", name, ports.as_set().map_or(0, |p| p.len()));
//! }
//! client.close().await;
//! # Ok(())
//! # }
//! ```

pub mod appctl;
pub mod client;
pub mod config;
mod connection;
pub mod decode;
pub mod endpoint;
pub mod error;
pub mod models;
pub mod ovn;
pub mod timeouts;

pub use appctl::{parse_command_list, parse_coverage};
pub use client::{OvsdbClient, OvsdbClientBuilder};
pub use config::OvsdbLinkConfig;
pub use endpoint::{SocketEndpoint, TransportKind};
pub use error::{DecodeError, OvsdbLinkError, Result};
pub use models::{
    Acl, AtomicType, BaseType, ColumnType, Condition, ConditionFunction, CoverageCounter,
    DataType, DatabaseSchema, ErrorDetail, IntoOperation, LogicalPortAddress, LogicalSwitchPort,
    MacAddress, MaxSize, Operation, ResultSet, Row, TableSchema, TypedValue,
};
pub use timeouts::{OvsdbTimeouts, OvsdbTimeoutsBuilder};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
