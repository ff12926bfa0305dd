//! OVSDB client with builder pattern.
//!
//! Provides the primary interface for connecting to an OVSDB server and
//! issuing `list_dbs`, `get_schema`, `echo` and `transact` requests.

use crate::{
    connection::Connection,
    endpoint::SocketEndpoint,
    error::{OvsdbLinkError, Result},
    models::{DatabaseSchema, IntoOperation, JsonRpcRequest, Operation, ResultSet},
    timeouts::{with_deadline, OvsdbTimeouts},
};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

/// Client for one OVSDB server.
///
/// Requests on one client are serialized: each call holds the connection
/// until its response arrives. After a transport failure or timeout the
/// connection is dropped and every later call fails with
/// [`OvsdbLinkError::Closed`]; reconnect by building a new client.
///
/// # Examples
///
/// ```rust,no_run
/// use ovsdb_link::OvsdbClient;
/// use std::time::Duration;
///
/// # async fn example() -> ovsdb_link::Result<()> {
/// let client = OvsdbClient::connect("unix:/var/run/openvswitch/db.sock", Duration::from_secs(5)).await?;
///
/// let rs = client
///     .transact("Open_vSwitch", "SELECT ovs_version FROM Open_vSwitch")
///     .await?;
/// println!("{:?}", rs.rows);
///
/// client.close().await;
/// # Ok(())
/// # }
/// ```
pub struct OvsdbClient {
    endpoint: SocketEndpoint,
    timeouts: OvsdbTimeouts,
    connection: Mutex<Option<Connection>>,
    next_id: AtomicU64,
}

impl OvsdbClient {
    /// Create a new builder for configuring the client
    pub fn builder() -> OvsdbClientBuilder {
        OvsdbClientBuilder::new()
    }

    /// Connect with one timeout for both connecting and each request.
    ///
    /// A zero `timeout` means no deadline.
    pub async fn connect(endpoint: &str, timeout: Duration) -> Result<Self> {
        Self::builder().endpoint(endpoint).timeout(timeout).connect().await
    }

    async fn open(endpoint: SocketEndpoint, timeouts: OvsdbTimeouts) -> Result<Self> {
        let connection = Connection::open(&endpoint, timeouts.connection_timeout).await?;
        Ok(Self {
            endpoint,
            timeouts,
            connection: Mutex::new(Some(connection)),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// Get the configured timeouts
    pub fn timeouts(&self) -> &OvsdbTimeouts {
        &self.timeouts
    }

    /// Whether the connection has been closed or dropped.
    pub async fn is_closed(&self) -> bool {
        self.connection.lock().await.is_none()
    }

    /// Release the transport. Calling this more than once is harmless.
    pub async fn close(&self) {
        let connection = self.connection.lock().await.take();
        if let Some(connection) = connection {
            log::debug!("[OVSDB_CONNECT] Closing connection to {}", self.endpoint);
            connection.shutdown().await;
        }
    }

    /// Round-trip `message` through the server's `echo` method.
    pub async fn echo(&self, message: &str) -> Result<()> {
        let result = self.call("echo", [message]).await?;
        match result.as_array().map(Vec::as_slice) {
            Some([JsonValue::String(echoed)]) if echoed == message => Ok(()),
            _ => Err(OvsdbLinkError::ProtocolError(format!(
                "echo returned {} instead of [\"{}\"]",
                result, message
            ))),
        }
    }

    /// Names of the databases the server hosts.
    pub async fn list_databases(&self) -> Result<Vec<String>> {
        let result = self.call("list_dbs", [(); 0]).await?;
        serde_json::from_value(result.clone()).map_err(|_| {
            OvsdbLinkError::ProtocolError(format!(
                "list_dbs returned {} instead of an array of strings",
                result
            ))
        })
    }

    /// Succeed if the server hosts `name`, else fail with `NotFound`.
    pub async fn database_exists(&self, name: &str) -> Result<()> {
        if self.list_databases().await?.iter().any(|db| db == name) {
            Ok(())
        } else {
            Err(OvsdbLinkError::NotFound(format!(
                "database '{}' not found on {}",
                name, self.endpoint
            )))
        }
    }

    /// Fetch and parse the schema of `database`.
    pub async fn get_schema(&self, database: &str) -> Result<DatabaseSchema> {
        let result = self.call("get_schema", [database]).await?;
        DatabaseSchema::from_json(&result)
    }

    /// Run a select against `database`.
    ///
    /// `query` is either query text (`SELECT <cols|*> FROM <table> [WHERE
    /// <col>==<value>]`) or an already built [`Operation`]. Rows are kept
    /// in their raw form; decode them with [`ResultSet::typed_value`].
    pub async fn transact<Q: IntoOperation>(&self, database: &str, query: Q) -> Result<ResultSet> {
        self.ensure_open().await?;
        let operation = query.into_operation()?;
        self.transact_operation(database, &operation).await
    }

    /// Like [`transact`](Self::transact), but checks the query against
    /// `schema` and sends condition values typed for their column.
    ///
    /// When all columns are selected and no rows match, the column list is
    /// taken from the schema.
    pub async fn transact_bound<Q: IntoOperation>(
        &self,
        database: &str,
        query: Q,
        schema: &DatabaseSchema,
    ) -> Result<ResultSet> {
        self.ensure_open().await?;
        if schema.name != database {
            return Err(OvsdbLinkError::SchemaError(format!(
                "schema is for database '{}', not '{}'",
                schema.name, database
            )));
        }
        let operation = query.into_operation()?.bind(schema)?;
        let mut rs = self.transact_operation(database, &operation).await?;
        if rs.columns.is_empty() {
            rs.columns = schema
                .columns(operation.table())
                .into_iter()
                .map(str::to_string)
                .collect();
        }
        Ok(rs)
    }

    async fn transact_operation(&self, database: &str, operation: &Operation) -> Result<ResultSet> {
        let start = Instant::now();
        log::debug!(
            "[OVSDB_TRANSACT] select on {}.{} (columns={:?})",
            database,
            operation.table(),
            operation.columns()
        );

        let result = self.call("transact", (database, operation)).await?;
        let rs = ResultSet::from_transact_result(database, operation, result)?;

        log::debug!(
            "[OVSDB_TRANSACT] {}.{} returned {} rows in {:?}",
            database,
            operation.table(),
            rs.len(),
            start.elapsed()
        );
        Ok(rs)
    }

    /// Connect, run one select, and close on every exit path.
    pub async fn transact_once<Q: IntoOperation>(
        endpoint: &str,
        timeouts: OvsdbTimeouts,
        database: &str,
        query: Q,
    ) -> Result<ResultSet> {
        let operation = query.into_operation()?;
        let client = Self::builder()
            .endpoint(endpoint)
            .timeouts(timeouts)
            .connect()
            .await?;
        let result = client.transact_operation(database, &operation).await;
        client.close().await;
        result
    }

    /// Send an arbitrary method with `args` and return its textual result.
    ///
    /// Used for `ovs-appctl` style commands on a daemon's control socket.
    /// String results are returned as-is; anything else is rendered as JSON.
    pub async fn query_raw(&self, command: &str, args: &[&str]) -> Result<String> {
        let result = self.call(command, args).await?;
        Ok(match result {
            JsonValue::String(text) => text,
            JsonValue::Null => String::new(),
            other => other.to_string(),
        })
    }

    /// A closed client reports `Closed` before looking at its arguments.
    async fn ensure_open(&self) -> Result<()> {
        if self.is_closed().await {
            return Err(OvsdbLinkError::Closed);
        }
        Ok(())
    }

    /// Issue one request under the connection lock.
    async fn call<P: Serialize>(&self, method: &str, params: P) -> Result<JsonValue> {
        let mut guard = self.connection.lock().await;
        let connection = guard.as_mut().ok_or(OvsdbLinkError::Closed)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(method, params, id);
        let start = Instant::now();
        log::debug!("[OVSDB_RPC] -> {} (id={}) to {}", method, id, self.endpoint);

        let result = with_deadline(
            self.timeouts.request_timeout,
            method,
            connection.call(&request),
        )
        .await;

        match &result {
            Ok(_) => {
                log::debug!("[OVSDB_RPC] <- {} (id={}) in {:?}", method, id, start.elapsed());
            }
            Err(e) if e.requires_reconnect() || connection.is_broken() => {
                log::warn!(
                    "[OVSDB_RPC] {} (id={}) failed, dropping connection to {}: {}",
                    method,
                    id,
                    self.endpoint,
                    e
                );
                *guard = None;
            }
            Err(_) => {}
        }
        result
    }
}

/// Builder for configuring [`OvsdbClient`] instances.
#[derive(Debug, Clone, Default)]
pub struct OvsdbClientBuilder {
    endpoint: Option<String>,
    timeouts: OvsdbTimeouts,
}

impl OvsdbClientBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Set the connection string (`unix:<path>` or `[tcp:]<host>:<port>`)
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Use one timeout for both connecting and each request
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeouts = OvsdbTimeouts::uniform(timeout);
        self
    }

    /// Set comprehensive timeout configuration
    ///
    /// This overrides an earlier `timeout()`.
    pub fn timeouts(mut self, timeouts: OvsdbTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Resolve the endpoint and open the connection
    pub async fn connect(self) -> Result<OvsdbClient> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| OvsdbLinkError::ConfigurationError("endpoint is required".into()))?;
        let endpoint = SocketEndpoint::parse(&endpoint)?;
        OvsdbClient::open(endpoint, self.timeouts).await
    }
}
