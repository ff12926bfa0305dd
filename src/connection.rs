//! JSON-RPC transport over a Unix or TCP stream.
//!
//! OVSDB messages are concatenated JSON values with no length prefix or
//! delimiter, so framing is done by incrementally deserializing from a
//! read buffer. While waiting for a response the connection also answers
//! the server's `echo` keepalive requests and skips notifications.

use bytes::{Buf, BytesMut};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::{
    endpoint::{SocketEndpoint, TransportKind},
    error::{OvsdbLinkError, Result},
    models::{ErrorDetail, JsonRpcMessage, JsonRpcReply, JsonRpcRequest},
    timeouts::with_deadline,
};

/// Maximum size of a single incoming message (64 MiB).
const MAX_MESSAGE_BYTES: usize = 64 << 20;

const READ_CHUNK_BYTES: usize = 8 * 1024;

pub(crate) trait AsyncStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> AsyncStream for T {}

/// One open socket to an OVSDB server.
pub(crate) struct Connection {
    stream: Box<dyn AsyncStream>,
    read_buf: BytesMut,
    endpoint: String,
    /// Set once the byte stream can no longer be trusted to be in sync.
    broken: bool,
}

impl Connection {
    /// Connect to `endpoint`, bounded by `timeout` (zero waits forever).
    pub(crate) async fn open(endpoint: &SocketEndpoint, timeout: Duration) -> Result<Self> {
        log::debug!("[OVSDB_CONNECT] Connecting to {} (timeout={:?})", endpoint, timeout);

        let stream = with_deadline(timeout, "connect", connect_stream(endpoint)).await?;

        log::debug!("[OVSDB_CONNECT] Connected to {}", endpoint);
        Ok(Self {
            stream,
            read_buf: BytesMut::with_capacity(READ_CHUNK_BYTES),
            endpoint: endpoint.to_string(),
            broken: false,
        })
    }

    pub(crate) fn is_broken(&self) -> bool {
        self.broken
    }

    /// Send `request` and wait for the response carrying the same id.
    ///
    /// Returns the `result` member, or a protocol error built from the
    /// server's `error` member.
    pub(crate) async fn call<P: Serialize>(
        &mut self,
        request: &JsonRpcRequest<P>,
    ) -> Result<JsonValue> {
        self.write_message(request).await?;

        loop {
            let message = self.read_message().await?;

            if message.is_request() {
                self.answer_server_request(message).await?;
                continue;
            }
            if message.id.is_null() {
                log::trace!("[OVSDB_RPC] Skipping notification from {}", self.endpoint);
                continue;
            }
            if !message.answers(request.id) {
                self.broken = true;
                return Err(OvsdbLinkError::ProtocolError(format!(
                    "response id {} does not match request id {}",
                    message.id, request.id
                )));
            }

            if let Some(error) = message.error {
                let detail = ErrorDetail::from_rpc_error(&error);
                log::warn!(
                    "[OVSDB_RPC] {} (id={}) failed: {}",
                    request.method,
                    request.id,
                    detail
                );
                return Err(OvsdbLinkError::ProtocolError(detail.to_string()));
            }
            return Ok(message.result.unwrap_or(JsonValue::Null));
        }
    }

    /// Best-effort close of the underlying socket.
    pub(crate) async fn shutdown(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            log::debug!("[OVSDB_CONNECT] Shutdown of {} failed: {}", self.endpoint, e);
        }
    }

    async fn write_message<T: Serialize>(&mut self, message: &T) -> Result<()> {
        let bytes = serde_json::to_vec(message)?;
        let written = async {
            self.stream.write_all(&bytes).await?;
            self.stream.flush().await
        }
        .await;

        written.map_err(|e| {
            self.broken = true;
            OvsdbLinkError::ConnectionError(format!("write to {} failed: {}", self.endpoint, e))
        })
    }

    async fn read_message(&mut self) -> Result<JsonRpcMessage> {
        loop {
            if let Some(message) = self.try_decode()? {
                return Ok(message);
            }
            if self.read_buf.len() > MAX_MESSAGE_BYTES {
                self.broken = true;
                return Err(OvsdbLinkError::ProtocolError(format!(
                    "message from {} exceeds {} bytes",
                    self.endpoint, MAX_MESSAGE_BYTES
                )));
            }

            self.read_buf.reserve(READ_CHUNK_BYTES);
            let n = self.stream.read_buf(&mut self.read_buf).await.map_err(|e| {
                self.broken = true;
                OvsdbLinkError::ConnectionError(format!("read from {} failed: {}", self.endpoint, e))
            })?;
            if n == 0 {
                self.broken = true;
                return Err(OvsdbLinkError::ConnectionError(format!(
                    "{} closed the connection",
                    self.endpoint
                )));
            }
        }
    }

    /// Pop one complete message off the read buffer, if there is one.
    fn try_decode(&mut self) -> Result<Option<JsonRpcMessage>> {
        match self.read_buf.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(start) => self.read_buf.advance(start),
            None => {
                self.read_buf.clear();
                return Ok(None);
            }
        }

        let (decoded, consumed) = {
            let mut stream =
                serde_json::Deserializer::from_slice(&self.read_buf).into_iter::<JsonRpcMessage>();
            let decoded = stream.next();
            (decoded, stream.byte_offset())
        };

        match decoded {
            Some(Ok(message)) => {
                self.read_buf.advance(consumed);
                Ok(Some(message))
            }
            Some(Err(e)) if e.is_eof() => Ok(None),
            Some(Err(e)) => {
                self.broken = true;
                Err(OvsdbLinkError::ProtocolError(format!(
                    "malformed message from {}: {}",
                    self.endpoint, e
                )))
            }
            None => Ok(None),
        }
    }

    async fn answer_server_request(&mut self, message: JsonRpcMessage) -> Result<()> {
        match message.method.as_deref() {
            Some("echo") => {
                log::trace!("[OVSDB_RPC] Answering keepalive echo from {}", self.endpoint);
                let params = message.params.unwrap_or_else(|| JsonValue::Array(Vec::new()));
                self.write_message(&JsonRpcReply::success(message.id, params))
                    .await
            }
            other => {
                log::trace!(
                    "[OVSDB_RPC] Ignoring server request {:?} from {}",
                    other,
                    self.endpoint
                );
                Ok(())
            }
        }
    }
}

async fn connect_stream(endpoint: &SocketEndpoint) -> Result<Box<dyn AsyncStream>> {
    match endpoint.kind() {
        TransportKind::Unix => connect_unix(endpoint.address()).await,
        TransportKind::Tcp => {
            let (host, port) = endpoint.tcp_host_port()?;
            let stream = TcpStream::connect((host, port)).await.map_err(|e| {
                OvsdbLinkError::ConnectionError(format!("tcp:{}:{}: {}", host, port, e))
            })?;
            stream.set_nodelay(true).map_err(|e| {
                OvsdbLinkError::ConnectionError(format!("tcp:{}:{}: {}", host, port, e))
            })?;
            Ok(Box::new(stream))
        }
    }
}

#[cfg(unix)]
async fn connect_unix(path: &str) -> Result<Box<dyn AsyncStream>> {
    let stream = tokio::net::UnixStream::connect(path)
        .await
        .map_err(|e| OvsdbLinkError::ConnectionError(format!("unix:{}: {}", path, e)))?;
    Ok(Box::new(stream))
}

#[cfg(not(unix))]
async fn connect_unix(path: &str) -> Result<Box<dyn AsyncStream>> {
    Err(OvsdbLinkError::ConnectionError(format!(
        "unix:{}: unix sockets are not supported on this platform",
        path
    )))
}
