//! Connection-string resolution.
//!
//! Accepted forms:
//!
//! - `unix:<path>` for a Unix domain socket
//! - `<host>:<port>` (optionally prefixed with `tcp:`) for TCP
//!
//! The TCP port is only checked when the client connects, so a bad port
//! surfaces as a connection error rather than an endpoint error.

use crate::error::{OvsdbLinkError, Result};
use std::fmt;

/// Transport used to reach the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Unix,
    Tcp,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Unix => write!(f, "unix"),
            TransportKind::Tcp => write!(f, "tcp"),
        }
    }
}

/// A resolved socket endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketEndpoint {
    kind: TransportKind,
    address: String,
}

impl SocketEndpoint {
    /// Parse a connection string.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(OvsdbLinkError::InvalidEndpoint(
                "connection string is empty".to_string(),
            ));
        }

        if s.starts_with("unix") {
            let segments: Vec<&str> = s.split(':').collect();
            if segments[0] != "unix" {
                return Err(OvsdbLinkError::InvalidEndpoint(format!(
                    "unsupported scheme '{}' in '{}'",
                    segments[0], s
                )));
            }
            if segments.len() != 2 || segments[1].is_empty() {
                return Err(OvsdbLinkError::InvalidEndpoint(format!(
                    "expected 'unix:<path>', got '{}'",
                    s
                )));
            }
            return Ok(Self {
                kind: TransportKind::Unix,
                address: segments[1].to_string(),
            });
        }

        let host_port = s.strip_prefix("tcp:").unwrap_or(s);
        let segments: Vec<&str> = host_port.split(':').collect();
        if segments.len() != 2 || segments[0].is_empty() {
            return Err(OvsdbLinkError::InvalidEndpoint(format!(
                "expected '<host>:<port>', got '{}'",
                s
            )));
        }

        Ok(Self {
            kind: TransportKind::Tcp,
            address: host_port.to_string(),
        })
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Socket path for Unix endpoints, `host:port` for TCP.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Split and validate a TCP address into host and port.
    ///
    /// Fails with [`OvsdbLinkError::ConnectionError`] for a non-numeric or
    /// out-of-range port.
    pub(crate) fn tcp_host_port(&self) -> Result<(&str, u16)> {
        let (host, port) = self.address.rsplit_once(':').ok_or_else(|| {
            OvsdbLinkError::ConnectionError(format!("missing port in '{}'", self.address))
        })?;
        let port: u32 = port.parse().map_err(|_| {
            OvsdbLinkError::ConnectionError(format!("non-numeric port '{}'", port))
        })?;
        if port == 0 || port > u16::MAX as u32 {
            return Err(OvsdbLinkError::ConnectionError(format!(
                "port {} is outside 1-65535",
                port
            )));
        }
        Ok((host, port as u16))
    }
}

impl fmt::Display for SocketEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.address)
    }
}

impl std::str::FromStr for SocketEndpoint {
    type Err = OvsdbLinkError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(s: &str) {
        match SocketEndpoint::parse(s) {
            Err(OvsdbLinkError::InvalidEndpoint(_)) => {}
            other => panic!("expected InvalidEndpoint for '{}', got {:?}", s, other),
        }
    }

    #[test]
    fn test_unix_endpoint() {
        let ep = SocketEndpoint::parse("unix:/var/run/openvswitch/db.sock").unwrap();
        assert_eq!(ep.kind(), TransportKind::Unix);
        assert_eq!(ep.address(), "/var/run/openvswitch/db.sock");
        assert_eq!(ep.to_string(), "unix:/var/run/openvswitch/db.sock");
    }

    #[test]
    fn test_tcp_endpoint() {
        let ep = SocketEndpoint::parse("127.0.0.1:6640").unwrap();
        assert_eq!(ep.kind(), TransportKind::Tcp);
        assert_eq!(ep.address(), "127.0.0.1:6640");
        assert_eq!(ep.tcp_host_port().unwrap(), ("127.0.0.1", 6640));

        let ep = SocketEndpoint::parse("tcp:ovsdb.local:6641").unwrap();
        assert_eq!(ep.address(), "ovsdb.local:6641");
        assert_eq!(ep.to_string(), "tcp:ovsdb.local:6641");
    }

    #[test]
    fn test_invalid_endpoints() {
        assert_invalid("");
        assert_invalid("127.0.0.1");
        assert_invalid("10.0.0.1:1:2");
        assert_invalid(":6640");
        assert_invalid("unixd:/var/run/openvswitch/db.sock");
        assert_invalid("unix:/a:/b");
        assert_invalid("unix:");
        assert_invalid("unix");
    }

    #[test]
    fn test_port_checked_at_connect_time() {
        let ep = SocketEndpoint::parse("127.0.0.1:98765").unwrap();
        assert!(matches!(
            ep.tcp_host_port(),
            Err(OvsdbLinkError::ConnectionError(_))
        ));

        let ep = SocketEndpoint::parse("127.0.0.1:ssh").unwrap();
        assert!(matches!(
            ep.tcp_host_port(),
            Err(OvsdbLinkError::ConnectionError(_))
        ));

        let ep = SocketEndpoint::parse("127.0.0.1:0").unwrap();
        assert!(ep.tcp_host_port().is_err());
    }
}
