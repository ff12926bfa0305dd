//! Timeout configuration for OVSDB client operations.
//!
//! A zero duration means "no deadline": the call waits until the server
//! answers or the transport fails.

use std::future::Future;
use std::time::Duration;

use crate::error::{OvsdbLinkError, Result};

/// Timeout configuration for OVSDB client operations.
///
/// # Examples
///
/// ```rust
/// use ovsdb_link::OvsdbTimeouts;
/// use std::time::Duration;
///
/// // Defaults (recommended for most cases)
/// let timeouts = OvsdbTimeouts::default();
///
/// // Longer request timeout for large southbound databases
/// let timeouts = OvsdbTimeouts::builder()
///     .request_timeout(Duration::from_secs(120))
///     .build();
///
/// // Same bound for connect and I/O
/// let timeouts = OvsdbTimeouts::uniform(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OvsdbTimeouts {
    /// Timeout for establishing the socket connection.
    /// Default: 10 seconds
    pub connection_timeout: Duration,

    /// Timeout for one request: sending it and receiving the matching response.
    /// Default: 30 seconds
    pub request_timeout: Duration,
}

impl Default for OvsdbTimeouts {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl OvsdbTimeouts {
    /// Create a new builder for custom timeout configuration.
    pub fn builder() -> OvsdbTimeoutsBuilder {
        OvsdbTimeoutsBuilder::new()
    }

    /// Use one duration for both connect and request I/O.
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            connection_timeout: timeout,
            request_timeout: timeout,
        }
    }

    /// Block indefinitely on connect and on every request.
    pub fn no_deadline() -> Self {
        Self::uniform(Duration::ZERO)
    }

    /// Short timeouts for a local control socket.
    pub fn fast() -> Self {
        Self {
            connection_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
        }
    }

    /// Long timeouts for remote or heavily loaded servers.
    pub fn relaxed() -> Self {
        Self {
            connection_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
        }
    }

    /// Check if a duration represents "no timeout" (zero or very large).
    pub fn is_no_timeout(duration: Duration) -> bool {
        duration.is_zero() || duration > Duration::from_secs(86400 * 365) // > 1 year
    }
}

/// Await `fut`, bounded by `timeout` unless it means "no deadline".
pub(crate) async fn with_deadline<T, F>(timeout: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if OvsdbTimeouts::is_no_timeout(timeout) {
        return fut.await;
    }
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(OvsdbLinkError::TimeoutError(format!(
            "{} timed out after {:?}",
            what, timeout
        ))),
    }
}

/// Builder for creating custom [`OvsdbTimeouts`] configurations.
#[derive(Debug, Clone)]
pub struct OvsdbTimeoutsBuilder {
    timeouts: OvsdbTimeouts,
}

impl OvsdbTimeoutsBuilder {
    fn new() -> Self {
        Self {
            timeouts: OvsdbTimeouts::default(),
        }
    }

    /// Set the connection timeout.
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connection_timeout = timeout;
        self
    }

    /// Set the connection timeout in seconds.
    pub fn connection_timeout_secs(self, secs: u64) -> Self {
        self.connection_timeout(Duration::from_secs(secs))
    }

    /// Set the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.request_timeout = timeout;
        self
    }

    /// Set the per-request timeout in seconds.
    pub fn request_timeout_secs(self, secs: u64) -> Self {
        self.request_timeout(Duration::from_secs(secs))
    }

    /// Build the timeout configuration.
    pub fn build(self) -> OvsdbTimeouts {
        self.timeouts
    }
}
