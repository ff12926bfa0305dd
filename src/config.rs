//! Configuration file management
//!
//! # Configuration Format
//!
//! ```toml
//! [connection]
//! endpoint = "unix:/var/run/openvswitch/db.sock"  # default server
//! connection_timeout_secs = 10                     # 0 = no deadline
//! request_timeout_secs = 30                        # 0 = no deadline
//!
//! [databases]                                      # per-database overrides
//! OVN_Northbound = "unix:/run/ovn/ovnnb_db.sock"
//! OVN_Southbound = "tcp:10.0.0.5:6642"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::OvsdbClientBuilder;
use crate::error::{OvsdbLinkError, Result};
use crate::timeouts::OvsdbTimeouts;
use crate::OvsdbClient;

/// Client configuration loaded from a TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OvsdbLinkConfig {
    /// Default endpoint and timeouts
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Database name to endpoint, for servers hosting different databases
    #[serde(default)]
    pub databases: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Connection string used when a database has no override
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Timeout for establishing the socket, in seconds (default: 10)
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,

    /// Timeout for one request, in seconds (default: 30)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_endpoint() -> String {
    "unix:/var/run/openvswitch/db.sock".to_string()
}

fn default_connection_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            connection_timeout_secs: default_connection_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

pub fn expand_config_path(path: &Path) -> PathBuf {
    let path_str = path.to_str().unwrap_or("~/.ovsdb-link/config.toml");
    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(rest);
        }
    }
    path.to_path_buf()
}

pub fn default_config_path() -> PathBuf {
    expand_config_path(Path::new("~/.ovsdb-link/config.toml"))
}

impl OvsdbLinkConfig {
    /// Load configuration from file
    ///
    /// Returns default configuration if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        let expanded_path = expand_config_path(path);
        let path = &expanded_path;

        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            OvsdbLinkError::ConfigurationError(format!("Failed to read config file: {}", e))
        })?;

        let config: OvsdbLinkConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let expanded_path = expand_config_path(path);
        let path = &expanded_path;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                OvsdbLinkError::ConfigurationError(format!(
                    "Failed to create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let contents = toml::to_string_pretty(self).map_err(|e| {
            OvsdbLinkError::ConfigurationError(format!("Failed to serialize: {}", e))
        })?;

        std::fs::write(path, contents).map_err(|e| {
            OvsdbLinkError::ConfigurationError(format!("Failed to write config file: {}", e))
        })
    }

    /// Endpoint serving `database`, falling back to the default endpoint
    pub fn endpoint_for(&self, database: &str) -> &str {
        self.databases
            .get(database)
            .map(String::as_str)
            .unwrap_or(&self.connection.endpoint)
    }

    pub fn timeouts(&self) -> OvsdbTimeouts {
        OvsdbTimeouts::builder()
            .connection_timeout(Duration::from_secs(self.connection.connection_timeout_secs))
            .request_timeout(Duration::from_secs(self.connection.request_timeout_secs))
            .build()
    }

    /// A client builder pointed at the endpoint serving `database`
    pub fn client_builder(&self, database: &str) -> OvsdbClientBuilder {
        OvsdbClient::builder()
            .endpoint(self.endpoint_for(database))
            .timeouts(self.timeouts())
    }
}
