use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::error::{OvsdbLinkError, Result};

/// A 48-bit Ethernet address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for MacAddress {
    type Err = OvsdbLinkError;

    /// Six two-digit hex groups separated by `:` or `-`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || OvsdbLinkError::ParseError(format!("invalid MAC address '{}'", s));

        let separator = if s.contains('-') { '-' } else { ':' };
        let parts: Vec<&str> = s.split(separator).collect();
        if parts.len() != 6 {
            return Err(invalid());
        }

        let mut octets = [0u8; 6];
        for (octet, part) in octets.iter_mut().zip(&parts) {
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", a, b, c, d, e, g)
    }
}

/// One entry of a logical switch port's `addresses` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicalPortAddress {
    /// `router`: addresses come from the peer router port.
    Router,
    /// `unknown`: the port accepts traffic for unknown destinations.
    Unknown,
    /// `dynamic [ip...]` or `<mac> dynamic`: assigned by the controller.
    Dynamic {
        mac: Option<MacAddress>,
        ip_addresses: Vec<IpAddr>,
    },
    /// `<mac> [ip...]`
    Static {
        mac: MacAddress,
        ip_addresses: Vec<IpAddr>,
    },
}

impl LogicalPortAddress {
    /// Parse one `addresses` entry.
    ///
    /// ```rust
    /// use ovsdb_link::LogicalPortAddress;
    ///
    /// let addr = LogicalPortAddress::parse("0a:00:00:00:00:01 10.0.0.11").unwrap();
    /// assert_eq!(addr.ip_addresses().len(), 1);
    /// ```
    pub fn parse(entry: &str) -> Result<Self> {
        let tokens: Vec<&str> = entry.split_whitespace().collect();
        match tokens.as_slice() {
            [] => Err(OvsdbLinkError::ParseError(
                "empty logical port address".to_string(),
            )),
            ["router"] => Ok(LogicalPortAddress::Router),
            ["unknown"] => Ok(LogicalPortAddress::Unknown),
            ["router" | "unknown", ..] => Err(OvsdbLinkError::ParseError(format!(
                "unexpected text after '{}' in '{}'",
                tokens[0], entry
            ))),
            ["dynamic", ips @ ..] => Ok(LogicalPortAddress::Dynamic {
                mac: None,
                ip_addresses: parse_ips(entry, ips)?,
            }),
            [mac, "dynamic"] => Ok(LogicalPortAddress::Dynamic {
                mac: Some(mac.parse()?),
                ip_addresses: Vec::new(),
            }),
            [mac, ips @ ..] => Ok(LogicalPortAddress::Static {
                mac: mac.parse()?,
                ip_addresses: parse_ips(entry, ips)?,
            }),
        }
    }

    pub fn mac(&self) -> Option<MacAddress> {
        match self {
            LogicalPortAddress::Dynamic { mac, .. } => *mac,
            LogicalPortAddress::Static { mac, .. } => Some(*mac),
            LogicalPortAddress::Router | LogicalPortAddress::Unknown => None,
        }
    }

    pub fn ip_addresses(&self) -> &[IpAddr] {
        match self {
            LogicalPortAddress::Dynamic { ip_addresses, .. }
            | LogicalPortAddress::Static { ip_addresses, .. } => ip_addresses,
            LogicalPortAddress::Router | LogicalPortAddress::Unknown => &[],
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, LogicalPortAddress::Dynamic { .. })
    }
}

impl FromStr for LogicalPortAddress {
    type Err = OvsdbLinkError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn parse_ips(entry: &str, tokens: &[&str]) -> Result<Vec<IpAddr>> {
    tokens
        .iter()
        .map(|token| {
            token.parse::<IpAddr>().map_err(|_| {
                OvsdbLinkError::ParseError(format!(
                    "invalid IP address '{}' in '{}'",
                    token, entry
                ))
            })
        })
        .collect()
}

/// A row of the northbound `Logical_Switch_Port` table.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalSwitchPort {
    pub uuid: String,
    pub name: String,
    pub addresses: Vec<LogicalPortAddress>,
    pub external_ids: BTreeMap<String, String>,
    /// `None` until the controller has reported the port state.
    pub up: Option<bool>,
}
