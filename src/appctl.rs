//! Helpers for `ovs-appctl` style diagnostics on a daemon's control socket.
//!
//! The daemons answer these commands with free-form text; this module
//! parses the two outputs that have a stable line format.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    client::OvsdbClient,
    error::{OvsdbLinkError, Result},
    models::CoverageCounter,
};

const LIST_COMMANDS: &str = "list-commands";
const COVERAGE_SHOW: &str = "coverage/show";

/// Parse `list-commands` output.
///
/// Command lines are indented; the header line is not. Internal runs of
/// whitespace are collapsed so `"  vlog/set  {spec}"` becomes
/// `"vlog/set {spec}"`.
pub fn parse_command_list(text: &str) -> BTreeSet<String> {
    text.lines()
        .filter(|line| line.starts_with(' '))
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect()
}

/// Parse `coverage/show` output into counters keyed by event name.
///
/// Only lines with exactly six fields are counter lines:
///
/// ```text
/// name  <5s>/sec  <1m>/sec  <1h>/sec  total: <n>
/// ```
///
/// Any other line, or a counter line with an unparsable field, is skipped.
pub fn parse_coverage(text: &str) -> BTreeMap<String, CoverageCounter> {
    text.lines().filter_map(parse_coverage_line).collect()
}

fn parse_coverage_line(line: &str) -> Option<(String, CoverageCounter)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [name, avg_5s, avg_1m, avg_1h, "total:", total] = fields.as_slice() else {
        return None;
    };
    let counter = CoverageCounter {
        avg_5s: parse_rate(avg_5s)?,
        avg_1m: parse_rate(avg_1m)?,
        avg_1h: parse_rate(avg_1h)?,
        total: total.parse().ok()?,
    };
    Some((name.to_string(), counter))
}

fn parse_rate(field: &str) -> Option<f64> {
    field.strip_suffix("/sec")?.parse().ok()
}

impl OvsdbClient {
    /// Commands the daemon supports, from `list-commands`.
    pub async fn list_commands(&self) -> Result<BTreeSet<String>> {
        let text = self.appctl(LIST_COMMANDS).await?;
        Ok(parse_command_list(&text))
    }

    /// Event coverage counters, from `coverage/show`.
    pub async fn coverage(&self) -> Result<BTreeMap<String, CoverageCounter>> {
        let text = self.appctl(COVERAGE_SHOW).await?;
        Ok(parse_coverage(&text))
    }

    async fn appctl(&self, command: &str) -> Result<String> {
        let text = self.query_raw(command, &[]).await?;
        if text.trim().is_empty() {
            return Err(OvsdbLinkError::ProtocolError(format!(
                "'{}' returned no data from {}",
                command,
                self.endpoint()
            )));
        }
        Ok(text)
    }
}
