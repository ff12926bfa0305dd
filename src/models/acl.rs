use std::collections::BTreeMap;

/// A row of the northbound `ACL` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Acl {
    pub uuid: String,
    /// `allow`, `allow-related`, `drop` or `reject`
    pub action: String,
    /// `from-lport` or `to-lport`
    pub direction: String,
    pub match_expr: String,
    pub priority: i64,
    pub external_ids: BTreeMap<String, String>,
}
