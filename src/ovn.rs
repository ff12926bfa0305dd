//! Typed reads of the OVN northbound database.
//!
//! Each helper fetches the database schema, runs one bound select, and maps
//! the rows into a record type. Values are decoded strictly: a column whose
//! declared type differs from the one expected here is a `TypeMismatch`.

use std::collections::BTreeMap;

use crate::{
    client::OvsdbClient,
    error::{OvsdbLinkError, Result},
    models::{
        Acl, AtomicType, DataType, DatabaseSchema, LogicalPortAddress, LogicalSwitchPort, Row,
        TypedValue,
    },
};

const ACL_QUERY: &str = "SELECT _uuid, action, direction, external_ids, match, priority FROM ACL";
const LOGICAL_SWITCH_PORT_QUERY: &str =
    "SELECT _uuid, addresses, external_ids, name, up FROM Logical_Switch_Port";

impl OvsdbClient {
    /// Every row of the `ACL` table of `database`.
    pub async fn acls(&self, database: &str) -> Result<Vec<Acl>> {
        let schema = self.get_schema(database).await?;
        let rs = self.transact_bound(database, ACL_QUERY, &schema).await?;
        rs.rows.iter().map(|row| acl_from_row(row, &schema)).collect()
    }

    /// Every row of the `Logical_Switch_Port` table of `database`, with
    /// its `addresses` entries parsed.
    pub async fn logical_switch_ports(&self, database: &str) -> Result<Vec<LogicalSwitchPort>> {
        let schema = self.get_schema(database).await?;
        let rs = self
            .transact_bound(database, LOGICAL_SWITCH_PORT_QUERY, &schema)
            .await?;
        rs.rows
            .iter()
            .map(|row| logical_switch_port_from_row(row, &schema))
            .collect()
    }
}

fn acl_from_row(row: &Row, schema: &DatabaseSchema) -> Result<Acl> {
    Ok(Acl {
        uuid: column(row, schema, "_uuid", DataType::Uuid, owned_str)?,
        action: column(row, schema, "action", DataType::String, owned_str)?,
        direction: column(row, schema, "direction", DataType::String, owned_str)?,
        match_expr: column(row, schema, "match", DataType::String, owned_str)?,
        priority: column(row, schema, "priority", DataType::Integer, |v| v.as_i64())?,
        external_ids: string_map(row, schema, "external_ids")?,
    })
}

fn logical_switch_port_from_row(row: &Row, schema: &DatabaseSchema) -> Result<LogicalSwitchPort> {
    let addresses = column(
        row,
        schema,
        "addresses",
        DataType::Set(AtomicType::String),
        |v| v.to_string_list(),
    )?
    .iter()
    .map(|entry| LogicalPortAddress::parse(entry))
    .collect::<Result<Vec<_>>>()?;

    let up = match row.optional_value("up", schema)? {
        None => None,
        Some(value) => Some(
            value
                .as_bool()
                .ok_or_else(|| shape_error(row, "up", &DataType::Boolean))?,
        ),
    };

    Ok(LogicalSwitchPort {
        uuid: column(row, schema, "_uuid", DataType::Uuid, owned_str)?,
        name: column(row, schema, "name", DataType::String, owned_str)?,
        addresses,
        external_ids: string_map(row, schema, "external_ids")?,
        up,
    })
}

/// Decode `name` as `data_type` and pull the value out with `extract`.
fn column<T>(
    row: &Row,
    schema: &DatabaseSchema,
    name: &str,
    data_type: DataType,
    extract: impl FnOnce(&TypedValue) -> Option<T>,
) -> Result<T> {
    let value = row.typed_value_as(name, schema, &data_type)?;
    extract(&value).ok_or_else(|| shape_error(row, name, &data_type))
}

fn string_map(row: &Row, schema: &DatabaseSchema, name: &str) -> Result<BTreeMap<String, String>> {
    let data_type = DataType::Map(AtomicType::String, AtomicType::String);
    column(row, schema, name, data_type, TypedValue::to_string_map)
}

fn owned_str(value: &TypedValue) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn shape_error(row: &Row, name: &str, data_type: &DataType) -> OvsdbLinkError {
    OvsdbLinkError::ProtocolError(format!(
        "{}.{} did not decode as {}",
        row.table(),
        name,
        data_type
    ))
}
