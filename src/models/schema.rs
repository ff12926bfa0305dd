use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use super::column_type::{AtomicType, ColumnType, DataType};
use crate::error::{OvsdbLinkError, Result};

/// Columns every table carries without declaring them in the schema.
const IMPLICIT_COLUMNS: &[&str] = &["_uuid", "_version"];

/// A database schema fetched with `get_schema`.
///
/// This is an immutable snapshot: column types are resolved once when the
/// document is parsed, and later schema changes on the server are only
/// visible after fetching again.
///
/// # Example (JSON representation, abridged)
///
/// ```json
/// {
///   "name": "Open_vSwitch",
///   "version": "8.3.0",
///   "tables": {
///     "Bridge": {
///       "columns": {
///         "name": {"type": "string"},
///         "ports": {"type": {"key": {"type": "uuid", "refTable": "Port"},
///                            "min": 0, "max": "unlimited"}}
///       }
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseSchema {
    pub name: String,
    pub version: Option<String>,
    pub tables: BTreeMap<String, TableSchema>,
}

/// One table of a [`DatabaseSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub name: String,
    pub columns: BTreeMap<String, ColumnType>,
}

impl DatabaseSchema {
    /// Build the schema model from a raw `get_schema` result.
    pub fn from_json(doc: &JsonValue) -> Result<Self> {
        let name = doc
            .get("name")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| OvsdbLinkError::SchemaError("schema has no 'name'".to_string()))?
            .to_string();
        let version = doc
            .get("version")
            .and_then(JsonValue::as_str)
            .map(str::to_string);

        let raw_tables = doc.get("tables").and_then(JsonValue::as_object).ok_or_else(|| {
            OvsdbLinkError::SchemaError(format!("schema '{}' has no 'tables' object", name))
        })?;

        let mut tables = BTreeMap::new();
        for (table_name, raw_table) in raw_tables {
            let table = TableSchema::from_json(table_name, raw_table)?;
            tables.insert(table_name.clone(), table);
        }

        Ok(Self {
            name,
            version,
            tables,
        })
    }

    /// Table names, sorted.
    pub fn tables(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Column names of `table`, sorted. Empty for an unknown table.
    pub fn columns(&self, table: &str) -> Vec<&str> {
        self.tables
            .get(table)
            .map(|t| t.columns.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn table(&self, table: &str) -> Result<&TableSchema> {
        self.tables.get(table).ok_or_else(|| {
            OvsdbLinkError::SchemaError(format!(
                "table '{}' does not exist in database '{}'",
                table, self.name
            ))
        })
    }

    /// Declared type of `table.column`.
    pub fn column_type(&self, table: &str, column: &str) -> Result<&ColumnType> {
        self.table(table)?.column(column).ok_or_else(|| {
            OvsdbLinkError::SchemaError(format!(
                "column '{}' does not exist in table '{}' of database '{}'",
                column, table, self.name
            ))
        })
    }

    /// Resolved value shape of `table.column`.
    pub fn data_type(&self, table: &str, column: &str) -> Result<DataType> {
        Ok(self.column_type(table, column)?.data_type())
    }
}

impl TableSchema {
    fn from_json(name: &str, raw: &JsonValue) -> Result<Self> {
        let raw_columns = raw.get("columns").and_then(JsonValue::as_object).ok_or_else(|| {
            OvsdbLinkError::SchemaError(format!("table '{}' has no 'columns' object", name))
        })?;

        let mut columns = BTreeMap::new();
        for (column_name, definition) in raw_columns {
            let raw_type = definition.get("type").ok_or_else(|| {
                OvsdbLinkError::SchemaError(format!(
                    "column '{}.{}' has no 'type'",
                    name, column_name
                ))
            })?;
            columns.insert(
                column_name.clone(),
                ColumnType::from_json(column_name, raw_type)?,
            );
        }
        for implicit in IMPLICIT_COLUMNS {
            columns
                .entry(implicit.to_string())
                .or_insert_with(|| ColumnType::scalar(AtomicType::Uuid));
        }

        Ok(Self {
            name: name.to_string(),
            columns,
        })
    }

    pub fn column(&self, column: &str) -> Option<&ColumnType> {
        self.columns.get(column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }
}
