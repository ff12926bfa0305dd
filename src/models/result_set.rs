use serde_json::Value as JsonValue;
use std::collections::HashMap;

use super::column_type::DataType;
use super::error_detail::ErrorDetail;
use super::operation::Operation;
use super::schema::DatabaseSchema;
use super::typed_value::TypedValue;
use crate::decode;
use crate::error::{DecodeError, OvsdbLinkError, Result};

/// One row of a select result.
///
/// Values stay in their raw wire form until a typed accessor is called.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    table: String,
    values: HashMap<String, JsonValue>,
}

impl Row {
    pub fn new(table: impl Into<String>, values: HashMap<String, JsonValue>) -> Self {
        Self {
            table: table.into(),
            values,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Raw value of `column`.
    pub fn get(&self, column: &str) -> Option<&JsonValue> {
        self.values.get(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    /// Decode `column` under its schema-declared type.
    pub fn typed_value(&self, column: &str, schema: &DatabaseSchema) -> Result<TypedValue> {
        decode::decode(&self.table, column, self.raw(column)?, schema)
    }

    /// Decode `column`, with an empty optional scalar as `None`.
    pub fn optional_value(
        &self,
        column: &str,
        schema: &DatabaseSchema,
    ) -> Result<Option<TypedValue>> {
        decode::decode_optional(&self.table, column, self.raw(column)?, schema)
    }

    /// Decode `column` as `requested`; fails with `TypeMismatch` if the
    /// schema declares a different type.
    pub fn typed_value_as(
        &self,
        column: &str,
        schema: &DatabaseSchema,
        requested: &DataType,
    ) -> Result<TypedValue> {
        decode::decode_as(&self.table, column, self.raw(column)?, schema, requested)
    }

    fn raw(&self, column: &str) -> Result<&JsonValue> {
        self.values.get(column).ok_or_else(|| {
            OvsdbLinkError::DecodeError(DecodeError::UnknownColumn {
                table: self.table.clone(),
                column: column.to_string(),
            })
        })
    }
}

/// Rows returned by one select, with the column list they carry.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub database: String,
    pub table: String,
    /// Requested columns, or every column the rows reported when all
    /// columns were selected.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl ResultSet {
    /// Build a result set from the `result` member of a `transact` response.
    ///
    /// Any operation-level error object in the result array is surfaced as
    /// a protocol error. Every row must carry exactly the column list.
    pub fn from_transact_result(
        database: &str,
        operation: &Operation,
        result: JsonValue,
    ) -> Result<Self> {
        let mut outcomes = match result {
            JsonValue::Array(outcomes) => outcomes,
            other => {
                return Err(OvsdbLinkError::ProtocolError(format!(
                    "transact result is not an array: {}",
                    other
                )))
            }
        };

        if let Some(detail) = outcomes.iter().find_map(ErrorDetail::from_outcome) {
            return Err(OvsdbLinkError::ProtocolError(detail.to_string()));
        }
        if outcomes.is_empty() {
            return Err(OvsdbLinkError::ProtocolError(
                "transact result is empty".to_string(),
            ));
        }

        let raw_rows = match outcomes.swap_remove(0) {
            JsonValue::Object(mut outcome) => match outcome.remove("rows") {
                Some(JsonValue::Array(rows)) => rows,
                _ => {
                    return Err(OvsdbLinkError::ProtocolError(
                        "select result has no 'rows' array".to_string(),
                    ))
                }
            },
            other => {
                return Err(OvsdbLinkError::ProtocolError(format!(
                    "select result is not an object: {}",
                    other
                )))
            }
        };

        let mut rows = Vec::with_capacity(raw_rows.len());
        for raw in raw_rows {
            let map = match raw {
                JsonValue::Object(map) => map,
                other => {
                    return Err(OvsdbLinkError::ProtocolError(format!(
                        "row is not an object: {}",
                        other
                    )))
                }
            };
            rows.push(Row::new(operation.table(), map.into_iter().collect()));
        }

        let columns = if operation.selects_all_columns() {
            reported_columns(&rows)
        } else {
            dedup(operation.columns())
        };
        check_row_shapes(&columns, &rows)?;

        Ok(Self {
            database: database.to_string(),
            table: operation.table().to_string(),
            columns,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Decode `column` of row `row_idx` under its declared type.
    pub fn typed_value(
        &self,
        row_idx: usize,
        column: &str,
        schema: &DatabaseSchema,
    ) -> Result<TypedValue> {
        let row = self.rows.get(row_idx).ok_or_else(|| {
            OvsdbLinkError::DecodeError(DecodeError::InvalidValue {
                column: column.to_string(),
                expected: format!("row index < {}", self.rows.len()),
                reason: format!("row {} does not exist", row_idx),
            })
        })?;
        row.typed_value(column, schema)
    }

    /// Decode `column` for every row.
    pub fn column_values(&self, column: &str, schema: &DatabaseSchema) -> Result<Vec<TypedValue>> {
        self.rows
            .iter()
            .map(|row| row.typed_value(column, schema))
            .collect()
    }
}

/// Column names of the first row, sorted.
fn reported_columns(rows: &[Row]) -> Vec<String> {
    let mut columns: Vec<String> = rows
        .first()
        .map(|row| row.values.keys().cloned().collect())
        .unwrap_or_default();
    columns.sort();
    columns
}

fn dedup(columns: &[String]) -> Vec<String> {
    let mut seen = Vec::with_capacity(columns.len());
    for column in columns {
        if !seen.contains(column) {
            seen.push(column.clone());
        }
    }
    seen
}

fn check_row_shapes(columns: &[String], rows: &[Row]) -> Result<()> {
    for (i, row) in rows.iter().enumerate() {
        if row.len() != columns.len() {
            return Err(OvsdbLinkError::ProtocolError(format!(
                "row {} has {} values but {} columns were expected",
                i,
                row.len(),
                columns.len()
            )));
        }
        if let Some(missing) = columns.iter().find(|c| !row.contains(c)) {
            return Err(OvsdbLinkError::ProtocolError(format!(
                "row {} is missing column '{}'",
                i, missing
            )));
        }
    }
    Ok(())
}
