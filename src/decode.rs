//! Schema-driven decoding of raw column values.
//!
//! OVSDB encodes values as JSON with a few tagged forms:
//!
//! - uuid atom: `["uuid", "550e8400-e29b-41d4-a716-446655440000"]`
//! - set: `["set", [atom, ...]]`, or the bare atom for a one-element set
//! - map: `["map", [[key, value], ...]]`
//!
//! Decoding is strict: a value is interpreted only under its declared type,
//! and a shape that does not match is an error rather than a default.
//!
//! Optional scalar columns decode under their scalar type. The server sends
//! an empty one as `["set", []]`, which decodes to [`DecodeError::Absent`];
//! [`decode_optional`] maps that to `None`.

use serde_json::Value as JsonValue;

use crate::error::{DecodeError, OvsdbLinkError, Result};
use crate::models::{AtomicType, DataType, DatabaseSchema, TypedValue};

/// Declared type of `table.column`, or `UnknownColumn`.
pub fn declared_type(
    schema: &DatabaseSchema,
    table: &str,
    column: &str,
) -> std::result::Result<DataType, DecodeError> {
    schema
        .tables
        .get(table)
        .and_then(|t| t.column(column))
        .map(|c| c.data_type())
        .ok_or_else(|| DecodeError::UnknownColumn {
            table: table.to_string(),
            column: column.to_string(),
        })
}

/// Decode `raw` under the schema-declared type of `table.column`.
pub fn decode(
    table: &str,
    column: &str,
    raw: &JsonValue,
    schema: &DatabaseSchema,
) -> Result<TypedValue> {
    let data_type = declared_type(schema, table, column)?;
    Ok(decode_value(column, raw, &data_type)?)
}

/// Like [`decode`], but an absent optional value is `Ok(None)`.
pub fn decode_optional(
    table: &str,
    column: &str,
    raw: &JsonValue,
    schema: &DatabaseSchema,
) -> Result<Option<TypedValue>> {
    match decode(table, column, raw, schema) {
        Ok(value) => Ok(Some(value)),
        Err(OvsdbLinkError::DecodeError(DecodeError::Absent { .. })) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Decode `raw` as `requested`, failing if the schema declares another type.
///
/// The type check happens before the raw value is inspected, so a mismatch
/// is reported even when the value would be interpretable.
pub fn decode_as(
    table: &str,
    column: &str,
    raw: &JsonValue,
    schema: &DatabaseSchema,
    requested: &DataType,
) -> Result<TypedValue> {
    let declared = declared_type(schema, table, column)?;
    if declared != *requested {
        return Err(OvsdbLinkError::DecodeError(DecodeError::TypeMismatch {
            column: column.to_string(),
            declared: declared.to_string(),
            requested: requested.to_string(),
        }));
    }
    Ok(decode_value(column, raw, &declared)?)
}

/// Decode `raw` as `data_type` without consulting a schema.
pub fn decode_value(
    column: &str,
    raw: &JsonValue,
    data_type: &DataType,
) -> std::result::Result<TypedValue, DecodeError> {
    match data_type {
        DataType::Set(element) => decode_set(column, raw, *element),
        DataType::Map(key, value) => decode_map(column, raw, *key, *value),
        scalar => {
            let atomic = scalar
                .as_atomic()
                .ok_or_else(|| invalid(column, scalar, raw, "not a scalar type"))?;
            match tagged(raw) {
                Some(("set", payload)) => match payload.as_array().map(Vec::as_slice) {
                    Some([]) => Err(DecodeError::Absent {
                        column: column.to_string(),
                    }),
                    Some([single]) => decode_atom(column, single, atomic),
                    _ => Err(invalid(column, scalar, raw, "more than one value for a scalar")),
                },
                _ => decode_atom(column, raw, atomic),
            }
        }
    }
}

fn decode_set(
    column: &str,
    raw: &JsonValue,
    element: AtomicType,
) -> std::result::Result<TypedValue, DecodeError> {
    match tagged(raw) {
        Some(("set", payload)) => {
            let items = payload.as_array().ok_or_else(|| {
                invalid(column, &DataType::Set(element), raw, "set payload is not an array")
            })?;
            let decoded = items
                .iter()
                .map(|item| decode_atom(column, item, element))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(TypedValue::Set(decoded))
        }
        Some(("map", _)) => Err(invalid(
            column,
            &DataType::Set(element),
            raw,
            "got a map",
        )),
        // A one-element set may arrive as its bare atom.
        _ => Ok(TypedValue::Set(vec![decode_atom(column, raw, element)?])),
    }
}

fn decode_map(
    column: &str,
    raw: &JsonValue,
    key: AtomicType,
    value: AtomicType,
) -> std::result::Result<TypedValue, DecodeError> {
    let data_type = DataType::Map(key, value);
    let Some(("map", payload)) = tagged(raw) else {
        return Err(invalid(column, &data_type, raw, "expected [\"map\", [...]]"));
    };
    let pairs = payload
        .as_array()
        .ok_or_else(|| invalid(column, &data_type, raw, "map payload is not an array"))?;

    let mut decoded = Vec::with_capacity(pairs.len());
    for pair in pairs {
        match pair.as_array().map(Vec::as_slice) {
            Some([k, v]) => {
                decoded.push((decode_atom(column, k, key)?, decode_atom(column, v, value)?));
            }
            _ => return Err(invalid(column, &data_type, pair, "map entry is not a [key, value] pair")),
        }
    }
    Ok(TypedValue::Map(decoded))
}

fn decode_atom(
    column: &str,
    raw: &JsonValue,
    atomic: AtomicType,
) -> std::result::Result<TypedValue, DecodeError> {
    let data_type = DataType::scalar(atomic);
    match atomic {
        AtomicType::String => raw
            .as_str()
            .map(|s| TypedValue::String(s.to_string()))
            .ok_or_else(|| invalid(column, &data_type, raw, "not a JSON string")),
        AtomicType::Integer => raw
            .as_i64()
            .map(TypedValue::Integer)
            .ok_or_else(|| invalid(column, &data_type, raw, "not a 64-bit integer")),
        AtomicType::Real => raw
            .as_f64()
            .map(TypedValue::Real)
            .ok_or_else(|| invalid(column, &data_type, raw, "not a number")),
        AtomicType::Boolean => raw
            .as_bool()
            .map(TypedValue::Boolean)
            .ok_or_else(|| invalid(column, &data_type, raw, "not a JSON boolean")),
        AtomicType::Uuid => match tagged(raw) {
            Some(("uuid", JsonValue::String(text))) => uuid::Uuid::parse_str(text)
                .map(|_| TypedValue::Uuid(text.clone()))
                .map_err(|e| invalid(column, &data_type, raw, &e.to_string())),
            _ => Err(invalid(column, &data_type, raw, "expected [\"uuid\", \"...\"]")),
        },
    }
}

/// Split a two-element `["tag", payload]` array.
fn tagged(raw: &JsonValue) -> Option<(&str, &JsonValue)> {
    match raw.as_array().map(Vec::as_slice) {
        Some([JsonValue::String(tag), payload]) => Some((tag.as_str(), payload)),
        _ => None,
    }
}

fn invalid(column: &str, expected: &DataType, raw: &JsonValue, reason: &str) -> DecodeError {
    DecodeError::InvalidValue {
        column: column.to_string(),
        expected: expected.to_string(),
        reason: format!("{} (got {})", reason, raw),
    }
}
