use serde::ser::{SerializeTuple, Serializer};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use std::fmt;

use super::column_type::{AtomicType, DataType};
use crate::error::{OvsdbLinkError, Result};

/// Symbolic operator tokens, longest first so `==` wins over `=`-prefixed
/// and `<=` over `<` at the same position.
const OPERATOR_TOKENS: &[(&str, ConditionFunction)] = &[
    ("==", ConditionFunction::Equal),
    ("!=", ConditionFunction::NotEqual),
    ("<=", ConditionFunction::LessOrEqual),
    (">=", ConditionFunction::GreaterOrEqual),
    ("<", ConditionFunction::LessThan),
    (">", ConditionFunction::GreaterThan),
];

/// Comparison function of a `where` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionFunction {
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    Includes,
    Excludes,
}

impl ConditionFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionFunction::Equal => "==",
            ConditionFunction::NotEqual => "!=",
            ConditionFunction::LessThan => "<",
            ConditionFunction::LessOrEqual => "<=",
            ConditionFunction::GreaterThan => ">",
            ConditionFunction::GreaterOrEqual => ">=",
            ConditionFunction::Includes => "includes",
            ConditionFunction::Excludes => "excludes",
        }
    }
}

impl fmt::Display for ConditionFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `(column, function, value)` triple.
///
/// Serializes to the OVSDB wire form `["column", "==", value]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    column: String,
    function: ConditionFunction,
    value: JsonValue,
}

impl Condition {
    pub fn new(column: impl Into<String>, function: ConditionFunction, value: JsonValue) -> Self {
        Self {
            column: column.into(),
            function,
            value,
        }
    }

    /// Parse a `column<op>value` fragment such as `db_version=="7.3.0"`.
    ///
    /// Only `==` is accepted; the other recognized operators are rejected.
    /// The value is kept as a string until [`Condition::bind`] types it.
    pub fn parse(fragment: &str) -> Result<Self> {
        let (position, token, function) = find_operator(fragment).ok_or_else(|| {
            OvsdbLinkError::ParseError(format!("no operator found in condition '{}'", fragment))
        })?;

        let column = &fragment[..position];
        let raw_value = &fragment[position + token.len()..];

        if column.is_empty() {
            return Err(OvsdbLinkError::ParseError(format!(
                "condition '{}' has no column",
                fragment
            )));
        }
        if !is_identifier(column) {
            return Err(OvsdbLinkError::ParseError(format!(
                "invalid column name '{}' in condition '{}'",
                column, fragment
            )));
        }
        if function != ConditionFunction::Equal {
            return Err(OvsdbLinkError::ParseError(format!(
                "unsupported operator '{}' in condition '{}'",
                token, fragment
            )));
        }

        let value = unquote(raw_value)?;
        if value.is_empty() {
            return Err(OvsdbLinkError::ParseError(format!(
                "condition '{}' has no value",
                fragment
            )));
        }

        Ok(Self::new(column, function, JsonValue::String(value)))
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn function(&self) -> ConditionFunction {
        self.function
    }

    pub fn value(&self) -> &JsonValue {
        &self.value
    }

    /// Re-encode a string literal as the wire atom for the column's type.
    ///
    /// Sets compare against a single atom of their element type. Map columns
    /// cannot be compared with a literal. Values that are not strings are
    /// assumed to be encoded already and are left untouched.
    pub fn bind(&self, data_type: &DataType) -> Result<Self> {
        let JsonValue::String(literal) = &self.value else {
            return Ok(self.clone());
        };

        let atomic = match data_type {
            DataType::Set(element) => *element,
            DataType::Map(_, _) => {
                return Err(OvsdbLinkError::ParseError(format!(
                    "column '{}' is a map ({}) and cannot be compared with '{}'",
                    self.column, data_type, literal
                )))
            }
            scalar => scalar.as_atomic().ok_or_else(|| {
                OvsdbLinkError::ParseError(format!(
                    "column '{}' has no atomic type",
                    self.column
                ))
            })?,
        };

        let value = encode_atom(&self.column, literal, atomic)?;
        Ok(Self::new(self.column.clone(), self.function, value))
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut triple = serializer.serialize_tuple(3)?;
        triple.serialize_element(&self.column)?;
        triple.serialize_element(self.function.as_str())?;
        triple.serialize_element(&self.value)?;
        triple.end()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            JsonValue::String(s) => write!(
                f,
                "{}{}\"{}\"",
                self.column,
                self.function,
                s.replace('\\', "\\\\").replace('"', "\\\"")
            ),
            other => write!(f, "{}{}{}", self.column, self.function, other),
        }
    }
}

/// Leftmost operator occurrence, longest token at that position.
fn find_operator(fragment: &str) -> Option<(usize, &'static str, ConditionFunction)> {
    for (position, _) in fragment.char_indices() {
        let rest = &fragment[position..];
        for (token, function) in OPERATOR_TOKENS {
            if rest.starts_with(token) {
                return Some((position, token, *function));
            }
        }
    }
    None
}

/// Strip surrounding quotes. Inside quotes, `\"` and `\\` are the only escapes.
fn unquote(raw: &str) -> Result<String> {
    let Some(body) = raw.strip_prefix('"') else {
        return Ok(raw.to_string());
    };

    let mut value = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped @ ('"' | '\\')) => value.push(escaped),
                other => {
                    return Err(OvsdbLinkError::ParseError(format!(
                        "unsupported escape '\\{}' in '{}'",
                        other.map(String::from).unwrap_or_default(),
                        raw
                    )))
                }
            },
            '"' if chars.as_str().is_empty() => return Ok(value),
            '"' => {
                return Err(OvsdbLinkError::ParseError(format!(
                    "unexpected text after closing quote in '{}'",
                    raw
                )))
            }
            c => value.push(c),
        }
    }
    Err(OvsdbLinkError::ParseError(format!(
        "unterminated quote in '{}'",
        raw
    )))
}

/// OVSDB identifiers: `[A-Za-z_][A-Za-z0-9_]*`.
pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn encode_atom(column: &str, literal: &str, atomic: AtomicType) -> Result<JsonValue> {
    let invalid = || {
        OvsdbLinkError::ParseError(format!(
            "value '{}' is not a valid {} for column '{}'",
            literal, atomic, column
        ))
    };

    match atomic {
        AtomicType::String => Ok(JsonValue::String(literal.to_string())),
        AtomicType::Integer => literal
            .parse::<i64>()
            .map(|n| json!(n))
            .map_err(|_| invalid()),
        AtomicType::Real => {
            let n = literal.parse::<f64>().map_err(|_| invalid())?;
            serde_json::Number::from_f64(n)
                .map(JsonValue::Number)
                .ok_or_else(invalid)
        }
        AtomicType::Boolean => match literal {
            "true" => Ok(JsonValue::Bool(true)),
            "false" => Ok(JsonValue::Bool(false)),
            _ => Err(invalid()),
        },
        AtomicType::Uuid => uuid::Uuid::parse_str(literal)
            .map(|_| json!(["uuid", literal]))
            .map_err(|_| invalid()),
    }
}
