use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

use crate::error::{OvsdbLinkError, Result};

/// OVSDB atomic type.
///
/// Every column value is built from these: scalars are a single atom,
/// sets and maps are collections of atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AtomicType {
    Integer,
    Real,
    Boolean,
    String,
    Uuid,
}

impl AtomicType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AtomicType::Integer => "integer",
            AtomicType::Real => "real",
            AtomicType::Boolean => "boolean",
            AtomicType::String => "string",
            AtomicType::Uuid => "uuid",
        }
    }
}

impl fmt::Display for AtomicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AtomicType {
    type Err = OvsdbLinkError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "integer" => Ok(AtomicType::Integer),
            "real" => Ok(AtomicType::Real),
            "boolean" => Ok(AtomicType::Boolean),
            "string" => Ok(AtomicType::String),
            "uuid" => Ok(AtomicType::Uuid),
            other => Err(OvsdbLinkError::SchemaError(format!(
                "unknown atomic type '{}'",
                other
            ))),
        }
    }
}

/// Key or value half of a column type, with its optional reference target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseType {
    pub atomic: AtomicType,
    /// Table referenced by a `uuid` atom, if the schema names one.
    pub ref_table: Option<String>,
}

impl BaseType {
    pub fn new(atomic: AtomicType) -> Self {
        Self {
            atomic,
            ref_table: None,
        }
    }

    fn from_json(column: &str, raw: &JsonValue) -> Result<Self> {
        match raw {
            JsonValue::String(name) => Ok(Self::new(name.parse()?)),
            JsonValue::Object(obj) => {
                let atomic = obj
                    .get("type")
                    .and_then(JsonValue::as_str)
                    .ok_or_else(|| {
                        OvsdbLinkError::SchemaError(format!(
                            "column '{}': base type is missing 'type'",
                            column
                        ))
                    })?
                    .parse()?;
                let ref_table = obj
                    .get("refTable")
                    .and_then(JsonValue::as_str)
                    .map(str::to_string);
                Ok(Self { atomic, ref_table })
            }
            other => Err(OvsdbLinkError::SchemaError(format!(
                "column '{}': unexpected base type {}",
                column, other
            ))),
        }
    }
}

/// Upper bound on the number of elements in a column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxSize {
    Bounded(u64),
    Unlimited,
}

/// A column's type exactly as the schema document declares it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    pub key: BaseType,
    pub value: Option<BaseType>,
    pub min: u64,
    pub max: MaxSize,
}

impl ColumnType {
    /// A mandatory single-atom column.
    pub fn scalar(atomic: AtomicType) -> Self {
        Self {
            key: BaseType::new(atomic),
            value: None,
            min: 1,
            max: MaxSize::Bounded(1),
        }
    }

    /// Parse the `type` member of a schema column definition.
    pub fn from_json(column: &str, raw: &JsonValue) -> Result<Self> {
        let obj = match raw {
            JsonValue::String(_) => {
                return Ok(Self {
                    key: BaseType::from_json(column, raw)?,
                    value: None,
                    min: 1,
                    max: MaxSize::Bounded(1),
                })
            }
            JsonValue::Object(obj) => obj,
            other => {
                return Err(OvsdbLinkError::SchemaError(format!(
                    "column '{}': unexpected type {}",
                    column, other
                )))
            }
        };

        let key = obj
            .get("key")
            .ok_or_else(|| {
                OvsdbLinkError::SchemaError(format!("column '{}': type is missing 'key'", column))
            })
            .and_then(|k| BaseType::from_json(column, k))?;
        let value = obj
            .get("value")
            .map(|v| BaseType::from_json(column, v))
            .transpose()?;

        let min = match obj.get("min") {
            None => 1,
            Some(v) => v.as_u64().ok_or_else(|| {
                OvsdbLinkError::SchemaError(format!("column '{}': invalid 'min' {}", column, v))
            })?,
        };
        let max = match obj.get("max") {
            None => MaxSize::Bounded(1),
            Some(JsonValue::String(s)) if s == "unlimited" => MaxSize::Unlimited,
            Some(v) => MaxSize::Bounded(v.as_u64().ok_or_else(|| {
                OvsdbLinkError::SchemaError(format!("column '{}': invalid 'max' {}", column, v))
            })?),
        };

        Ok(Self {
            key,
            value,
            min,
            max,
        })
    }

    /// Resolve to the decoded value shape.
    ///
    /// Optional scalars (`min: 0, max: 1`) resolve to their scalar type; an
    /// absent value decodes as [`DecodeError::Absent`](crate::DecodeError::Absent).
    pub fn data_type(&self) -> DataType {
        if let Some(value) = &self.value {
            return DataType::Map(self.key.atomic, value.atomic);
        }
        if self.max != MaxSize::Bounded(1) {
            return DataType::Set(self.key.atomic);
        }
        DataType::scalar(self.key.atomic)
    }

    /// True for a scalar column that may hold no value.
    pub fn is_optional(&self) -> bool {
        self.value.is_none() && self.min == 0 && self.max == MaxSize::Bounded(1)
    }
}

/// Closed set of value shapes a column can decode into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    String,
    Integer,
    Real,
    Boolean,
    Uuid,
    Set(AtomicType),
    Map(AtomicType, AtomicType),
}

impl DataType {
    pub fn scalar(atomic: AtomicType) -> Self {
        match atomic {
            AtomicType::Integer => DataType::Integer,
            AtomicType::Real => DataType::Real,
            AtomicType::Boolean => DataType::Boolean,
            AtomicType::String => DataType::String,
            AtomicType::Uuid => DataType::Uuid,
        }
    }

    /// The atomic type of a scalar, or `None` for sets and maps.
    pub fn as_atomic(&self) -> Option<AtomicType> {
        match self {
            DataType::String => Some(AtomicType::String),
            DataType::Integer => Some(AtomicType::Integer),
            DataType::Real => Some(AtomicType::Real),
            DataType::Boolean => Some(AtomicType::Boolean),
            DataType::Uuid => Some(AtomicType::Uuid),
            DataType::Set(_) | DataType::Map(_, _) => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Set(atomic) => write!(f, "[]{}", atomic),
            DataType::Map(key, value) => write!(f, "map[{}]{}", key, value),
            scalar => match scalar.as_atomic() {
                Some(atomic) => write!(f, "{}", atomic),
                None => Ok(()),
            },
        }
    }
}

impl FromStr for DataType {
    type Err = OvsdbLinkError;

    /// Parse the display form: `string`, `[]uuid`, `map[string]integer`, ...
    fn from_str(s: &str) -> Result<Self> {
        if let Some(element) = s.strip_prefix("[]") {
            return Ok(DataType::Set(element.parse()?));
        }
        if let Some(rest) = s.strip_prefix("map[") {
            let (key, value) = rest.split_once(']').ok_or_else(|| {
                OvsdbLinkError::SchemaError(format!("malformed map type '{}'", s))
            })?;
            return Ok(DataType::Map(key.parse()?, value.parse()?));
        }
        Ok(DataType::scalar(s.parse()?))
    }
}
