use std::collections::BTreeMap;
use std::fmt;

/// A column value decoded according to its schema type.
///
/// Set elements and map keys/values are always atomic variants.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    String(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
    /// UUIDs surface as their canonical text.
    Uuid(String),
    Set(Vec<TypedValue>),
    /// Key/value pairs in the order the server sent them.
    Map(Vec<(TypedValue, TypedValue)>),
}

impl TypedValue {
    /// Text of a `string` or `uuid` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::String(s) | TypedValue::Uuid(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TypedValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TypedValue::Real(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&[TypedValue]> {
        match self {
            TypedValue::Set(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(TypedValue, TypedValue)]> {
        match self {
            TypedValue::Map(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Look up a map entry by its textual key.
    pub fn map_get(&self, key: &str) -> Option<&TypedValue> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Elements of a set of strings or uuids.
    pub fn to_string_list(&self) -> Option<Vec<String>> {
        self.as_set()?
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect()
    }

    /// Entries of a map whose keys and values are strings or uuids.
    pub fn to_string_map(&self) -> Option<BTreeMap<String, String>> {
        self.as_map()?
            .iter()
            .map(|(k, v)| Some((k.as_str()?.to_string(), v.as_str()?.to_string())))
            .collect()
    }

    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            TypedValue::String(_) => "string",
            TypedValue::Integer(_) => "integer",
            TypedValue::Real(_) => "real",
            TypedValue::Boolean(_) => "boolean",
            TypedValue::Uuid(_) => "uuid",
            TypedValue::Set(_) => "set",
            TypedValue::Map(_) => "map",
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::String(s) => write!(f, "{:?}", s),
            TypedValue::Integer(n) => write!(f, "{}", n),
            TypedValue::Real(n) => write!(f, "{}", n),
            TypedValue::Boolean(b) => write!(f, "{}", b),
            TypedValue::Uuid(u) => write!(f, "{}", u),
            TypedValue::Set(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            TypedValue::Map(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}
