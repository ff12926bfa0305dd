use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::str::FromStr;

use super::condition::{is_identifier, Condition};
use super::schema::DatabaseSchema;
use crate::error::{OvsdbLinkError, Result};

const KEYWORDS: &[&str] = &["SELECT", "FROM", "WHERE"];

/// A parsed `select` operation.
///
/// Built from `SELECT <cols|*> FROM <table> [WHERE <col>==<value>]`.
/// An empty column list means "all columns".
///
/// # Wire form
///
/// ```json
/// {"op":"select","table":"Open_vSwitch","where":[["db_version","==","7.3.0"]],"columns":["db_version"]}
/// ```
///
/// Keys are emitted in this order; `columns` is omitted when empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    table: String,
    columns: Vec<String>,
    condition: Option<Condition>,
}

impl Operation {
    /// Select every column of `table`.
    pub fn select(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            condition: None,
        }
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Parse a query string.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ovsdb_link::Operation;
    ///
    /// let op = Operation::parse("SELECT _uuid, name FROM Bridge WHERE name==br-int").unwrap();
    /// assert_eq!(op.table(), "Bridge");
    /// assert_eq!(op.columns(), ["_uuid", "name"]);
    /// ```
    pub fn parse(query: &str) -> Result<Self> {
        let tokens = tokenize(query)?;

        match tokens.first() {
            Some(first) if first == "SELECT" => {}
            Some(first) => {
                return Err(OvsdbLinkError::ParseError(format!(
                    "missing SELECT: query starts with '{}'",
                    first
                )))
            }
            None => return Err(OvsdbLinkError::ParseError("empty query".to_string())),
        }

        let from = tokens.iter().position(|t| t == "FROM").ok_or_else(|| {
            OvsdbLinkError::ParseError(format!("missing FROM in '{}'", query))
        })?;

        let columns = parse_columns(&tokens[1..from])?;

        let table = tokens.get(from + 1).ok_or_else(|| {
            OvsdbLinkError::ParseError(format!("missing table name after FROM in '{}'", query))
        })?;
        if !is_identifier(table) || is_keyword(table) {
            return Err(OvsdbLinkError::ParseError(format!(
                "invalid table name '{}'",
                table
            )));
        }

        let rest = &tokens[from + 2..];
        let condition = match rest {
            [] => None,
            [keyword, ..] if keyword != "WHERE" => {
                return Err(OvsdbLinkError::ParseError(format!(
                    "unexpected '{}' after table name, expected WHERE",
                    keyword
                )))
            }
            [_] => {
                return Err(OvsdbLinkError::ParseError(
                    "WHERE without a condition".to_string(),
                ))
            }
            [_, fragment] => Some(Condition::parse(fragment)?),
            [_, ..] => {
                return Err(OvsdbLinkError::ParseError(format!(
                    "only one condition is supported, got '{}'",
                    rest[1..].join(" ")
                )))
            }
        };

        Ok(Self {
            table: table.clone(),
            columns,
            condition,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Requested columns; empty means all columns.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    pub fn selects_all_columns(&self) -> bool {
        self.columns.is_empty()
    }

    /// Check the operation against `schema` and type its condition value.
    pub fn bind(&self, schema: &DatabaseSchema) -> Result<Self> {
        let table = schema.table(&self.table)?;
        for column in &self.columns {
            if !table.has_column(column) {
                return Err(OvsdbLinkError::SchemaError(format!(
                    "column '{}' does not exist in table '{}'",
                    column, self.table
                )));
            }
        }

        let condition = match &self.condition {
            Some(condition) => {
                let data_type = schema.data_type(&self.table, condition.column())?;
                Some(condition.bind(&data_type)?)
            }
            None => None,
        };

        Ok(Self {
            table: self.table.clone(),
            columns: self.columns.clone(),
            condition,
        })
    }
}

impl FromStr for Operation {
    type Err = OvsdbLinkError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = if self.columns.is_empty() { 3 } else { 4 };
        let mut op = serializer.serialize_struct("Operation", len)?;
        op.serialize_field("op", "select")?;
        op.serialize_field("table", &self.table)?;
        let conditions: Vec<&Condition> = self.condition.iter().collect();
        op.serialize_field("where", &conditions)?;
        if !self.columns.is_empty() {
            op.serialize_field("columns", &self.columns)?;
        }
        op.end()
    }
}

/// Anything `transact` accepts as a query.
pub trait IntoOperation {
    fn into_operation(self) -> Result<Operation>;
}

impl IntoOperation for Operation {
    fn into_operation(self) -> Result<Operation> {
        Ok(self)
    }
}

impl IntoOperation for &Operation {
    fn into_operation(self) -> Result<Operation> {
        Ok(self.clone())
    }
}

impl IntoOperation for &str {
    fn into_operation(self) -> Result<Operation> {
        Operation::parse(self)
    }
}

impl IntoOperation for String {
    fn into_operation(self) -> Result<Operation> {
        Operation::parse(&self)
    }
}

impl IntoOperation for &String {
    fn into_operation(self) -> Result<Operation> {
        Operation::parse(self)
    }
}

fn is_keyword(token: &str) -> bool {
    KEYWORDS.contains(&token)
}

/// Split on whitespace, keeping double-quoted runs inside one token.
fn tokenize(query: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for c in query.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => {
                escaped = true;
                current.push(c);
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if in_quotes {
        return Err(OvsdbLinkError::ParseError(format!(
            "unterminated quote in '{}'",
            query
        )));
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

fn parse_columns(tokens: &[String]) -> Result<Vec<String>> {
    let segment = tokens.join(" ");
    let segment = segment.trim();
    if segment.is_empty() {
        return Err(OvsdbLinkError::ParseError(
            "missing column list between SELECT and FROM".to_string(),
        ));
    }
    if segment == "*" {
        return Ok(Vec::new());
    }

    let mut columns = Vec::new();
    for name in segment.split(',').map(str::trim) {
        if name.is_empty() {
            return Err(OvsdbLinkError::ParseError(format!(
                "empty column name in '{}'",
                segment
            )));
        }
        if !is_identifier(name) || is_keyword(name) {
            return Err(OvsdbLinkError::ParseError(format!(
                "invalid column name '{}'",
                name
            )));
        }
        columns.push(name.to_string());
    }
    Ok(columns)
}
