use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::rules::error::RuleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Number,
    Text,
    Boolean,
    Percent,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Number => "num",
            ValueKind::Text => "alpha",
            ValueKind::Boolean => "bool",
            ValueKind::Percent => "percent",
        }
    }

    /// Number and Percent attributes both hold numbers.
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueKind::Number | ValueKind::Percent)
    }

    /// Whether a runtime value may be stored in a slot of this kind.
    pub fn accepts(self, value: &Value) -> bool {
        match value {
            Value::Number(_) => self.is_numeric(),
            Value::Text(_) => self == ValueKind::Text,
            Value::Boolean(_) => self == ValueKind::Boolean,
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "num" => Ok(ValueKind::Number),
            "alpha" => Ok(ValueKind::Text),
            "bool" => Ok(ValueKind::Boolean),
            "percent" => Ok(ValueKind::Percent),
            _ => Err(RuleError::UnsupportedKind(s.to_string())),
        }
    }
}

/// A concrete attribute value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Boolean(_) => "boolean",
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
        }
    }
}

// Whole numbers go out as JSON integers so hand-written rule sets round-trip
// without growing a trailing ".0".
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Boolean(b) => serializer.serialize_bool(*b),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDef {
    pub name: String,
    pub kind: ValueKind,
}

/// One entity's value for a defined attribute. `kind` is captured from the
/// definition when the value is created.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeValue {
    pub attribute: String,
    pub kind: ValueKind,
    pub value: Value,
}

impl AttributeValue {
    pub fn new(attribute: impl Into<String>, kind: ValueKind, value: impl Into<Value>) -> Self {
        Self {
            attribute: attribute.into(),
            kind,
            value: value.into(),
        }
    }
}
