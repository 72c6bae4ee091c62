//! Record types shared between the spreadsheet side and the product store

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::fmt;

/// Product key shared by the spreadsheet and the remote table
///
/// Canonical integer text normalizes to `Int`, so `"42"`, `42` and `42.0`
/// all refer to the same product regardless of where they were read from.
/// Text that only looks numeric (`"007"`, `"+5"`) stays `Text`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Identifier {
    Int(i64),
    Text(String),
}

impl Identifier {
    /// Parse a textual key. Returns None for blank input.
    pub fn from_text(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.parse::<i64>() {
            Ok(n) if n.to_string() == trimmed => Some(Self::Int(n)),
            _ => Some(Self::Text(trimmed.to_string())),
        }
    }

    /// Spreadsheets store every number as a float; whole values become `Int`
    pub fn from_float(f: f64) -> Self {
        if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
            Self::Int(f as i64)
        } else {
            Self::Text(f.to_string())
        }
    }

    /// Render for the run report: integers bare, text single-quoted
    pub fn repr(&self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Text(s) => quote_repr(s),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Identifier {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self::from_text(s).unwrap_or_else(|| Self::Text(String::new()))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawIdentifier {
    Int(i64),
    Float(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawIdentifier::deserialize(deserializer)? {
            RawIdentifier::Int(n) => Ok(Self::Int(n)),
            RawIdentifier::Float(f) => Ok(Self::from_float(f)),
            RawIdentifier::Text(s) => Self::from_text(&s)
                .ok_or_else(|| serde::de::Error::custom("identifier must not be blank")),
        }
    }
}

/// Single-quoted list element, the format used in run reports
pub fn quote_repr(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Render a numeric SKU the way a person typed it: whole values without `.0`
pub fn sku_from_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// One input line: the product to touch and the SKU the sheet expects it to have
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub identifier: Identifier,
    pub sku: String,
}

impl Row {
    pub fn new(identifier: impl Into<Identifier>, sku: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            sku: sku.into(),
        }
    }
}

/// Identifier and current SKU of a product as the store reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRecord {
    pub identifier: Identifier,
    /// Null SKU columns come back as None
    pub sku: Option<String>,
}

impl RemoteRecord {
    pub fn new(identifier: impl Into<Identifier>, sku: Option<&str>) -> Self {
        Self {
            identifier: identifier.into(),
            sku: sku.map(str::to_string),
        }
    }

    /// Extract a record from one row of a PostgREST JSON response
    pub fn from_json(row: &Value, id_column: &str, sku_column: &str) -> Result<Self, String> {
        let object = row
            .as_object()
            .ok_or_else(|| format!("expected an object per row, got {}", row))?;

        let id_value = object
            .get(id_column)
            .ok_or_else(|| format!("row is missing column '{}'", id_column))?;
        let identifier: Identifier = serde_json::from_value(id_value.clone())
            .map_err(|e| format!("invalid '{}' value {}: {}", id_column, id_value, e))?;

        // Same rendering as sheet cells so equal SKUs compare equal
        let sku = match object.get(sku_column) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => i.to_string(),
                (None, Some(f)) => sku_from_float(f),
                (None, None) => n.to_string(),
            }),
            Some(other) => Some(other.to_string()),
        };

        Ok(Self { identifier, sku })
    }
}

/// Names of the three columns cleared when a product leaves preorder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreorderFields {
    pub flag: String,
    pub discount: String,
    pub date: String,
}

impl Default for PreorderFields {
    fn default() -> Self {
        Self {
            flag: "preorder".to_string(),
            discount: "preorder_discount".to_string(),
            date: "preorder_date".to_string(),
        }
    }
}

impl PreorderFields {
    /// PATCH body: flag off, discount and date nulled
    pub fn clearing_payload(&self) -> Value {
        let mut data = Map::new();
        data.insert(self.flag.clone(), Value::Bool(false));
        data.insert(self.discount.clone(), Value::Null);
        data.insert(self.date.clone(), Value::Null);
        Value::Object(data)
    }
}
