use crate::core::{ResourceError, Result, Value};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// Declared type of a schema attribute. Governs coercion-on-write for
/// the generated typed accessors; decoding never validates against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Text,
    Integer,
    Float,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Binary,
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Binary => "binary",
        };
        write!(f, "{}", name)
    }
}

impl AttributeType {
    /// Coerces `value` to this type for a write through a typed
    /// accessor. Null and empty-string input always store Null without
    /// invoking the caster; a value that cannot be coerced is rejected
    /// with `Coercion` and the attribute keeps its prior value.
    pub fn cast(&self, attribute: &str, value: Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        if let Value::Text(s) = &value {
            if s.is_empty() {
                return Ok(Value::Null);
            }
        }

        match self {
            Self::Text => Ok(match value {
                Value::Text(s) => Value::Text(s),
                other => Value::Text(other.to_string()),
            }),

            Self::Integer => match value {
                Value::Integer(i) => Ok(Value::Integer(i)),
                Value::Float(f) if f.is_finite() => Ok(Value::Integer(f as i64)),
                Value::Boolean(b) => Ok(Value::Integer(b as i64)),
                Value::Text(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::Integer)
                    .map_err(|e| coercion(attribute, &s, e)),
                other => Err(mismatch(attribute, &other, "integer")),
            },

            Self::Float => match value {
                Value::Float(f) => Ok(Value::Float(f)),
                Value::Integer(i) => Ok(Value::Float(i as f64)),
                Value::Text(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|e| coercion(attribute, &s, e)),
                other => Err(mismatch(attribute, &other, "float")),
            },

            Self::Decimal => match value {
                Value::Decimal(d) => Ok(Value::Decimal(d)),
                Value::Integer(i) => Ok(Value::Decimal(Decimal::from(i))),
                Value::Float(f) => Decimal::try_from(f)
                    .map(Value::Decimal)
                    .map_err(|e| coercion(attribute, &f.to_string(), e)),
                Value::Text(s) => Decimal::from_str(s.trim())
                    .map(Value::Decimal)
                    .map_err(|e| coercion(attribute, &s, e)),
                other => Err(mismatch(attribute, &other, "decimal")),
            },

            Self::Boolean => match value {
                Value::Boolean(b) => Ok(Value::Boolean(b)),
                Value::Integer(0) => Ok(Value::Boolean(false)),
                Value::Integer(1) => Ok(Value::Boolean(true)),
                Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "t" | "1" | "yes" | "on" => Ok(Value::Boolean(true)),
                    "false" | "f" | "0" | "no" | "off" => Ok(Value::Boolean(false)),
                    _ => Err(coercion(attribute, &s, "not a recognized boolean literal")),
                },
                other => Err(mismatch(attribute, &other, "boolean")),
            },

            Self::Date => match value {
                Value::Date(d) => Ok(Value::Date(d)),
                Value::DateTime(dt) => Ok(Value::Date(dt.date_naive())),
                Value::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                    .map(Value::Date)
                    .map_err(|e| coercion(attribute, &s, e)),
                other => Err(mismatch(attribute, &other, "date")),
            },

            Self::DateTime => match value {
                Value::DateTime(dt) => Ok(Value::DateTime(dt)),
                Value::Date(d) => {
                    let dt = d
                        .and_hms_opt(0, 0, 0)
                        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
                    match dt {
                        Some(dt) => Ok(Value::DateTime(dt)),
                        None => Err(coercion(attribute, &d.to_string(), "invalid midnight")),
                    }
                }
                Value::Text(s) => DateTime::parse_from_rfc3339(s.trim())
                    .map(|dt| Value::DateTime(dt.with_timezone(&Utc)))
                    .map_err(|e| coercion(attribute, &s, e)),
                other => Err(mismatch(attribute, &other, "datetime")),
            },

            Self::Binary => match value {
                Value::Binary(b) => Ok(Value::Binary(b)),
                Value::Text(s) => Ok(Value::Binary(s.into_bytes())),
                other => Err(mismatch(attribute, &other, "binary")),
            },
        }
    }
}

fn coercion(attribute: &str, input: &str, reason: impl ToString) -> ResourceError {
    ResourceError::Coercion {
        attribute: attribute.to_string(),
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

fn mismatch(attribute: &str, value: &Value, target: &str) -> ResourceError {
    coercion(
        attribute,
        &value.to_string(),
        format!("cannot cast {} to {}", value.type_name(), target),
    )
}

/// One declared (name, type) pair of a resource class schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaEntry {
    pub name: String,
    pub attr_type: AttributeType,
}

impl SchemaEntry {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
        }
    }
}
