//! Typed default values

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A default value coerced to the column's type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum DefaultValue {
	Integer(i64),
	/// Exact decimal, never routed through a float
	Decimal(Decimal),
	Float(f64),
	Boolean(bool),
	String(String),
	Blob(Vec<u8>),
	Date(NaiveDate),
	DateTime(NaiveDateTime),
}

impl DefaultValue {
	/// `''` for character columns and an empty byte string for binary ones
	pub fn is_empty_string(&self) -> bool {
		match self {
			DefaultValue::String(s) => s.is_empty(),
			DefaultValue::Blob(b) => b.is_empty(),
			_ => false,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			DefaultValue::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_i64(&self) -> Option<i64> {
		match self {
			DefaultValue::Integer(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_decimal(&self) -> Option<Decimal> {
		match self {
			DefaultValue::Decimal(d) => Some(*d),
			_ => None,
		}
	}
}

impl fmt::Display for DefaultValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DefaultValue::Integer(i) => write!(f, "{}", i),
			DefaultValue::Decimal(d) => write!(f, "{}", d),
			DefaultValue::Float(v) => write!(f, "{}", v),
			DefaultValue::Boolean(b) => write!(f, "{}", b),
			DefaultValue::String(s) => f.write_str(s),
			DefaultValue::Blob(b) => write!(f, "\\x{}", hex::encode(b)),
			DefaultValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
			DefaultValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f")),
		}
	}
}

impl From<i64> for DefaultValue {
	fn from(i: i64) -> Self {
		DefaultValue::Integer(i)
	}
}

impl From<i32> for DefaultValue {
	fn from(i: i32) -> Self {
		DefaultValue::Integer(i as i64)
	}
}

impl From<Decimal> for DefaultValue {
	fn from(d: Decimal) -> Self {
		DefaultValue::Decimal(d)
	}
}

impl From<f64> for DefaultValue {
	fn from(v: f64) -> Self {
		DefaultValue::Float(v)
	}
}

impl From<bool> for DefaultValue {
	fn from(b: bool) -> Self {
		DefaultValue::Boolean(b)
	}
}

impl From<&str> for DefaultValue {
	fn from(s: &str) -> Self {
		DefaultValue::String(s.to_string())
	}
}

impl From<String> for DefaultValue {
	fn from(s: String) -> Self {
		DefaultValue::String(s)
	}
}

impl From<Vec<u8>> for DefaultValue {
	fn from(b: Vec<u8>) -> Self {
		DefaultValue::Blob(b)
	}
}

/// Dialect-independent view of a column default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum NormalizedDefault {
	/// No literal default can be presented: the database computes it, or the
	/// reported expression could not be understood
	NoDefault,
	/// The default is SQL `NULL`
	NullDefault,
	Literal(DefaultValue),
}

impl NormalizedDefault {
	pub fn is_null(&self) -> bool {
		matches!(self, NormalizedDefault::NullDefault)
	}

	pub fn is_literal(&self) -> bool {
		matches!(self, NormalizedDefault::Literal(_))
	}

	pub fn as_literal(&self) -> Option<&DefaultValue> {
		match self {
			NormalizedDefault::Literal(value) => Some(value),
			_ => None,
		}
	}

	/// The value a new row receives when the column is omitted
	///
	/// `None` stands for SQL `NULL` as well as for defaults the database
	/// has to compute itself.
	pub fn into_value(self) -> Option<DefaultValue> {
		match self {
			NormalizedDefault::Literal(value) => Some(value),
			_ => None,
		}
	}
}
