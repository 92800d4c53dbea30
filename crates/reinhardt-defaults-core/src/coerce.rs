//! Coercion of default text into typed values

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{DefaultsError, Result};
use crate::sql_type::SqlType;
use crate::value::DefaultValue;

const DATETIME_FORMATS: &[&str] = &[
	"%Y-%m-%d %H:%M:%S%.f",
	"%Y-%m-%dT%H:%M:%S%.f",
	"%Y-%m-%d %H:%M",
	"%d-%b-%Y %H:%M:%S",
];

/// Convert the canonical default text into a value of `sql_type`
///
/// # Examples
///
/// ```
/// use reinhardt_defaults_core::{DefaultValue, SqlType, coerce};
/// use rust_decimal::Decimal;
///
/// assert_eq!(coerce("-1", &SqlType::Integer).unwrap(), DefaultValue::Integer(-1));
/// assert_eq!(
///     coerce("2.78", &SqlType::Decimal).unwrap(),
///     DefaultValue::Decimal(Decimal::new(278, 2))
/// );
/// ```
pub fn coerce(text: &str, sql_type: &SqlType) -> Result<DefaultValue> {
	match sql_type {
		SqlType::Integer => coerce_integer(text, sql_type),
		SqlType::Decimal => coerce_decimal(text, sql_type).map(DefaultValue::Decimal),
		SqlType::Float => text
			.trim()
			.parse::<f64>()
			.map(DefaultValue::Float)
			.map_err(|e| DefaultsError::coercion(text, sql_type, e)),
		SqlType::Boolean => coerce_boolean(text, sql_type).map(DefaultValue::Boolean),
		SqlType::Blob => Ok(DefaultValue::Blob(coerce_blob(text, sql_type)?)),
		SqlType::Date => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
			.map(DefaultValue::Date)
			.map_err(|e| DefaultsError::coercion(text, sql_type, e)),
		SqlType::DateTime => coerce_datetime(text, sql_type).map(DefaultValue::DateTime),
		SqlType::String | SqlType::Text | SqlType::Bpchar | SqlType::Other(_) => {
			Ok(DefaultValue::String(text.to_string()))
		}
	}
}

fn coerce_integer(text: &str, sql_type: &SqlType) -> Result<DefaultValue> {
	let trimmed = text.trim();
	if let Ok(i) = trimmed.parse::<i64>() {
		return Ok(DefaultValue::Integer(i));
	}

	// `NUMBER(38)` and `decimal(10,0)` columns may report `5.0` or `1e3`
	let decimal = coerce_decimal(trimmed, sql_type)?;
	if !decimal.fract().is_zero() {
		return Err(DefaultsError::coercion(text, sql_type, "not an integer"));
	}
	let decimal = decimal.normalize();
	match decimal.to_string().parse::<i64>() {
		Ok(i) => Ok(DefaultValue::Integer(i)),
		// `bigint unsigned` and `NUMBER(38)` values past i64 stay exact
		Err(_) => Ok(DefaultValue::Decimal(decimal)),
	}
}

fn coerce_decimal(text: &str, sql_type: &SqlType) -> Result<Decimal> {
	let trimmed = text.trim();
	let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
	Decimal::from_str(trimmed)
		.or_else(|_| Decimal::from_scientific(trimmed))
		.map_err(|e| DefaultsError::coercion(text, sql_type, e))
}

fn coerce_boolean(text: &str, sql_type: &SqlType) -> Result<bool> {
	match text.trim().to_ascii_lowercase().as_str() {
		"t" | "true" | "1" | "y" | "yes" | "on" => Ok(true),
		"f" | "false" | "0" | "n" | "no" | "off" => Ok(false),
		_ => Err(DefaultsError::coercion(text, sql_type, "not a boolean")),
	}
}

/// PostgreSQL `bytea` hex output (`\x0a0b`) decodes to bytes; anything else
/// is taken as the raw bytes of the text
fn coerce_blob(text: &str, sql_type: &SqlType) -> Result<Vec<u8>> {
	match text.strip_prefix("\\x") {
		Some(digits) => hex::decode(digits).map_err(|e| DefaultsError::coercion(text, sql_type, e)),
		None => Ok(text.as_bytes().to_vec()),
	}
}

fn coerce_datetime(text: &str, sql_type: &SqlType) -> Result<NaiveDateTime> {
	let trimmed = text.trim();

	for format in DATETIME_FORMATS {
		if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
			return Ok(dt);
		}
	}
	if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
		return Ok(dt.naive_utc());
	}
	if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f%#z") {
		return Ok(dt.naive_utc());
	}
	if let Some(midnight) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
		.ok()
		.and_then(|date| date.and_hms_opt(0, 0, 0))
	{
		return Ok(midnight);
	}

	Err(DefaultsError::coercion(
		text,
		sql_type,
		"unrecognized timestamp format",
	))
}
