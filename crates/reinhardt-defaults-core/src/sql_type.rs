//! Canonical column types
//!
//! Each dialect names its types differently (`int4`, `int(11)`, `NUMBER(38)`,
//! `character varying(255)`, `schema_1.text`). Default coercion only needs a
//! coarse, dialect-free classification, which is what [`SqlType`] provides.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dialect::Dialect;

/// Dialect-independent column type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlType {
	Integer,
	Decimal,
	Float,
	Boolean,
	String,
	Text,
	/// PostgreSQL blank-padded `character(n)`
	Bpchar,
	Blob,
	Date,
	DateTime,
	/// Any type the normalizer has no special handling for
	Other(String),
}

impl SqlType {
	/// Classify a native type name as reported by `dialect`
	///
	/// Length and precision arguments are dropped, except where they change the
	/// classification (`tinyint(1)` on MySQL, a zero scale on decimals).
	/// Schema-qualified names (`schema_1.text`) resolve to their last segment.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_defaults_core::{Dialect, SqlType};
	///
	/// assert_eq!(SqlType::from_native(Dialect::MySql, "int(11)"), SqlType::Integer);
	/// assert_eq!(SqlType::from_native(Dialect::MySql, "tinyint(1)"), SqlType::Boolean);
	/// assert_eq!(SqlType::from_native(Dialect::Postgres, "schema_1.text"), SqlType::Text);
	/// assert_eq!(SqlType::from_native(Dialect::Postgres, "numeric(3,2)"), SqlType::Decimal);
	/// assert_eq!(SqlType::from_native(Dialect::Oracle, "NUMBER(38)"), SqlType::Integer);
	/// ```
	pub fn from_native(dialect: Dialect, native: &str) -> Self {
		let lower = native.trim().to_ascii_lowercase();
		let (base, args) = split_arguments(&lower);
		let base = unqualify(&base);
		let scale = args.as_deref().and_then(parse_scale);

		match base {
			"tinyint" if dialect.honors_strict_mode() && args.as_deref() == Some("1") => {
				SqlType::Boolean
			}
			"int" | "integer" | "int2" | "int4" | "int8" | "smallint" | "bigint" | "mediumint"
			| "tinyint" | "serial" | "bigserial" | "smallserial" | "pls_integer" => SqlType::Integer,
			"number" if dialect == Dialect::Oracle => match (args.as_deref(), scale) {
				(None, _) => SqlType::Decimal,
				(Some(_), Some(0)) | (Some(_), None) => SqlType::Integer,
				_ => SqlType::Decimal,
			},
			"decimal" | "numeric" | "dec" | "number" => match scale {
				Some(0) => SqlType::Integer,
				_ => SqlType::Decimal,
			},
			"float" | "double" | "real" | "double precision" | "float4" | "float8"
			| "binary_float" | "binary_double" => SqlType::Float,
			"boolean" | "bool" => SqlType::Boolean,
			"bpchar" => SqlType::Bpchar,
			"character" | "char" if dialect == Dialect::Postgres => SqlType::Bpchar,
			"varchar" | "character varying" | "char varying" | "varchar2" | "nvarchar2"
			| "nvarchar" | "string" | "character" | "char" | "nchar" => SqlType::String,
			"text" | "tinytext" | "mediumtext" | "longtext" | "clob" | "nclob" | "citext" => {
				SqlType::Text
			}
			"blob" | "tinyblob" | "mediumblob" | "longblob" | "bytea" | "binary" | "varbinary"
			| "raw" | "long raw" => SqlType::Blob,
			// Oracle DATE carries a time component
			"date" if dialect == Dialect::Oracle => SqlType::DateTime,
			"date" => SqlType::Date,
			"datetime"
			| "timestamp"
			| "timestamptz"
			| "timestamp without time zone"
			| "timestamp with time zone" => SqlType::DateTime,
			other => SqlType::Other(other.to_string()),
		}
	}

	/// `TEXT`/`BLOB` columns, which MySQL refuses to give literal defaults
	pub fn is_text_or_blob(&self) -> bool {
		matches!(self, SqlType::Text | SqlType::Blob)
	}

	/// Types for which `''` is a legitimate default
	pub fn accepts_empty_string(&self) -> bool {
		matches!(
			self,
			SqlType::String | SqlType::Text | SqlType::Bpchar | SqlType::Blob
		)
	}

	pub fn is_numeric(&self) -> bool {
		matches!(self, SqlType::Integer | SqlType::Decimal | SqlType::Float)
	}

	pub fn name(&self) -> &str {
		match self {
			SqlType::Integer => "integer",
			SqlType::Decimal => "decimal",
			SqlType::Float => "float",
			SqlType::Boolean => "boolean",
			SqlType::String => "string",
			SqlType::Text => "text",
			SqlType::Bpchar => "bpchar",
			SqlType::Blob => "blob",
			SqlType::Date => "date",
			SqlType::DateTime => "datetime",
			SqlType::Other(name) => name,
		}
	}
}

impl fmt::Display for SqlType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Split `numeric(3,2)` into `("numeric", Some("3,2"))`
///
/// Trailing modifiers after the argument list (`int(11) unsigned`,
/// `timestamp(6) with time zone`) are folded back into the base name.
fn split_arguments(native: &str) -> (String, Option<String>) {
	let native = native.trim_end_matches("[]");
	match (native.find('('), native.find(')')) {
		(Some(open), Some(close)) if open < close => {
			let args = native[open + 1..close].replace(' ', "");
			let rest = native[close + 1..].trim();
			let rest = rest.strip_prefix("unsigned").unwrap_or(rest).trim();
			let base = native[..open].trim();
			let base = if rest.is_empty() {
				base.to_string()
			} else {
				format!("{} {}", base, rest)
			};
			(base, Some(args))
		}
		_ => {
			let base = native.strip_suffix(" unsigned").unwrap_or(native);
			(base.trim().to_string(), None)
		}
	}
}

fn unqualify(base: &str) -> &str {
	let base = base.rsplit('.').next().unwrap_or(base);
	base.trim_matches('"')
}

fn parse_scale(args: &str) -> Option<u32> {
	match args.split_once(',') {
		Some((_, scale)) => scale.trim().parse().ok(),
		None => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(Dialect::MySql, "int(11)", SqlType::Integer)]
	#[case(Dialect::MySql, "int(10) unsigned", SqlType::Integer)]
	#[case(Dialect::MySql, "tinyint(1)", SqlType::Boolean)]
	#[case(Dialect::MySql, "text", SqlType::Text)]
	#[case(Dialect::MySql, "mediumblob", SqlType::Blob)]
	#[case(Dialect::MySql, "varchar(255)", SqlType::String)]
	#[case(Dialect::MySql, "decimal(3,2)", SqlType::Decimal)]
	#[case(Dialect::MySql, "decimal(10,0)", SqlType::Integer)]
	#[case(Dialect::Postgres, "integer", SqlType::Integer)]
	#[case(Dialect::Postgres, "character varying(255)", SqlType::String)]
	#[case(Dialect::Postgres, "character(10)", SqlType::Bpchar)]
	#[case(Dialect::Postgres, "bpchar", SqlType::Bpchar)]
	#[case(Dialect::Postgres, "schema_1.text", SqlType::Text)]
	#[case(Dialect::Postgres, "bytea", SqlType::Blob)]
	#[case(Dialect::Postgres, "timestamp(6) without time zone", SqlType::DateTime)]
	#[case(Dialect::Postgres, "double precision", SqlType::Float)]
	#[case(Dialect::Postgres, "date", SqlType::Date)]
	#[case(Dialect::Oracle, "NUMBER(38)", SqlType::Integer)]
	#[case(Dialect::Oracle, "NUMBER(3,2)", SqlType::Decimal)]
	#[case(Dialect::Oracle, "NUMBER", SqlType::Decimal)]
	#[case(Dialect::Oracle, "VARCHAR2(255)", SqlType::String)]
	#[case(Dialect::Oracle, "CLOB", SqlType::Text)]
	#[case(Dialect::Oracle, "DATE", SqlType::DateTime)]
	#[case(Dialect::Sqlite, "INTEGER", SqlType::Integer)]
	#[case(Dialect::Sqlite, "BLOB", SqlType::Blob)]
	fn test_from_native(#[case] dialect: Dialect, #[case] native: &str, #[case] expected: SqlType) {
		assert_eq!(SqlType::from_native(dialect, native), expected);
	}

	#[rstest]
	fn test_unknown_type_is_kept() {
		assert_eq!(
			SqlType::from_native(Dialect::Postgres, "tsvector"),
			SqlType::Other("tsvector".to_string())
		);
	}

	#[rstest]
	fn test_tinyint_is_integer_outside_mysql() {
		assert_eq!(
			SqlType::from_native(Dialect::Sqlite, "tinyint(1)"),
			SqlType::Integer
		);
	}
}
