//! Dialect-specific parsing of raw default expressions
//!
//! Each parser turns the text a dialect reports for a column default into a
//! [`ParsedDefault`]: SQL `NULL`, the literal's text before type coercion, or
//! an expression the database evaluates itself.

mod literal;
pub mod mysql;
pub mod oracle;
pub mod postgres;
pub mod sqlite;

use crate::dialect::Dialect;
use crate::error::Result;

/// Outcome of parsing a raw default expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedDefault {
	/// The default is SQL `NULL`
	Null,
	/// A literal, unquoted and unescaped but not yet coerced
	Value(String),
	/// An expression computed at insert time (`now()`, `CURRENT_TIMESTAMP`)
	Function(String),
}

/// Parse `raw` with the rules of `dialect`
///
/// # Examples
///
/// ```
/// use reinhardt_defaults_core::Dialect;
/// use reinhardt_defaults_core::parse::{ParsedDefault, parse_default};
///
/// assert_eq!(
///     parse_default(Dialect::Postgres, "'foo''::bar'::character varying").unwrap(),
///     ParsedDefault::Value("foo'::bar".to_string())
/// );
/// assert_eq!(
///     parse_default(Dialect::Postgres, "now()").unwrap(),
///     ParsedDefault::Function("now()".to_string())
/// );
/// ```
pub fn parse_default(dialect: Dialect, raw: &str) -> Result<ParsedDefault> {
	match dialect {
		Dialect::MySql => mysql::parse(raw),
		Dialect::MariaDb => mysql::parse_mariadb(raw),
		Dialect::Postgres => postgres::parse(raw),
		Dialect::Oracle => oracle::parse(raw),
		Dialect::Sqlite => sqlite::parse(raw),
	}
}
