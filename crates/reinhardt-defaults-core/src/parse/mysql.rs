//! MySQL and MariaDB default expressions
//!
//! MySQL reports literal defaults unquoted in `information_schema.COLUMNS`
//! (`Smith`, `-1`, `0`) and leaves it to the caller to tell literals from
//! computed defaults. MariaDB 10.2.7 and later quote string literals and
//! report `NULL` explicitly.

use regex::Regex;
use std::sync::OnceLock;

use super::ParsedDefault;
use super::literal::{is_numeric, parens_balanced, split_quoted, strip_wrapping_parens};
use crate::error::{DefaultsError, Result};

struct Patterns {
	/// `CURRENT_TIMESTAMP`, `CURRENT_TIMESTAMP(6)`, `now()`,
	/// `current_timestamp() ON UPDATE current_timestamp()`
	current_time: Regex,
	/// Charset introducer on a MySQL 8 expression default: `_utf8mb4\'abc\'`
	introducer: Regex,
}

impl Patterns {
	fn new() -> Self {
		Self {
			current_time: Regex::new(
				r"(?i)^(current_timestamp|current_date|current_time|localtime|localtimestamp|now|sysdate|utc_timestamp)(\s*\(\s*\d*\s*\))?(\s+on\s+update\s+.+)?$",
			)
			.unwrap(),
			introducer: Regex::new(r"^_[A-Za-z0-9]+\\?'").unwrap(),
		}
	}
}

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

fn patterns() -> &'static Patterns {
	PATTERNS.get_or_init(Patterns::new)
}

fn is_computed(raw: &str) -> bool {
	let p = patterns();
	let trimmed = raw.trim();
	p.current_time.is_match(trimmed)
		|| p.introducer.is_match(trimmed)
		|| (trimmed.starts_with('(') && trimmed.ends_with(')') && parens_balanced(trimmed))
}

/// Parse a MySQL `COLUMN_DEFAULT`
///
/// Everything that is not recognizably computed is a literal, taken verbatim.
pub fn parse(raw: &str) -> Result<ParsedDefault> {
	if is_computed(raw) {
		return Ok(ParsedDefault::Function(raw.trim().to_string()));
	}
	Ok(ParsedDefault::Value(raw.to_string()))
}

/// Parse a MariaDB `COLUMN_DEFAULT`
pub fn parse_mariadb(raw: &str) -> Result<ParsedDefault> {
	let trimmed = raw.trim();
	if trimmed.eq_ignore_ascii_case("null") {
		return Ok(ParsedDefault::Null);
	}

	if trimmed.starts_with('\'') {
		let (content, rest) = split_quoted(trimmed, true)
			.ok_or_else(|| DefaultsError::malformed(raw, "unterminated string literal"))?;
		if !rest.trim().is_empty() {
			return Ok(ParsedDefault::Function(trimmed.to_string()));
		}
		return Ok(ParsedDefault::Value(unescape_backslashes(&content)));
	}

	let bare = strip_wrapping_parens(trimmed);
	if is_numeric(bare) {
		return Ok(ParsedDefault::Value(bare.to_string()));
	}

	if !parens_balanced(trimmed) {
		return Err(DefaultsError::malformed(raw, "unbalanced parentheses or quotes"));
	}
	Ok(ParsedDefault::Function(trimmed.to_string()))
}

/// MariaDB escapes backslashes and quotes inside quoted defaults
fn unescape_backslashes(content: &str) -> String {
	let mut out = String::with_capacity(content.len());
	let mut chars = content.chars();
	while let Some(ch) = chars.next() {
		if ch == '\\' {
			match chars.next() {
				Some('n') => out.push('\n'),
				Some('t') => out.push('\t'),
				Some('r') => out.push('\r'),
				Some('0') => out.push('\0'),
				Some(other) => out.push(other),
				None => out.push('\\'),
			}
		} else {
			out.push(ch);
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn value(s: &str) -> ParsedDefault {
		ParsedDefault::Value(s.to_string())
	}

	fn function(s: &str) -> ParsedDefault {
		ParsedDefault::Function(s.to_string())
	}

	#[rstest]
	#[case("Smith", value("Smith"))]
	#[case("O'Connor", value("O'Connor"))]
	#[case("-1", value("-1"))]
	#[case("0", value("0"))]
	#[case("2.78", value("2.78"))]
	#[case("", value(""))]
	#[case("NULL", value("NULL"))]
	#[case("--- []\n\n", value("--- []\n\n"))]
	#[case("CURRENT_TIMESTAMP", function("CURRENT_TIMESTAMP"))]
	#[case("CURRENT_TIMESTAMP(6)", function("CURRENT_TIMESTAMP(6)"))]
	#[case(
		"CURRENT_TIMESTAMP on update CURRENT_TIMESTAMP",
		function("CURRENT_TIMESTAMP on update CURRENT_TIMESTAMP")
	)]
	#[case("now()", function("now()"))]
	#[case("(rand())", function("(rand())"))]
	#[case(r"_utf8mb4\'abc\'", function(r"_utf8mb4\'abc\'"))]
	fn test_parse_mysql(#[case] raw: &str, #[case] expected: ParsedDefault) {
		assert_eq!(parse(raw).unwrap(), expected);
	}

	#[rstest]
	#[case("'Smith'", value("Smith"))]
	#[case("'O''Connor'", value("O'Connor"))]
	#[case(r"'O\'Connor'", value("O'Connor"))]
	#[case("''", value(""))]
	#[case("-1", value("-1"))]
	#[case("2.78", value("2.78"))]
	#[case("NULL", ParsedDefault::Null)]
	#[case("current_timestamp()", function("current_timestamp()"))]
	#[case("uuid()", function("uuid()"))]
	fn test_parse_mariadb(#[case] raw: &str, #[case] expected: ParsedDefault) {
		assert_eq!(parse_mariadb(raw).unwrap(), expected);
	}

	#[rstest]
	#[case("'unterminated")]
	#[case("uuid(")]
	fn test_parse_mariadb_malformed(#[case] raw: &str) {
		assert!(matches!(
			parse_mariadb(raw),
			Err(DefaultsError::MalformedExpression { .. })
		));
	}
}
