//! SQLite default expressions
//!
//! `PRAGMA table_info` returns `dflt_value` as the SQL text of the `DEFAULT`
//! clause.

use super::ParsedDefault;
use super::literal::{hex_blob, is_numeric, parens_balanced, split_quoted, strip_wrapping_parens};
use crate::error::{DefaultsError, Result};

pub fn parse(raw: &str) -> Result<ParsedDefault> {
	if !parens_balanced(raw) {
		return Err(DefaultsError::malformed(raw, "unbalanced parentheses or quotes"));
	}

	let expr = strip_wrapping_parens(raw);
	if expr.is_empty() {
		return Err(DefaultsError::malformed(raw, "empty expression"));
	}
	if expr.eq_ignore_ascii_case("null") {
		return Ok(ParsedDefault::Null);
	}

	if expr.starts_with('\'') {
		let (content, rest) = split_quoted(expr, false)
			.ok_or_else(|| DefaultsError::malformed(raw, "unterminated string literal"))?;
		return Ok(if rest.trim().is_empty() {
			ParsedDefault::Value(content)
		} else {
			ParsedDefault::Function(expr.to_string())
		});
	}
	if let Some(inner) = expr.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
		return Ok(ParsedDefault::Value(inner.replace("\"\"", "\"")));
	}

	if let Some(blob) = hex_blob(expr) {
		return Ok(ParsedDefault::Value(blob));
	}
	if is_numeric(expr) {
		return Ok(ParsedDefault::Value(expr.to_string()));
	}
	if expr.eq_ignore_ascii_case("true") {
		return Ok(ParsedDefault::Value("1".to_string()));
	}
	if expr.eq_ignore_ascii_case("false") {
		return Ok(ParsedDefault::Value("0".to_string()));
	}

	Ok(ParsedDefault::Function(expr.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn value(s: &str) -> ParsedDefault {
		ParsedDefault::Value(s.to_string())
	}

	#[rstest]
	#[case("'Smith'", value("Smith"))]
	#[case("'O''Connor'", value("O'Connor"))]
	#[case("''", value(""))]
	#[case("\"quoted\"", value("quoted"))]
	#[case("-1", value("-1"))]
	#[case("(-1)", value("-1"))]
	#[case("2.78", value("2.78"))]
	#[case("X'0A0B'", value("\\x0a0b"))]
	#[case("TRUE", value("1"))]
	#[case("NULL", ParsedDefault::Null)]
	#[case("CURRENT_TIMESTAMP", ParsedDefault::Function("CURRENT_TIMESTAMP".to_string()))]
	#[case("(datetime('now'))", ParsedDefault::Function("datetime('now')".to_string()))]
	fn test_parse(#[case] raw: &str, #[case] expected: ParsedDefault) {
		assert_eq!(parse(raw).unwrap(), expected);
	}

	#[rstest]
	#[case("'abc")]
	#[case("(1 + 2")]
	fn test_parse_malformed(#[case] raw: &str) {
		assert!(matches!(
			parse(raw),
			Err(DefaultsError::MalformedExpression { .. })
		));
	}
}
