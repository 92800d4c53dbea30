//! Oracle default expressions
//!
//! `ALL_TAB_COLUMNS.DATA_DEFAULT` keeps the default exactly as written in the
//! DDL, trailing whitespace and newlines included.

use super::ParsedDefault;
use super::literal::{is_numeric, parens_balanced, split_quoted, strip_wrapping_parens};
use crate::error::{DefaultsError, Result};

pub fn parse(raw: &str) -> Result<ParsedDefault> {
	let trimmed = raw.trim();
	if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
		return Ok(ParsedDefault::Null);
	}
	if !parens_balanced(trimmed) {
		return Err(DefaultsError::malformed(raw, "unbalanced parentheses or quotes"));
	}

	let expr = strip_wrapping_parens(trimmed);
	if expr.starts_with('\'') {
		let (content, rest) = split_quoted(expr, false)
			.ok_or_else(|| DefaultsError::malformed(raw, "unterminated string literal"))?;
		if rest.trim().is_empty() {
			return Ok(ParsedDefault::Value(content));
		}
		return Ok(ParsedDefault::Function(trimmed.to_string()));
	}

	if is_numeric(expr) {
		return Ok(ParsedDefault::Value(expr.to_string()));
	}

	Ok(ParsedDefault::Function(trimmed.to_string()))
}
