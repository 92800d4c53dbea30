//! PostgreSQL default expressions
//!
//! `pg_get_expr` renders defaults as SQL: string literals carry a cast
//! (`'Smith'::character varying`), negative numbers may be parenthesised
//! (`(-1)`), and the server adds parentheses around some expressions
//! (`('some text'::text)`).

use super::ParsedDefault;
use super::literal::{
	decode_escapes, decode_octal_escapes, is_cast_chain, is_numeric, parens_balanced,
	split_quoted, strip_cast_suffix, strip_wrapping_parens,
};
use crate::error::{DefaultsError, Result};

pub fn parse(raw: &str) -> Result<ParsedDefault> {
	if !parens_balanced(raw) {
		return Err(DefaultsError::malformed(raw, "unbalanced parentheses or quotes"));
	}

	let expr = strip_wrapping_parens(raw);
	if expr.is_empty() {
		return Err(DefaultsError::malformed(raw, "empty expression"));
	}

	if let Some(body) = expr.strip_prefix(['E', 'e']).filter(|b| b.starts_with('\'')) {
		let (content, rest) = split_quoted(body, true)
			.ok_or_else(|| DefaultsError::malformed(raw, "unterminated string literal"))?;
		return Ok(if is_cast_chain(rest) {
			ParsedDefault::Value(decode_escapes(&content))
		} else {
			ParsedDefault::Function(expr.to_string())
		});
	}

	if expr.starts_with('\'') {
		let (content, rest) = split_quoted(expr, false)
			.ok_or_else(|| DefaultsError::malformed(raw, "unterminated string literal"))?;
		return Ok(if is_cast_chain(rest) {
			ParsedDefault::Value(decode_octal_escapes(&content))
		} else {
			ParsedDefault::Function(expr.to_string())
		});
	}

	let bare = strip_wrapping_parens(strip_cast_suffix(expr));
	if bare.eq_ignore_ascii_case("null") {
		return Ok(ParsedDefault::Null);
	}
	if is_numeric(bare) {
		return Ok(ParsedDefault::Value(bare.to_string()));
	}
	if bare.eq_ignore_ascii_case("true") || bare.eq_ignore_ascii_case("false") {
		return Ok(ParsedDefault::Value(bare.to_ascii_lowercase()));
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
	#[case("'Smith'::character varying", value("Smith"))]
	#[case("'O''Connor'::character varying", value("O'Connor"))]
	#[case("'foo''::bar'::character varying", value("foo'::bar"))]
	#[case("'foo''::bar'", value("foo'::bar"))]
	#[case("'some value'::text", value("some value"))]
	#[case("('some text'::text)", value("some text"))]
	#[case("'some text'::schema_1.text", value("some text"))]
	#[case("'some value'::bpchar", value("some value"))]
	#[case("'--- []\n\n'::text", value("--- []\n\n"))]
	#[case(r"'--- []\012\012'::text", value("--- []\n\n"))]
	#[case(r"E'--- []\n\n'::text", value("--- []\n\n"))]
	#[case("1", value("1"))]
	#[case("'-1'::integer", value("-1"))]
	#[case("(-1)", value("-1"))]
	#[case("(-1)::integer", value("-1"))]
	#[case("2.78", value("2.78"))]
	#[case("'2.78'::numeric", value("2.78"))]
	#[case("true", value("true"))]
	#[case("FALSE", value("false"))]
	#[case("''::character varying", value(""))]
	#[case("NULL::character varying", ParsedDefault::Null)]
	#[case("NULL", ParsedDefault::Null)]
	fn test_parse_literals(#[case] raw: &str, #[case] expected: ParsedDefault) {
		assert_eq!(parse(raw).unwrap(), expected);
	}

	#[rstest]
	#[case("now()")]
	#[case("nextval('defaults_id_seq'::regclass)")]
	#[case("CURRENT_TIMESTAMP")]
	#[case("('a'::text || 'b'::text)")]
	fn test_parse_functions(#[case] raw: &str) {
		assert!(matches!(parse(raw).unwrap(), ParsedDefault::Function(_)));
	}

	#[rstest]
	#[case("'unterminated::text")]
	#[case("now(")]
	#[case("()")]
	fn test_parse_malformed(#[case] raw: &str) {
		assert!(matches!(
			parse(raw),
			Err(DefaultsError::MalformedExpression { .. })
		));
	}
}
