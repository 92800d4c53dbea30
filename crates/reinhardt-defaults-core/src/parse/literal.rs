//! SQL literal scanning shared by the dialect parsers

use regex::Regex;
use std::sync::OnceLock;

/// Compiled regex patterns for literal recognition
struct Patterns {
	numeric: Regex,
	cast_chain: Regex,
	hex_blob: Regex,
}

impl Patterns {
	fn new() -> Self {
		Self {
			// Numeric: "-1", "2.78", ".5", "1e10", "+3"
			numeric: Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").unwrap(),
			// Cast chain: "::text", "::character varying", "::schema_1.text", "::\"char\"",
			// "::numeric(3,2)", "::text[]", "::text::bpchar"
			cast_chain: Regex::new(
				r#"^(\s*::\s*("[^"]+"|[A-Za-z_][\w$.]*(\s+[A-Za-z_][\w$]*)*)(\s*\(\s*\d+(\s*,\s*\d+)?\s*\))?(\[\])*)+\s*$"#,
			)
			.unwrap(),
			// Hex blob: "X'0A0B'"
			hex_blob: Regex::new(r"^[xX]'([0-9A-Fa-f]*)'$").unwrap(),
		}
	}
}

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

fn patterns() -> &'static Patterns {
	PATTERNS.get_or_init(Patterns::new)
}

/// Scan a single-quoted literal at the start of `input`
///
/// Returns the content with `''` collapsed to `'` and the text following the
/// closing quote. With `backslash_escapes`, a backslash protects the next
/// character from terminating the literal; the escape itself is kept for
/// [`decode_escapes`]. Returns `None` when the literal is not terminated.
pub(crate) fn split_quoted(input: &str, backslash_escapes: bool) -> Option<(String, &str)> {
	let body = input.strip_prefix('\'')?;
	let mut content = String::with_capacity(body.len());
	let mut chars = body.char_indices().peekable();

	while let Some((idx, ch)) = chars.next() {
		match ch {
			'\\' if backslash_escapes => {
				content.push('\\');
				if let Some((_, escaped)) = chars.next() {
					content.push(escaped);
				}
			}
			'\'' => {
				if let Some((_, '\'')) = chars.peek() {
					chars.next();
					content.push('\'');
				} else {
					return Some((content, &body[idx + 1..]));
				}
			}
			_ => content.push(ch),
		}
	}

	None
}

/// Whether `rest` consists only of `::type` casts
pub(crate) fn is_cast_chain(rest: &str) -> bool {
	rest.trim().is_empty() || patterns().cast_chain.is_match(rest)
}

/// Remove a trailing cast chain outside quotes and parentheses
///
/// `(-1)::integer` becomes `(-1)`, `NULL::character varying` becomes `NULL`.
/// Expressions whose `::` is nested (`nextval('s'::regclass)`) are returned
/// unchanged.
pub(crate) fn strip_cast_suffix(expr: &str) -> &str {
	let mut depth = 0usize;
	let mut in_quote = false;
	let bytes = expr.as_bytes();
	let mut i = 0;

	while i < bytes.len() {
		match bytes[i] {
			b'\'' => in_quote = !in_quote,
			b'(' if !in_quote => depth += 1,
			b')' if !in_quote => depth = depth.saturating_sub(1),
			b':' if !in_quote && depth == 0 && bytes.get(i + 1) == Some(&b':') => {
				if is_cast_chain(&expr[i..]) {
					return expr[..i].trim_end();
				}
				return expr;
			}
			_ => {}
		}
		i += 1;
	}

	expr
}

/// Remove parentheses that wrap the whole expression, repeatedly
///
/// `((-1))` becomes `-1`; `(a) + (b)` is left alone.
pub(crate) fn strip_wrapping_parens(expr: &str) -> &str {
	let mut current = expr.trim();
	while current.starts_with('(') && current.ends_with(')') && closes_at_end(current) {
		current = current[1..current.len() - 1].trim();
	}
	current
}

/// Whether the opening parenthesis at index 0 is matched by the last byte
fn closes_at_end(expr: &str) -> bool {
	let mut depth = 0usize;
	let mut in_quote = false;
	let last = expr.len() - 1;

	for (i, b) in expr.bytes().enumerate() {
		match b {
			b'\'' => in_quote = !in_quote,
			b'(' if !in_quote => depth += 1,
			b')' if !in_quote => {
				depth = depth.saturating_sub(1);
				if depth == 0 {
					return i == last;
				}
			}
			_ => {}
		}
	}

	false
}

/// Whether parentheses outside quoted sections balance
pub(crate) fn parens_balanced(expr: &str) -> bool {
	let mut depth = 0i64;
	let mut in_quote = false;
	for b in expr.bytes() {
		match b {
			b'\'' => in_quote = !in_quote,
			b'(' if !in_quote => depth += 1,
			b')' if !in_quote => {
				depth -= 1;
				if depth < 0 {
					return false;
				}
			}
			_ => {}
		}
	}
	depth == 0 && !in_quote
}

pub(crate) fn is_numeric(expr: &str) -> bool {
	patterns().numeric.is_match(expr)
}

/// `X'0A0B'` as the canonical `\x0a0b` blob text
pub(crate) fn hex_blob(expr: &str) -> Option<String> {
	patterns()
		.hex_blob
		.captures(expr)
		.map(|caps| format!("\\x{}", caps[1].to_ascii_lowercase()))
}

/// Decode C-style backslash escapes as used by PostgreSQL `E'...'` strings
pub(crate) fn decode_escapes(input: &str) -> String {
	let mut out = String::with_capacity(input.len());
	let mut chars = input.chars().peekable();

	while let Some(ch) = chars.next() {
		if ch != '\\' {
			out.push(ch);
			continue;
		}
		match chars.next() {
			Some('n') => out.push('\n'),
			Some('t') => out.push('\t'),
			Some('r') => out.push('\r'),
			Some('b') => out.push('\u{8}'),
			Some('f') => out.push('\u{c}'),
			Some('x') => {
				let mut digits = String::new();
				while digits.len() < 2 {
					match chars.peek() {
						Some(c) if c.is_ascii_hexdigit() => {
							digits.push(*c);
							chars.next();
						}
						_ => break,
					}
				}
				match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
					Some(decoded) => out.push(decoded),
					None => out.push('x'),
				}
			}
			Some(d @ '0'..='7') => {
				let mut digits = d.to_string();
				while digits.len() < 3 {
					match chars.peek() {
						Some(c @ '0'..='7') => {
							digits.push(*c);
							chars.next();
						}
						_ => break,
					}
				}
				if let Some(decoded) = u32::from_str_radix(&digits, 8).ok().and_then(char::from_u32)
				{
					out.push(decoded);
				}
			}
			Some(other) => out.push(other),
			None => out.push('\\'),
		}
	}

	out
}

/// Decode `\ooo` octal escapes of control characters only
///
/// Older PostgreSQL servers report newlines inside plain literals as
/// `\012`; printable characters are never escaped that way, so `C:\101`
/// keeps its backslash. Any other backslash is kept as is.
pub(crate) fn decode_octal_escapes(input: &str) -> String {
	let bytes = input.as_bytes();
	let mut out = String::with_capacity(input.len());
	let mut last = 0;
	let mut i = 0;

	while i + 3 < bytes.len() {
		if bytes[i] == b'\\' && bytes[i + 1..i + 4].iter().all(|b| (b'0'..=b'7').contains(b)) {
			let code = (bytes[i + 1] - b'0') as u32 * 64
				+ (bytes[i + 2] - b'0') as u32 * 8
				+ (bytes[i + 3] - b'0') as u32;
			if let Some(decoded) = char::from_u32(code).filter(char::is_ascii_control) {
				out.push_str(&input[last..i]);
				out.push(decoded);
				i += 4;
				last = i;
				continue;
			}
		}
		i += 1;
	}

	out.push_str(&input[last..]);
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("'abc'", "abc", "")]
	#[case("'O''Connor'", "O'Connor", "")]
	#[case("'foo''::bar'::character varying", "foo'::bar", "::character varying")]
	#[case("''", "", "")]
	#[case("'a'' '' b' || 'c'", "a' ' b", " || 'c'")]
	fn test_split_quoted(#[case] input: &str, #[case] content: &str, #[case] rest: &str) {
		let (parsed, remainder) = split_quoted(input, false).unwrap();
		assert_eq!(parsed, content);
		assert_eq!(remainder, rest);
	}

	#[rstest]
	fn test_split_quoted_unterminated() {
		assert!(split_quoted("'abc", false).is_none());
		assert!(split_quoted("abc'", false).is_none());
	}

	#[rstest]
	fn test_split_quoted_backslash() {
		let (parsed, rest) = split_quoted(r"'it\'s'::text", true).unwrap();
		assert_eq!(parsed, r"it\'s");
		assert_eq!(rest, "::text");
		assert_eq!(decode_escapes(&parsed), "it's");
	}

	#[rstest]
	#[case("::text", true)]
	#[case("::character varying", true)]
	#[case("::schema_1.text", true)]
	#[case("::\"char\"", true)]
	#[case("::numeric(3,2)", true)]
	#[case("::text[]", true)]
	#[case("::text::bpchar", true)]
	#[case(" || 'x'", false)]
	#[case("::text || 'x'", false)]
	fn test_cast_chain(#[case] rest: &str, #[case] expected: bool) {
		assert_eq!(is_cast_chain(rest), expected);
	}

	#[rstest]
	#[case("(-1)::integer", "(-1)")]
	#[case("NULL::character varying", "NULL")]
	#[case("nextval('seq'::regclass)", "nextval('seq'::regclass)")]
	#[case("42", "42")]
	fn test_strip_cast_suffix(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(strip_cast_suffix(input), expected);
	}

	#[rstest]
	#[case("((-1))", "-1")]
	#[case("('some text'::text)", "'some text'::text")]
	#[case("(a) + (b)", "(a) + (b)")]
	#[case("(')')", "')'")]
	#[case("now()", "now()")]
	fn test_strip_wrapping_parens(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(strip_wrapping_parens(input), expected);
	}

	#[rstest]
	fn test_parens_balanced() {
		assert!(parens_balanced("now()"));
		assert!(parens_balanced("f(')')"));
		assert!(!parens_balanced("now("));
		assert!(!parens_balanced(")("));
	}

	#[rstest]
	#[case("-1", true)]
	#[case("2.78", true)]
	#[case(".5", true)]
	#[case("1e10", true)]
	#[case("1.2.3", false)]
	#[case("abc", false)]
	fn test_is_numeric(#[case] input: &str, #[case] expected: bool) {
		assert_eq!(is_numeric(input), expected);
	}

	#[rstest]
	fn test_hex_blob() {
		assert_eq!(hex_blob("X'0A0B'").as_deref(), Some("\\x0a0b"));
		assert_eq!(hex_blob("'0A0B'"), None);
	}

	#[rstest]
	fn test_decode_escapes() {
		assert_eq!(decode_escapes(r"a\nb"), "a\nb");
		assert_eq!(decode_escapes(r"--- []\012\012"), "--- []\n\n");
		assert_eq!(decode_escapes(r"\x41\\"), "A\\");
	}

	#[rstest]
	fn test_decode_octal_escapes() {
		assert_eq!(decode_octal_escapes(r"--- []\012\012"), "--- []\n\n");
		assert_eq!(decode_octal_escapes(r"C:\temp"), r"C:\temp");
		assert_eq!(decode_octal_escapes("plain"), "plain");
		assert_eq!(decode_octal_escapes(r"C:\101"), r"C:\101");
		assert_eq!(decode_octal_escapes(r"tab\011end"), "tab\tend");
	}
}
