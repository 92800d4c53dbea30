//! Default value normalization policy
//!
//! Turns a [`ColumnMetadata`] snapshot into a dialect-independent default.
//! The MySQL family needs its own branch: it reports defaults unquoted, forges
//! `''` for NOT NULL columns declared without a default, and, outside strict
//! mode, silently fills `TEXT`/`BLOB` columns with an empty string.

use serde::{Deserialize, Serialize};

use crate::coerce::coerce;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::metadata::ColumnMetadata;
use crate::parse::{ParsedDefault, parse_default};
use crate::value::NormalizedDefault;

/// A normalized default together with the details a schema dumper needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDefault {
	pub value: NormalizedDefault,
	/// Default before type cast: the canonical text the value was coerced from
	pub raw: Option<String>,
	/// Expression evaluated by the database, when the default is computed
	pub function: Option<String>,
	/// Supplied by the dialect rather than declared in the schema
	pub implicit: bool,
}

impl ResolvedDefault {
	pub fn no_default() -> Self {
		Self {
			value: NormalizedDefault::NoDefault,
			raw: None,
			function: None,
			implicit: false,
		}
	}

	pub fn null() -> Self {
		Self {
			value: NormalizedDefault::NullDefault,
			..Self::no_default()
		}
	}

	pub fn function(expression: impl Into<String>) -> Self {
		Self {
			function: Some(expression.into()),
			..Self::no_default()
		}
	}

	fn literal(meta: &ColumnMetadata, text: String) -> Result<Self> {
		let value = coerce(&text, &meta.sql_type)?;
		Ok(Self {
			value: NormalizedDefault::Literal(value),
			raw: Some(text),
			function: None,
			implicit: false,
		})
	}

	fn implicit(meta: &ColumnMetadata) -> Result<Self> {
		Ok(Self {
			implicit: true,
			..Self::literal(meta, String::new())?
		})
	}
}

/// Normalize the default of `meta`
///
/// Never fails: an expression that cannot be understood yields
/// [`NormalizedDefault::NoDefault`].
///
/// # Examples
///
/// ```
/// use reinhardt_defaults_core::{ColumnMetadata, DefaultValue, Dialect, NormalizedDefault, normalize};
///
/// let column = ColumnMetadata::new("char1", Dialect::Postgres, "character varying")
///     .raw_default("'foo''::bar'::character varying");
///
/// assert_eq!(
///     normalize(&column),
///     NormalizedDefault::Literal(DefaultValue::String("foo'::bar".to_string()))
/// );
/// ```
pub fn normalize(meta: &ColumnMetadata) -> NormalizedDefault {
	resolve(meta).value
}

/// Resolve the default of `meta`, failing closed
pub fn resolve(meta: &ColumnMetadata) -> ResolvedDefault {
	match try_resolve(meta) {
		Ok(resolved) => resolved,
		Err(e) => {
			tracing::warn!(
				column = %meta.name,
				dialect = %meta.dialect,
				error = %e,
				"Ignoring unusable column default"
			);
			ResolvedDefault::no_default()
		}
	}
}

/// Resolve the default of `meta`, reporting why an expression is unusable
pub fn try_resolve(meta: &ColumnMetadata) -> Result<ResolvedDefault> {
	let parsed = meta
		.raw_default
		.as_deref()
		.map(|raw| parse_default(meta.dialect, raw))
		.transpose()?;

	match meta.dialect {
		Dialect::MySql | Dialect::MariaDb => resolve_mysql(meta, parsed),
		Dialect::Postgres | Dialect::Oracle | Dialect::Sqlite => resolve_standard(meta, parsed),
	}
}

fn resolve_mysql(meta: &ColumnMetadata, parsed: Option<ParsedDefault>) -> Result<ResolvedDefault> {
	let text = match parsed {
		Some(ParsedDefault::Function(expression)) => {
			return Ok(ResolvedDefault::function(expression));
		}
		None | Some(ParsedDefault::Null) => return implicit_or_null(meta),
		Some(ParsedDefault::Value(text)) => text,
	};

	// Missing default forged as empty string
	if text.is_empty() && !meta.nullable && !meta.sql_type.accepts_empty_string() {
		return Ok(ResolvedDefault::null());
	}

	if meta.dialect == Dialect::MySql && meta.sql_type.is_text_or_blob() {
		if text.is_empty() {
			return implicit_or_null(meta);
		}
		return Ok(ResolvedDefault::function(text));
	}

	ResolvedDefault::literal(meta, text)
}

fn implicit_or_null(meta: &ColumnMetadata) -> Result<ResolvedDefault> {
	if meta.sql_type.is_text_or_blob() && !meta.nullable && !meta.strict_mode {
		tracing::warn!(
			column = %meta.name,
			sql_type = %meta.sql_type,
			"Non-strict session fills NOT NULL column with an implicit empty value"
		);
		return ResolvedDefault::implicit(meta);
	}
	Ok(ResolvedDefault::null())
}

fn resolve_standard(meta: &ColumnMetadata, parsed: Option<ParsedDefault>) -> Result<ResolvedDefault> {
	match parsed {
		None | Some(ParsedDefault::Null) => Ok(ResolvedDefault::null()),
		Some(ParsedDefault::Function(expression)) => Ok(ResolvedDefault::function(expression)),
		// Oracle stores '' as NULL
		Some(ParsedDefault::Value(text)) if meta.dialect == Dialect::Oracle && text.is_empty() => {
			Ok(ResolvedDefault::null())
		}
		Some(ParsedDefault::Value(text)) => ResolvedDefault::literal(meta, text),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::value::DefaultValue;
	use rstest::rstest;

	#[rstest]
	fn test_literal_keeps_text_before_type_cast() {
		let meta = ColumnMetadata::new("negative_integer", Dialect::Postgres, "integer")
			.raw_default("'-1'::integer");
		let resolved = try_resolve(&meta).unwrap();

		assert_eq!(
			resolved.value,
			NormalizedDefault::Literal(DefaultValue::Integer(-1))
		);
		assert_eq!(resolved.raw.as_deref(), Some("-1"));
		assert!(!resolved.implicit);
	}

	#[rstest]
	fn test_function_default_has_no_literal() {
		let meta = ColumnMetadata::new("created_at", Dialect::Postgres, "timestamp")
			.raw_default("now()");
		let resolved = resolve(&meta);

		assert_eq!(resolved.value, NormalizedDefault::NoDefault);
		assert_eq!(resolved.function.as_deref(), Some("now()"));
	}

	#[rstest]
	fn test_implicit_blob_is_empty_bytes() {
		let meta = ColumnMetadata::new("non_null_blob", Dialect::MySql, "blob")
			.not_null()
			.strict(false);
		let resolved = resolve(&meta);

		assert_eq!(
			resolved.value,
			NormalizedDefault::Literal(DefaultValue::Blob(Vec::new()))
		);
		assert!(resolved.implicit);
	}

	#[rstest]
	fn test_malformed_fails_closed() {
		let meta =
			ColumnMetadata::new("broken", Dialect::Postgres, "text").raw_default("'unterminated");

		assert!(try_resolve(&meta).is_err());
		assert_eq!(resolve(&meta), ResolvedDefault::no_default());
	}

	#[rstest]
	fn test_uncoercible_fails_closed() {
		let meta = ColumnMetadata::new("flag", Dialect::Sqlite, "boolean").raw_default("'maybe'");

		assert_eq!(normalize(&meta), NormalizedDefault::NoDefault);
	}
}
