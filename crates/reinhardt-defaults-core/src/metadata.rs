//! Raw column metadata as fetched from a database

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::sql_type::SqlType;

/// Snapshot of one column's metadata
///
/// Built by the database collaborator every time column information is
/// reloaded. The normalizer never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
	/// Column name
	pub name: String,
	/// Canonical column type
	pub sql_type: SqlType,
	/// Type name exactly as the dialect reports it
	pub native_type: String,
	/// Whether the column is nullable
	pub nullable: bool,
	/// Default expression exactly as the dialect reports it
	pub raw_default: Option<String>,
	pub dialect: Dialect,
	/// Session strict mode; always `true` for dialects without the concept
	pub strict_mode: bool,
}

impl ColumnMetadata {
	/// Create metadata for a nullable column without a default
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_defaults_core::{ColumnMetadata, Dialect, SqlType};
	///
	/// let column = ColumnMetadata::new("name", Dialect::MySql, "varchar(255)")
	///     .not_null()
	///     .raw_default("Smith");
	///
	/// assert_eq!(column.sql_type, SqlType::String);
	/// assert!(!column.nullable);
	/// assert_eq!(column.raw_default.as_deref(), Some("Smith"));
	/// ```
	pub fn new(name: impl Into<String>, dialect: Dialect, native_type: impl Into<String>) -> Self {
		let native_type = native_type.into();
		Self {
			name: name.into(),
			sql_type: SqlType::from_native(dialect, &native_type),
			native_type,
			nullable: true,
			raw_default: None,
			dialect,
			strict_mode: true,
		}
	}

	pub fn nullable(mut self, nullable: bool) -> Self {
		self.nullable = nullable;
		self
	}

	pub fn not_null(self) -> Self {
		self.nullable(false)
	}

	pub fn raw_default(mut self, raw_default: impl Into<String>) -> Self {
		self.raw_default = Some(raw_default.into());
		self
	}

	pub fn with_raw_default(mut self, raw_default: Option<String>) -> Self {
		self.raw_default = raw_default;
		self
	}

	/// Set the session strict mode
	///
	/// Ignored by dialects that are always strict.
	pub fn strict(mut self, strict: bool) -> Self {
		self.strict_mode = strict || !self.dialect.honors_strict_mode();
		self
	}

	/// Override the type classification derived from `native_type`
	pub fn sql_type(mut self, sql_type: SqlType) -> Self {
		self.sql_type = sql_type;
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_strict_is_forced_for_always_strict_dialects() {
		let column = ColumnMetadata::new("a", Dialect::Postgres, "text").strict(false);
		assert!(column.strict_mode);

		let column = ColumnMetadata::new("a", Dialect::MySql, "text").strict(false);
		assert!(!column.strict_mode);
	}
}
