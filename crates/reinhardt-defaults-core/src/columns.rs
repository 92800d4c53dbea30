//! Resolved columns of a table and records built from their defaults

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::metadata::ColumnMetadata;
use crate::normalizer::{ResolvedDefault, resolve};
use crate::sql_type::SqlType;
use crate::value::{DefaultValue, NormalizedDefault};

/// A column whose default has been resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedColumn {
	pub metadata: ColumnMetadata,
	pub resolved_default: ResolvedDefault,
}

impl ResolvedColumn {
	pub fn new(metadata: ColumnMetadata) -> Self {
		let resolved_default = resolve(&metadata);
		Self {
			metadata,
			resolved_default,
		}
	}

	pub fn name(&self) -> &str {
		&self.metadata.name
	}

	pub fn sql_type(&self) -> &SqlType {
		&self.metadata.sql_type
	}

	/// Whether the column accepts NULL
	pub fn null(&self) -> bool {
		self.metadata.nullable
	}

	pub fn default(&self) -> &NormalizedDefault {
		&self.resolved_default.value
	}

	pub fn default_before_type_cast(&self) -> Option<&str> {
		self.resolved_default.raw.as_deref()
	}

	pub fn default_function(&self) -> Option<&str> {
		self.resolved_default.function.as_deref()
	}
}

/// Columns of one table in declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableColumns {
	pub table: String,
	columns: IndexMap<String, ResolvedColumn>,
}

impl TableColumns {
	/// Resolve every column of `table`
	pub fn resolve(table: impl Into<String>, metadata: impl IntoIterator<Item = ColumnMetadata>) -> Self {
		let columns = metadata
			.into_iter()
			.map(|meta| (meta.name.clone(), ResolvedColumn::new(meta)))
			.collect();
		Self {
			table: table.into(),
			columns,
		}
	}

	pub fn get(&self, name: &str) -> Option<&ResolvedColumn> {
		self.columns.get(name)
	}

	pub fn iter(&self) -> impl Iterator<Item = &ResolvedColumn> {
		self.columns.values()
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.columns.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.columns.len()
	}

	pub fn is_empty(&self) -> bool {
		self.columns.is_empty()
	}

	/// A record holding every column's default, as a freshly built row would
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_defaults_core::{ColumnMetadata, DefaultValue, Dialect, TableColumns};
	///
	/// let columns = TableColumns::resolve(
	///     "defaults",
	///     [
	///         ColumnMetadata::new("negative_integer", Dialect::Sqlite, "integer").raw_default("-1"),
	///         ColumnMetadata::new("name", Dialect::Sqlite, "varchar(255)").raw_default("'Smith'"),
	///     ],
	/// );
	/// let record = columns.new_record();
	///
	/// assert_eq!(record.get("negative_integer"), Some(&DefaultValue::Integer(-1)));
	/// assert_eq!(record.get_before_type_cast("negative_integer"), Some("-1"));
	/// assert_eq!(record.get("name").and_then(DefaultValue::as_str), Some("Smith"));
	/// ```
	pub fn new_record(&self) -> Record {
		let mut record = Record::default();
		for column in self.iter() {
			record.values.insert(
				column.name().to_string(),
				column.default().clone().into_value(),
			);
			record.before_type_cast.insert(
				column.name().to_string(),
				column.default_before_type_cast().map(str::to_string),
			);
		}
		record
	}
}

impl<'a> IntoIterator for &'a TableColumns {
	type Item = &'a ResolvedColumn;
	type IntoIter = indexmap::map::Values<'a, String, ResolvedColumn>;

	fn into_iter(self) -> Self::IntoIter {
		self.columns.values()
	}
}

/// Column values of a single row; `None` is SQL NULL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
	values: IndexMap<String, Option<DefaultValue>>,
	before_type_cast: IndexMap<String, Option<String>>,
}

impl Record {
	/// Build a record from fetched values, which carry no pre-cast text
	pub fn from_values(values: impl IntoIterator<Item = (String, Option<DefaultValue>)>) -> Self {
		Self {
			values: values.into_iter().collect(),
			before_type_cast: IndexMap::new(),
		}
	}

	pub fn get(&self, column: &str) -> Option<&DefaultValue> {
		self.values.get(column).and_then(Option::as_ref)
	}

	pub fn get_before_type_cast(&self, column: &str) -> Option<&str> {
		self.before_type_cast
			.get(column)
			.and_then(|raw| raw.as_deref())
	}

	pub fn contains(&self, column: &str) -> bool {
		self.values.contains_key(column)
	}

	/// Whether `column` is present and NULL
	pub fn is_null(&self, column: &str) -> bool {
		matches!(self.values.get(column), Some(None))
	}

	pub fn set(&mut self, column: impl Into<String>, value: Option<DefaultValue>) {
		let column = column.into();
		self.before_type_cast.shift_remove(&column);
		self.values.insert(column, value);
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&DefaultValue>)> {
		self.values.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
	}
}
