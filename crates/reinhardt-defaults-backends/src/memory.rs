//! In-process database emulation
//!
//! [`InMemoryConnection`] keeps tables in memory and reports column defaults
//! the way each dialect's catalog does, so the normalizer can be exercised
//! for every dialect without a server. DDL arrives either structurally
//! ([`SchemaConnection::create_table`]) or as the SQL text rendered by
//! [`crate::SchemaEditor`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use regex::Regex;
use reinhardt_defaults_core::parse::{ParsedDefault, mysql, postgres, sqlite};
use reinhardt_defaults_core::{ColumnMetadata, DefaultValue, Dialect, Record, SqlType, coerce};
use rust_decimal::Decimal;
use std::sync::OnceLock;

use crate::connection::SchemaConnection;
use crate::ddl::{ColumnDefinition, SchemaEditor, TableDefinition};
use crate::error::{BackendError, Result};

const IDENT: &str = r#"(?:"(?:[^"]|"")+"|`(?:[^`]|``)+`|[^\s"`]+)"#;

struct Patterns {
	drop_table: Regex,
	set_default: Regex,
	drop_default: Regex,
	modify_default: Regex,
	add_column: Regex,
	column_rest: Regex,
	current_time: Regex,
}

impl Patterns {
	fn new() -> Self {
		Self {
			drop_table: Regex::new(&format!(
				r"(?is)^DROP\s+TABLE\s+(?P<if_exists>IF\s+EXISTS\s+)?(?P<table>{IDENT})\s*;?$"
			))
			.unwrap(),
			set_default: Regex::new(&format!(
				r"(?is)^ALTER\s+TABLE\s+(?P<table>{IDENT})\s+ALTER\s+(?:COLUMN\s+)?(?P<column>{IDENT})\s+SET\s+DEFAULT\s+(?P<expr>.+?)\s*;?$"
			))
			.unwrap(),
			drop_default: Regex::new(&format!(
				r"(?is)^ALTER\s+TABLE\s+(?P<table>{IDENT})\s+ALTER\s+(?:COLUMN\s+)?(?P<column>{IDENT})\s+DROP\s+DEFAULT\s*;?$"
			))
			.unwrap(),
			modify_default: Regex::new(&format!(
				r"(?is)^ALTER\s+TABLE\s+(?P<table>{IDENT})\s+MODIFY\s+(?P<column>{IDENT})\s+DEFAULT\s+(?P<expr>.+?)\s*;?$"
			))
			.unwrap(),
			add_column: Regex::new(&format!(
				r"(?is)^ALTER\s+TABLE\s+(?P<table>{IDENT})\s+ADD\s+(?:COLUMN\s+)?(?P<column>{IDENT})\s+(?P<rest>.+?)\s*;?$"
			))
			.unwrap(),
			column_rest: Regex::new(
				r"(?is)^(?P<type>.+?)(?:\s+DEFAULT\s+(?P<expr>.+?))?(?:\s+(?P<null>NOT\s+NULL|NULL))?$",
			)
			.unwrap(),
			current_time: Regex::new(
				r"(?i)^\(?\s*(current_timestamp|now|localtimestamp|sysdate|systimestamp|datetime\('now'\))\s*(\(\s*\d*\s*\))?\s*\)?$",
			)
			.unwrap(),
		}
	}
}

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

fn patterns() -> &'static Patterns {
	PATTERNS.get_or_init(Patterns::new)
}

/// Default as the emulated catalog stores it
#[derive(Debug, Clone, PartialEq)]
enum StoredDefault {
	Null,
	Literal(DefaultValue),
	Function(String),
}

#[derive(Debug, Clone)]
struct MemoryColumn {
	name: String,
	native_type: String,
	sql_type: SqlType,
	nullable: bool,
	default: Option<StoredDefault>,
}

#[derive(Debug, Default)]
struct MemoryTable {
	columns: Vec<MemoryColumn>,
	rows: Vec<Record>,
}

impl MemoryTable {
	fn column_mut(&mut self, table: &str, name: &str) -> Result<&mut MemoryColumn> {
		self.columns
			.iter_mut()
			.find(|c| c.name == name)
			.ok_or_else(|| BackendError::ColumnNotFound {
				table: table.to_string(),
				column: name.to_string(),
			})
	}
}

/// Emulated connection for one dialect
///
/// # Examples
///
/// ```
/// # tokio_test::block_on(async {
/// use reinhardt_defaults_backends::{ColumnDefinition, InMemoryConnection, SchemaConnection, TableDefinition};
/// use reinhardt_defaults_core::{DefaultValue, Dialect, SqlType};
///
/// let connection = InMemoryConnection::new(Dialect::Postgres, true);
/// connection
///     .create_table(
///         &TableDefinition::new("defaults")
///             .column(ColumnDefinition::new("name", SqlType::String).default_value("Smith")),
///     )
///     .await
///     .unwrap();
///
/// let metadata = connection.columns("defaults").await.unwrap();
/// assert_eq!(metadata[0].raw_default.as_deref(), Some("'Smith'::character varying"));
///
/// let columns = connection.table_columns("defaults").await.unwrap();
/// let name = columns.get("name").unwrap();
/// assert_eq!(name.default_before_type_cast(), Some("Smith"));
/// assert_eq!(name.default().as_literal(), Some(&DefaultValue::from("Smith")));
/// # });
/// ```
#[derive(Debug)]
pub struct InMemoryConnection {
	dialect: Dialect,
	strict: bool,
	tables: RwLock<IndexMap<String, MemoryTable>>,
}

impl InMemoryConnection {
	/// Create an empty database; `strict` only matters for the MySQL family
	pub fn new(dialect: Dialect, strict: bool) -> Self {
		Self {
			dialect,
			strict: strict || !dialect.honors_strict_mode(),
			tables: RwLock::new(IndexMap::new()),
		}
	}

	pub fn table_names(&self) -> Vec<String> {
		self.tables.read().keys().cloned().collect()
	}

	fn table_not_found(&self, table: &str) -> BackendError {
		BackendError::TableNotFound(table.to_string())
	}

	/// Parse a declared `DEFAULT` clause into what the catalog stores
	fn parse_declared(&self, column: &str, expr: &str, sql_type: &SqlType) -> Result<StoredDefault> {
		let expr = expr.trim();
		let parsed = match self.dialect {
			Dialect::Postgres => postgres::parse(expr),
			Dialect::MySql | Dialect::MariaDb => mysql::parse_mariadb(expr),
			Dialect::Oracle => sqlite::parse(strip_oracle_typed_literal(expr)),
			Dialect::Sqlite => sqlite::parse(expr),
		}
		.map_err(|e| BackendError::statement_invalid(format!("syntax error near DEFAULT: {}", e)))?;

		let stored = match parsed {
			ParsedDefault::Null => StoredDefault::Null,
			ParsedDefault::Function(function) => StoredDefault::Function(function),
			ParsedDefault::Value(text) => {
				let value = coerce(&text, sql_type).map_err(|_| {
					BackendError::statement_invalid(format!(
						"Invalid default value for '{}': {}",
						column, expr
					))
				})?;
				// Oracle stores '' as NULL
				if self.dialect == Dialect::Oracle && value.is_empty_string() {
					StoredDefault::Null
				} else {
					StoredDefault::Literal(value)
				}
			}
		};

		if self.dialect == Dialect::MySql
			&& sql_type.is_text_or_blob()
			&& matches!(stored, StoredDefault::Literal(_))
		{
			return Err(BackendError::statement_invalid(format!(
				"BLOB, TEXT, GEOMETRY or JSON column '{}' can't have a default value",
				column
			)));
		}

		Ok(stored)
	}

	fn column_from_definition(&self, definition: &ColumnDefinition) -> Result<MemoryColumn> {
		let editor = SchemaEditor::new(self.dialect);
		let native_type = editor.native_type(definition);
		let sql_type = SqlType::from_native(self.dialect, &native_type);
		let default = match definition.default {
			Some(ref default) => Some(self.parse_declared(
				&definition.name,
				&editor.default_sql(default),
				&sql_type,
			)?),
			None => None,
		};

		Ok(MemoryColumn {
			name: definition.name.clone(),
			native_type,
			sql_type,
			nullable: definition.nullable,
			default,
		})
	}

	/// Raw default text as the dialect's catalog reports it
	fn report_default(&self, column: &MemoryColumn) -> Option<String> {
		let editor = SchemaEditor::new(self.dialect);
		match (&column.default, self.dialect) {
			(None, Dialect::MariaDb) if column.nullable => Some("NULL".to_string()),
			(None, _) => None,

			(Some(StoredDefault::Null), Dialect::Postgres) => {
				Some(format!("NULL::{}", pg_cast_type(column)))
			}
			(Some(StoredDefault::Null), Dialect::MySql) => None,
			(Some(StoredDefault::Null), Dialect::Oracle) => Some("NULL ".to_string()),
			(Some(StoredDefault::Null), _) => Some("NULL".to_string()),

			(Some(StoredDefault::Function(function)), Dialect::MySql) => {
				match mysql::parse(function) {
					Ok(ParsedDefault::Function(_)) => Some(function.clone()),
					_ => Some(format!("({})", function)),
				}
			}
			(Some(StoredDefault::Function(function)), Dialect::Oracle) => {
				Some(format!("{} ", function))
			}
			(Some(StoredDefault::Function(function)), _) => Some(function.clone()),

			(Some(StoredDefault::Literal(value)), Dialect::Postgres) => {
				Some(pg_literal(value, column))
			}
			(Some(StoredDefault::Literal(value)), Dialect::MySql) => Some(mysql_literal(value)),
			(Some(StoredDefault::Literal(value)), Dialect::MariaDb) => match value {
				DefaultValue::String(s) => Some(format!("'{}'", s.replace('\'', "''"))),
				_ => Some(editor.quote_value(value)),
			},
			(Some(StoredDefault::Literal(value)), Dialect::Oracle) => {
				Some(format!("{} ", editor.quote_value(value)))
			}
			(Some(StoredDefault::Literal(value)), Dialect::Sqlite) => {
				Some(editor.quote_value(value))
			}
		}
	}

	/// Value stored for a column missing from an insert
	fn value_for_missing(&self, table: &str, column: &MemoryColumn) -> Result<Option<DefaultValue>> {
		match column.default {
			Some(StoredDefault::Literal(ref value)) => Ok(Some(value.clone())),
			Some(StoredDefault::Function(ref function)) => {
				self.evaluate(function, &column.sql_type).map(Some)
			}
			_ if column.nullable => Ok(None),
			_ if !self.strict => {
				let value = implicit_value(&column.sql_type);
				tracing::warn!(
					table,
					column = %column.name,
					value = %value,
					"Non-strict session stores an implicit value for NOT NULL column"
				);
				Ok(Some(value))
			}
			_ => Err(self.missing_value(table, column)),
		}
	}

	fn evaluate(&self, function: &str, sql_type: &SqlType) -> Result<DefaultValue> {
		if patterns().current_time.is_match(function.trim()) {
			let now = Utc::now().naive_utc();
			return Ok(match sql_type {
				SqlType::Date => DefaultValue::Date(now.date()),
				_ => DefaultValue::DateTime(now),
			});
		}
		Err(BackendError::unsupported(
			self.dialect,
			format!("evaluating default {}", function),
		))
	}

	/// Error for a NOT NULL column that received no value
	fn missing_value(&self, table: &str, column: &MemoryColumn) -> BackendError {
		match self.dialect {
			Dialect::MySql | Dialect::MariaDb => BackendError::statement_invalid(format!(
				"Field '{}' doesn't have a default value",
				column.name
			)),
			_ => self.null_violation(table, &column.name),
		}
	}

	/// Error for a NOT NULL column that received an explicit NULL
	fn null_violation(&self, table: &str, column: &str) -> BackendError {
		BackendError::statement_invalid(match self.dialect {
			Dialect::MySql | Dialect::MariaDb => format!("Column '{}' cannot be null", column),
			Dialect::Postgres => format!(
				"null value in column \"{}\" of relation \"{}\" violates not-null constraint",
				column, table
			),
			Dialect::Sqlite => format!("NOT NULL constraint failed: {}.{}", table, column),
			Dialect::Oracle => format!(
				"ORA-01400: cannot insert NULL into (\"{}\".\"{}\")",
				table.to_uppercase(),
				column.to_uppercase()
			),
		})
	}

	fn drop_table_statement(&self, table: &str, if_exists: bool) -> Result<u64> {
		match self.tables.write().shift_remove(table) {
			Some(_) => Ok(0),
			None if if_exists => Ok(0),
			None => Err(self.table_not_found(table)),
		}
	}

	fn set_default_statement(&self, table: &str, column: &str, expr: Option<&str>) -> Result<u64> {
		let mut tables = self.tables.write();
		let memory_table = tables
			.get_mut(table)
			.ok_or_else(|| self.table_not_found(table))?;
		let target = memory_table.column_mut(table, column)?;
		target.default = match expr {
			Some(expr) => Some(self.parse_declared(column, expr, &target.sql_type)?),
			None => None,
		};
		Ok(0)
	}

	fn add_column_statement(&self, table: &str, column: &str, rest: &str) -> Result<u64> {
		let captures = patterns()
			.column_rest
			.captures(rest)
			.ok_or_else(|| BackendError::statement_invalid(format!("syntax error near {}", rest)))?;
		let native_type = captures["type"].trim().to_string();
		let sql_type = SqlType::from_native(self.dialect, &native_type);
		let nullable = captures
			.name("null")
			.is_none_or(|null| !null.as_str().to_ascii_uppercase().starts_with("NOT"));
		let default = match captures.name("expr") {
			Some(expr) => Some(self.parse_declared(column, expr.as_str(), &sql_type)?),
			None => None,
		};

		let new_column = MemoryColumn {
			name: column.to_string(),
			native_type,
			sql_type,
			nullable,
			default,
		};

		let mut tables = self.tables.write();
		let memory_table = tables
			.get_mut(table)
			.ok_or_else(|| self.table_not_found(table))?;
		if memory_table.columns.iter().any(|c| c.name == column) {
			return Err(BackendError::statement_invalid(format!(
				"duplicate column name: {}",
				column
			)));
		}

		let mut backfilled = Vec::with_capacity(memory_table.rows.len());
		for row in &memory_table.rows {
			let value = self.value_for_missing(table, &new_column)?;
			let mut row = row.clone();
			row.set(column, value);
			backfilled.push(row);
		}
		memory_table.rows = backfilled;
		memory_table.columns.push(new_column);
		Ok(0)
	}
}

#[async_trait]
impl SchemaConnection for InMemoryConnection {
	fn dialect(&self) -> Dialect {
		self.dialect
	}

	fn is_strict(&self) -> bool {
		self.strict
	}

	async fn execute(&self, sql: &str) -> Result<u64> {
		let p = patterns();
		let sql = sql.trim();
		tracing::debug!(dialect = %self.dialect, sql, "Executing statement");

		if let Some(c) = p.drop_table.captures(sql) {
			return self.drop_table_statement(&unquote(&c["table"]), c.name("if_exists").is_some());
		}
		if let Some(c) = p.drop_default.captures(sql) {
			return self.set_default_statement(&unquote(&c["table"]), &unquote(&c["column"]), None);
		}
		if let Some(c) = p.set_default.captures(sql) {
			return self.set_default_statement(
				&unquote(&c["table"]),
				&unquote(&c["column"]),
				Some(&c["expr"]),
			);
		}
		if let Some(c) = p.modify_default.captures(sql) {
			return self.set_default_statement(
				&unquote(&c["table"]),
				&unquote(&c["column"]),
				Some(&c["expr"]),
			);
		}
		if let Some(c) = p.add_column.captures(sql) {
			return self.add_column_statement(&unquote(&c["table"]), &unquote(&c["column"]), &c["rest"]);
		}

		Err(BackendError::unsupported(self.dialect, sql))
	}

	async fn create_table(&self, table: &TableDefinition) -> Result<()> {
		if table.columns.is_empty() {
			return Err(BackendError::QueryBuilder(format!(
				"table {} has no columns",
				table.name
			)));
		}
		let columns = table
			.columns
			.iter()
			.map(|definition| self.column_from_definition(definition))
			.collect::<Result<Vec<_>>>()?;

		let mut tables = self.tables.write();
		if tables.contains_key(&table.name) {
			return Err(BackendError::TableExists(table.name.clone()));
		}
		tables.insert(
			table.name.clone(),
			MemoryTable {
				columns,
				rows: Vec::new(),
			},
		);
		Ok(())
	}

	async fn columns(&self, table: &str) -> Result<Vec<ColumnMetadata>> {
		let tables = self.tables.read();
		let memory_table = tables.get(table).ok_or_else(|| self.table_not_found(table))?;
		Ok(memory_table
			.columns
			.iter()
			.map(|column| {
				ColumnMetadata::new(column.name.clone(), self.dialect, column.native_type.clone())
					.nullable(column.nullable)
					.with_raw_default(self.report_default(column))
					.strict(self.strict)
			})
			.collect())
	}

	async fn insert(&self, table: &str, values: &Record) -> Result<()> {
		let mut tables = self.tables.write();
		let memory_table = tables
			.get_mut(table)
			.ok_or_else(|| self.table_not_found(table))?;

		if let Some((unknown, _)) = values
			.iter()
			.find(|(name, _)| !memory_table.columns.iter().any(|c| c.name == *name))
		{
			return Err(BackendError::ColumnNotFound {
				table: table.to_string(),
				column: unknown.to_string(),
			});
		}

		let mut row = Vec::with_capacity(memory_table.columns.len());
		for column in &memory_table.columns {
			let value = if values.contains(&column.name) {
				let value = values.get(&column.name).cloned();
				if value.is_none() && !column.nullable {
					return Err(self.null_violation(table, &column.name));
				}
				value
			} else {
				self.value_for_missing(table, column)?
			};
			row.push((column.name.clone(), value));
		}

		memory_table.rows.push(Record::from_values(row));
		Ok(())
	}

	async fn fetch_all(&self, table: &str) -> Result<Vec<Record>> {
		let tables = self.tables.read();
		tables
			.get(table)
			.map(|memory_table| memory_table.rows.clone())
			.ok_or_else(|| self.table_not_found(table))
	}
}

/// Strip identifier quotes: `"name"` and `` `name` ``
fn unquote(identifier: &str) -> String {
	if let Some(inner) = identifier
		.strip_prefix('"')
		.and_then(|s| s.strip_suffix('"'))
	{
		return inner.replace("\"\"", "\"");
	}
	if let Some(inner) = identifier
		.strip_prefix('`')
		.and_then(|s| s.strip_suffix('`'))
	{
		return inner.replace("``", "`");
	}
	identifier.to_string()
}

/// `DATE '2024-01-01'` and `TIMESTAMP '...'` to their quoted text
fn strip_oracle_typed_literal(expr: &str) -> &str {
	for prefix in ["DATE ", "TIMESTAMP "] {
		if let Some(rest) = expr
			.get(..prefix.len())
			.filter(|head| head.eq_ignore_ascii_case(prefix))
			.and_then(|_| expr.get(prefix.len()..))
		{
			let rest = rest.trim_start();
			if rest.starts_with('\'') {
				return rest;
			}
		}
	}
	expr
}

/// Type name PostgreSQL appends to a literal default
fn pg_cast_type(column: &MemoryColumn) -> String {
	match column.sql_type {
		SqlType::Integer => "integer".to_string(),
		SqlType::Decimal => "numeric".to_string(),
		SqlType::Float => "double precision".to_string(),
		SqlType::Boolean => "boolean".to_string(),
		SqlType::String => "character varying".to_string(),
		SqlType::Text => "text".to_string(),
		SqlType::Bpchar => "bpchar".to_string(),
		SqlType::Blob => "bytea".to_string(),
		SqlType::Date => "date".to_string(),
		SqlType::DateTime => "timestamp without time zone".to_string(),
		SqlType::Other(_) => column.native_type.clone(),
	}
}

fn pg_literal(value: &DefaultValue, column: &MemoryColumn) -> String {
	let quoted = |text: String| format!("'{}'::{}", text.replace('\'', "''"), pg_cast_type(column));
	match value {
		DefaultValue::Integer(i) if *i < 0 => quoted(i.to_string()),
		DefaultValue::Decimal(d) if d.is_sign_negative() => quoted(d.to_string()),
		DefaultValue::Float(f) if *f < 0.0 => quoted(f.to_string()),
		DefaultValue::Integer(_) | DefaultValue::Decimal(_) | DefaultValue::Float(_) => {
			value.to_string()
		}
		DefaultValue::Boolean(b) => b.to_string(),
		_ => quoted(value.to_string()),
	}
}

/// MySQL reports literal defaults unquoted
fn mysql_literal(value: &DefaultValue) -> String {
	match value {
		DefaultValue::Boolean(b) => if *b { "1" } else { "0" }.to_string(),
		DefaultValue::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
		_ => value.to_string(),
	}
}

/// Value a non-strict MySQL session stores for a NOT NULL column with no
/// usable default
fn implicit_value(sql_type: &SqlType) -> DefaultValue {
	let epoch = DateTime::<Utc>::UNIX_EPOCH.naive_utc();
	match sql_type {
		SqlType::Integer => DefaultValue::Integer(0),
		SqlType::Decimal => DefaultValue::Decimal(Decimal::ZERO),
		SqlType::Float => DefaultValue::Float(0.0),
		SqlType::Boolean => DefaultValue::Boolean(false),
		SqlType::Blob => DefaultValue::Blob(Vec::new()),
		SqlType::Date => DefaultValue::Date(epoch.date()),
		SqlType::DateTime => DefaultValue::DateTime(epoch),
		SqlType::String | SqlType::Text | SqlType::Bpchar | SqlType::Other(_) => {
			DefaultValue::String(String::new())
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn column(dialect: Dialect, native: &str) -> MemoryColumn {
		MemoryColumn {
			name: "c".to_string(),
			native_type: native.to_string(),
			sql_type: SqlType::from_native(dialect, native),
			nullable: true,
			default: None,
		}
	}

	#[rstest]
	#[case("\"defaults\"", "defaults")]
	#[case("`defaults`", "defaults")]
	#[case("\"odd\"\"name\"", "odd\"name")]
	#[case("plain", "plain")]
	fn test_unquote(#[case] identifier: &str, #[case] expected: &str) {
		assert_eq!(unquote(identifier), expected);
	}

	#[rstest]
	#[case(DefaultValue::Integer(-1), "integer", "'-1'::integer")]
	#[case(DefaultValue::Integer(7), "integer", "7")]
	#[case(DefaultValue::from("O'Connor"), "character varying(255)", "'O''Connor'::character varying")]
	#[case(DefaultValue::Boolean(true), "boolean", "true")]
	fn test_pg_literal(#[case] value: DefaultValue, #[case] native: &str, #[case] expected: &str) {
		assert_eq!(pg_literal(&value, &column(Dialect::Postgres, native)), expected);
	}

	#[rstest]
	fn test_reported_default_parses_back() {
		for dialect in [
			Dialect::MySql,
			Dialect::MariaDb,
			Dialect::Postgres,
			Dialect::Oracle,
			Dialect::Sqlite,
		] {
			let connection = InMemoryConnection::new(dialect, true);
			let mut target = column(dialect, "varchar(255)");
			target.default = Some(StoredDefault::Literal(DefaultValue::from("O'Connor")));
			let raw = connection.report_default(&target).unwrap();
			let meta = ColumnMetadata::new("c", dialect, "varchar(255)").raw_default(raw.clone());
			assert_eq!(
				reinhardt_defaults_core::normalize(&meta).as_literal(),
				Some(&DefaultValue::from("O'Connor")),
				"{} reported {}",
				dialect,
				raw
			);
		}
	}

	#[rstest]
	#[case("DATE '2024-01-01'", "'2024-01-01'")]
	#[case("SYSDATE", "SYSDATE")]
	#[case("'aéé'", "'aéé'")]
	#[case("'ééééé'", "'ééééé'")]
	fn test_strip_oracle_typed_literal(#[case] expr: &str, #[case] expected: &str) {
		assert_eq!(strip_oracle_typed_literal(expr), expected);
	}

	#[rstest]
	fn test_implicit_values() {
		assert_eq!(implicit_value(&SqlType::Text), DefaultValue::from(""));
		assert_eq!(implicit_value(&SqlType::Integer), DefaultValue::Integer(0));
		assert_eq!(implicit_value(&SqlType::Blob), DefaultValue::Blob(Vec::new()));
	}
}
