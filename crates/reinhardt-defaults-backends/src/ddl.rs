//! Dialect DDL rendering
//!
//! [`SchemaEditor`] turns table and column definitions into the statements
//! each dialect accepts. Table creation goes through SeaQuery where a
//! backend exists; Oracle and the column-level statements are rendered
//! directly, with identifiers and literals quoted per dialect.

use pg_escape::{quote_identifier, quote_literal};
use reinhardt_defaults_core::{DefaultValue, Dialect, SqlType};
use sea_query::{Alias, ColumnDef, MysqlQueryBuilder, PostgresQueryBuilder, SqliteQueryBuilder, Table};
use serde::{Deserialize, Serialize};

use crate::error::{BackendError, Result};

/// Default declared for a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnDefault {
	/// A value, quoted by the editor
	Value(DefaultValue),
	/// SQL inserted as written: `'--- []\n\n'`, `CURRENT_TIMESTAMP`
	Expression(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
	pub name: String,
	pub sql_type: SqlType,
	#[serde(default)]
	pub limit: Option<u32>,
	#[serde(default)]
	pub precision: Option<u32>,
	#[serde(default)]
	pub scale: Option<u32>,
	pub nullable: bool,
	#[serde(default)]
	pub default: Option<ColumnDefault>,
}

impl ColumnDefinition {
	pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
		Self {
			name: name.into(),
			sql_type,
			limit: None,
			precision: None,
			scale: None,
			nullable: true,
			default: None,
		}
	}

	pub fn not_null(mut self) -> Self {
		self.nullable = false;
		self
	}

	pub fn default_value(mut self, value: impl Into<DefaultValue>) -> Self {
		self.default = Some(ColumnDefault::Value(value.into()));
		self
	}

	pub fn default_expression(mut self, expression: impl Into<String>) -> Self {
		self.default = Some(ColumnDefault::Expression(expression.into()));
		self
	}

	pub fn limit(mut self, limit: u32) -> Self {
		self.limit = Some(limit);
		self
	}

	pub fn precision(mut self, precision: u32, scale: u32) -> Self {
		self.precision = Some(precision);
		self.scale = Some(scale);
		self
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
	pub name: String,
	pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			columns: Vec::new(),
		}
	}

	pub fn column(mut self, column: ColumnDefinition) -> Self {
		self.columns.push(column);
		self
	}
}

/// Renders DDL for one dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaEditor {
	dialect: Dialect,
}

impl SchemaEditor {
	pub fn new(dialect: Dialect) -> Self {
		Self { dialect }
	}

	pub fn dialect(&self) -> Dialect {
		self.dialect
	}

	/// Native type name of a column definition
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_defaults_backends::{ColumnDefinition, SchemaEditor};
	/// use reinhardt_defaults_core::{Dialect, SqlType};
	///
	/// let column = ColumnDefinition::new("decimal_number", SqlType::Decimal).precision(3, 2);
	///
	/// assert_eq!(SchemaEditor::new(Dialect::Postgres).native_type(&column), "numeric(3,2)");
	/// assert_eq!(SchemaEditor::new(Dialect::Oracle).native_type(&column), "NUMBER(3,2)");
	/// ```
	pub fn native_type(&self, column: &ColumnDefinition) -> String {
		let oracle = self.dialect == Dialect::Oracle;
		let mysql = self.dialect.honors_strict_mode();
		let limit = column.limit.unwrap_or(255);
		let numeric = |name: &str| match (column.precision, column.scale) {
			(Some(p), Some(s)) => format!("{}({},{})", name, p, s),
			(Some(p), None) => format!("{}({})", name, p),
			_ => name.to_string(),
		};

		match &column.sql_type {
			SqlType::Integer if oracle => "NUMBER(38)".to_string(),
			SqlType::Integer if mysql => "int".to_string(),
			SqlType::Integer => "integer".to_string(),
			SqlType::Decimal if oracle => numeric("NUMBER"),
			SqlType::Decimal if self.dialect == Dialect::Postgres => numeric("numeric"),
			SqlType::Decimal => numeric("decimal"),
			SqlType::Float if oracle => "BINARY_DOUBLE".to_string(),
			SqlType::Float if self.dialect == Dialect::Postgres => "double precision".to_string(),
			SqlType::Float => "float".to_string(),
			SqlType::Boolean if oracle => "NUMBER(1)".to_string(),
			SqlType::Boolean if mysql => "tinyint(1)".to_string(),
			SqlType::Boolean => "boolean".to_string(),
			SqlType::String if oracle => format!("VARCHAR2({})", limit),
			SqlType::String if self.dialect == Dialect::Postgres => {
				format!("character varying({})", limit)
			}
			SqlType::String => format!("varchar({})", limit),
			SqlType::Text if oracle => "CLOB".to_string(),
			SqlType::Text => "text".to_string(),
			SqlType::Bpchar if oracle => format!("CHAR({})", column.limit.unwrap_or(1)),
			SqlType::Bpchar if self.dialect == Dialect::Postgres => {
				format!("character({})", column.limit.unwrap_or(1))
			}
			SqlType::Bpchar => format!("char({})", column.limit.unwrap_or(1)),
			SqlType::Blob if oracle => "BLOB".to_string(),
			SqlType::Blob if self.dialect == Dialect::Postgres => "bytea".to_string(),
			SqlType::Blob => "blob".to_string(),
			SqlType::Date if oracle => "DATE".to_string(),
			SqlType::Date => "date".to_string(),
			SqlType::DateTime if oracle => "TIMESTAMP".to_string(),
			SqlType::DateTime if self.dialect == Dialect::Postgres => "timestamp".to_string(),
			SqlType::DateTime => "datetime".to_string(),
			SqlType::Other(name) => name.clone(),
		}
	}

	pub fn quote_identifier(&self, name: &str) -> String {
		match self.dialect {
			Dialect::Postgres => quote_identifier(name).into_owned(),
			Dialect::MySql | Dialect::MariaDb => format!("`{}`", name.replace('`', "``")),
			Dialect::Oracle | Dialect::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
		}
	}

	/// Quote a string as a SQL literal
	pub fn quote_string(&self, value: &str) -> String {
		match self.dialect {
			Dialect::Postgres => quote_literal(value),
			Dialect::MySql | Dialect::MariaDb => format!(
				"'{}'",
				value.replace('\\', "\\\\").replace('\'', "''")
			),
			Dialect::Oracle | Dialect::Sqlite => format!("'{}'", value.replace('\'', "''")),
		}
	}

	/// Render a value as a literal usable in a `DEFAULT` clause
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_defaults_backends::SchemaEditor;
	/// use reinhardt_defaults_core::{DefaultValue, Dialect};
	///
	/// let editor = SchemaEditor::new(Dialect::MySql);
	///
	/// assert_eq!(editor.quote_value(&DefaultValue::from("O'Connor")), "'O''Connor'");
	/// assert_eq!(editor.quote_value(&DefaultValue::from(true)), "1");
	/// ```
	pub fn quote_value(&self, value: &DefaultValue) -> String {
		match value {
			DefaultValue::Integer(_) | DefaultValue::Decimal(_) | DefaultValue::Float(_) => {
				value.to_string()
			}
			DefaultValue::Boolean(b) => match self.dialect {
				Dialect::Postgres => if *b { "TRUE" } else { "FALSE" }.to_string(),
				_ => if *b { "1" } else { "0" }.to_string(),
			},
			DefaultValue::String(s) => self.quote_string(s),
			DefaultValue::Blob(bytes) => match self.dialect {
				Dialect::Postgres => format!("'\\x{}'::bytea", hex::encode(bytes)),
				_ => format!("X'{}'", hex::encode_upper(bytes)),
			},
			DefaultValue::Date(_) if self.dialect == Dialect::Oracle => {
				format!("DATE {}", self.quote_string(&value.to_string()))
			}
			DefaultValue::DateTime(_) if self.dialect == Dialect::Oracle => {
				format!("TIMESTAMP {}", self.quote_string(&value.to_string()))
			}
			DefaultValue::Date(_) | DefaultValue::DateTime(_) => self.quote_string(&value.to_string()),
		}
	}

	pub fn default_sql(&self, default: &ColumnDefault) -> String {
		match default {
			ColumnDefault::Value(value) => self.quote_value(value),
			ColumnDefault::Expression(expression) => expression.clone(),
		}
	}

	/// `CREATE TABLE` statement for `table`
	pub fn create_table_sql(&self, table: &TableDefinition) -> Result<String> {
		if table.columns.is_empty() {
			return Err(BackendError::QueryBuilder(format!(
				"table {} has no columns",
				table.name
			)));
		}

		if self.dialect == Dialect::Oracle {
			let columns: Vec<String> = table
				.columns
				.iter()
				.map(|column| self.column_sql(column))
				.collect();
			return Ok(format!(
				"CREATE TABLE {} ({})",
				self.quote_identifier(&table.name),
				columns.join(", ")
			));
		}

		let mut stmt = Table::create();
		stmt.table(Alias::new(table.name.clone()));

		for col in &table.columns {
			let mut column = ColumnDef::new(Alias::new(col.name.clone()));
			column.custom(Alias::new(self.native_type(col)));
			if col.nullable {
				column.null();
			} else {
				column.not_null();
			}
			// `ColumnDef::default` parenthesises the expression, which MySQL
			// reads as a generated default
			if let Some(ref default) = col.default {
				column.extra(format!("DEFAULT {}", self.default_sql(default)));
			}
			stmt.col(&mut column);
		}

		Ok(match self.dialect {
			Dialect::Postgres => stmt.to_string(PostgresQueryBuilder),
			Dialect::MySql | Dialect::MariaDb => stmt.to_string(MysqlQueryBuilder),
			_ => stmt.to_string(SqliteQueryBuilder),
		})
	}

	pub fn drop_table_sql(&self, name: &str) -> String {
		if self.dialect == Dialect::Oracle {
			return format!("DROP TABLE {}", self.quote_identifier(name));
		}

		let stmt = Table::drop()
			.table(Alias::new(name.to_string()))
			.if_exists()
			.to_owned();
		match self.dialect {
			Dialect::Postgres => stmt.to_string(PostgresQueryBuilder),
			Dialect::MySql | Dialect::MariaDb => stmt.to_string(MysqlQueryBuilder),
			_ => stmt.to_string(SqliteQueryBuilder),
		}
	}

	/// Column clause: name, type, default, nullability
	pub fn column_sql(&self, column: &ColumnDefinition) -> String {
		let mut sql = format!(
			"{} {}",
			self.quote_identifier(&column.name),
			self.native_type(column)
		);
		if let Some(ref default) = column.default {
			sql.push_str(" DEFAULT ");
			sql.push_str(&self.default_sql(default));
		}
		if !column.nullable {
			sql.push_str(" NOT NULL");
		}
		sql
	}

	pub fn add_column_sql(&self, table: &str, column: &ColumnDefinition) -> String {
		let keyword = if self.dialect == Dialect::Oracle {
			"ADD"
		} else {
			"ADD COLUMN"
		};
		format!(
			"ALTER TABLE {} {} {}",
			self.quote_identifier(table),
			keyword,
			self.column_sql(column)
		)
	}

	/// `INSERT` with one placeholder per column; no columns inserts a row of
	/// defaults
	pub fn insert_sql(&self, table: &str, columns: &[&str]) -> String {
		let table = self.quote_identifier(table);
		if columns.is_empty() {
			return match self.dialect {
				Dialect::MySql | Dialect::MariaDb => format!("INSERT INTO {} () VALUES ()", table),
				_ => format!("INSERT INTO {} DEFAULT VALUES", table),
			};
		}

		let names: Vec<String> = columns.iter().map(|c| self.quote_identifier(c)).collect();
		let placeholders: Vec<String> = (1..=columns.len())
			.map(|i| match self.dialect {
				Dialect::Postgres => format!("${}", i),
				Dialect::Oracle => format!(":{}", i),
				_ => "?".to_string(),
			})
			.collect();
		format!(
			"INSERT INTO {} ({}) VALUES ({})",
			table,
			names.join(", "),
			placeholders.join(", ")
		)
	}

	pub fn select_all_sql(&self, table: &str) -> String {
		format!("SELECT * FROM {}", self.quote_identifier(table))
	}

	/// Set or drop a column default given as a raw SQL expression
	pub fn alter_column_default_sql(
		&self,
		table: &str,
		column: &str,
		default: Option<&str>,
	) -> Result<String> {
		let table = self.quote_identifier(table);
		let column = self.quote_identifier(column);
		match (self.dialect, default) {
			(Dialect::Sqlite, _) => Err(BackendError::unsupported(
				self.dialect,
				"ALTER COLUMN ... SET DEFAULT",
			)),
			(Dialect::Oracle, Some(expr)) => {
				Ok(format!("ALTER TABLE {} MODIFY {} DEFAULT {}", table, column, expr))
			}
			(Dialect::Oracle, None) => {
				Ok(format!("ALTER TABLE {} MODIFY {} DEFAULT NULL", table, column))
			}
			(_, Some(expr)) => Ok(format!(
				"ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {}",
				table, column, expr
			)),
			(_, None) => Ok(format!(
				"ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT",
				table, column
			)),
		}
	}
}
