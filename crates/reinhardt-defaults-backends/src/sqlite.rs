//! SQLite collaborator
//!
//! Column metadata comes from `PRAGMA table_info`, whose `dflt_value` is the
//! `DEFAULT` clause exactly as written in the table's DDL.

use async_trait::async_trait;
use reinhardt_defaults_core::{ColumnMetadata, DefaultValue, Dialect, Record, SqlType, coerce};
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite};
use std::sync::Arc;

use crate::connection::{SchemaConnection, column_type};
use crate::error::Result;

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// SQLite connection backed by a single-connection pool
pub struct SqliteConnection {
	pool: Arc<SqlitePool>,
}

impl SqliteConnection {
	/// Connect to `url`
	///
	/// The pool holds exactly one connection that never expires, so
	/// `sqlite::memory:` databases survive between statements.
	pub async fn connect(url: &str) -> Result<Self> {
		let pool = SqlitePoolOptions::new()
			.max_connections(1)
			.min_connections(1)
			.idle_timeout(None)
			.max_lifetime(None)
			.connect(url)
			.await?;
		Ok(Self::new(pool))
	}

	pub fn new(pool: SqlitePool) -> Self {
		Self {
			pool: Arc::new(pool),
		}
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	fn bind_value<'q>(query: SqliteQuery<'q>, value: Option<&'q DefaultValue>) -> SqliteQuery<'q> {
		match value {
			None => query.bind(None::<String>),
			Some(DefaultValue::Integer(i)) => query.bind(i),
			// No native decimal; numeric affinity converts the text
			Some(DefaultValue::Decimal(d)) => query.bind(d.to_string()),
			Some(DefaultValue::Float(f)) => query.bind(f),
			Some(DefaultValue::Boolean(b)) => query.bind(b),
			Some(DefaultValue::String(s)) => query.bind(s),
			Some(DefaultValue::Blob(b)) => query.bind(b),
			Some(DefaultValue::Date(d)) => query.bind(d),
			Some(DefaultValue::DateTime(dt)) => query.bind(dt),
		}
	}

	fn decode_value(row: &SqliteRow, name: &str, sql_type: &SqlType) -> Result<Option<DefaultValue>> {
		Ok(match sql_type {
			SqlType::Integer => row.try_get::<Option<i64>, _>(name)?.map(DefaultValue::Integer),
			SqlType::Boolean => row.try_get::<Option<bool>, _>(name)?.map(DefaultValue::Boolean),
			SqlType::Float => row.try_get::<Option<f64>, _>(name)?.map(DefaultValue::Float),
			SqlType::Decimal => {
				let text = if let Ok(value) = row.try_get::<Option<String>, _>(name) {
					value
				} else if let Ok(value) = row.try_get::<Option<f64>, _>(name) {
					value.map(|f| f.to_string())
				} else {
					row.try_get::<Option<i64>, _>(name)?.map(|i| i.to_string())
				};
				text.map(|t| coerce(&t, sql_type)).transpose()?
			}
			SqlType::Blob => row.try_get::<Option<Vec<u8>>, _>(name)?.map(DefaultValue::Blob),
			SqlType::Date => row
				.try_get::<Option<chrono::NaiveDate>, _>(name)?
				.map(DefaultValue::Date),
			SqlType::DateTime => row
				.try_get::<Option<chrono::NaiveDateTime>, _>(name)?
				.map(DefaultValue::DateTime),
			SqlType::String | SqlType::Text | SqlType::Bpchar | SqlType::Other(_) => {
				row.try_get::<Option<String>, _>(name)?.map(DefaultValue::String)
			}
		})
	}

	fn convert_row(row: &SqliteRow, columns: &[ColumnMetadata]) -> Result<Record> {
		let values = columns
			.iter()
			.map(|column| {
				Self::decode_value(row, &column.name, &column.sql_type)
					.map(|value| (column.name.clone(), value))
			})
			.collect::<Result<Vec<_>>>()?;
		Ok(Record::from_values(values))
	}
}

#[async_trait]
impl SchemaConnection for SqliteConnection {
	fn dialect(&self) -> Dialect {
		Dialect::Sqlite
	}

	fn is_strict(&self) -> bool {
		true
	}

	async fn execute(&self, sql: &str) -> Result<u64> {
		tracing::debug!(sql, "Executing SQLite statement");
		let result = sqlx::query(sql).execute(&*self.pool).await?;
		Ok(result.rows_affected())
	}

	async fn columns(&self, table: &str) -> Result<Vec<ColumnMetadata>> {
		let sql = format!("PRAGMA table_info({})", self.editor().quote_identifier(table));
		let rows = sqlx::query(&sql).fetch_all(&*self.pool).await?;

		rows.iter()
			.map(|row| {
				let name: String = row.try_get("name")?;
				let native_type: String = row.try_get("type")?;
				let not_null: i64 = row.try_get("notnull")?;
				let default: Option<String> = row.try_get("dflt_value")?;
				Ok(ColumnMetadata::new(name, Dialect::Sqlite, native_type)
					.nullable(not_null == 0)
					.with_raw_default(default))
			})
			.collect()
	}

	async fn insert(&self, table: &str, values: &Record) -> Result<()> {
		let columns = self.columns(table).await?;
		let names: Vec<&str> = values.iter().map(|(name, _)| name).collect();
		for name in &names {
			column_type(&columns, table, name)?;
		}

		let sql = self.editor().insert_sql(table, &names);
		let mut query = sqlx::query(&sql);
		for (_, value) in values.iter() {
			query = Self::bind_value(query, value);
		}
		query.execute(&*self.pool).await?;
		Ok(())
	}

	async fn fetch_all(&self, table: &str) -> Result<Vec<Record>> {
		let columns = self.columns(table).await?;
		let rows = sqlx::query(&self.editor().select_all_sql(table))
			.fetch_all(&*self.pool)
			.await?;
		rows.iter()
			.map(|row| Self::convert_row(row, &columns))
			.collect()
	}
}
