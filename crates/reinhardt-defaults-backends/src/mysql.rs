//! MySQL and MariaDB collaborator
//!
//! Every pooled connection runs with the configured strict mode: the
//! `STRICT_*` entries of the server's `sql_mode` are replaced by
//! `STRICT_ALL_TABLES` or removed.

use async_trait::async_trait;
use reinhardt_defaults_core::parse::{ParsedDefault, mysql};
use reinhardt_defaults_core::{ColumnMetadata, DefaultValue, Dialect, Record, SqlType};
use rust_decimal::Decimal;
use sqlx::mysql::{MySqlArguments, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{MySql, Row};
use std::sync::Arc;

use crate::connection::{SchemaConnection, column_type};
use crate::error::Result;

type MySqlQuery<'q> = sqlx::query::Query<'q, MySql, MySqlArguments>;

const COLUMNS_QUERY: &str = r#"
SELECT CAST(COLUMN_NAME AS CHAR) AS name,
	CAST(COLUMN_TYPE AS CHAR) AS column_type,
	CAST(IS_NULLABLE AS CHAR) AS is_nullable,
	CAST(COLUMN_DEFAULT AS CHAR) AS column_default,
	CAST(EXTRA AS CHAR) AS extra
FROM information_schema.COLUMNS
WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
ORDER BY ORDINAL_POSITION
"#;

/// `sql_mode` with the strict entries set according to `strict`
fn session_sql_mode(current: &str, strict: bool) -> String {
	let mut modes: Vec<&str> = current
		.split(',')
		.map(str::trim)
		.filter(|mode| !mode.is_empty() && !mode.starts_with("STRICT_"))
		.collect();
	if strict {
		modes.push("STRICT_ALL_TABLES");
	}
	modes.join(",")
}

/// MySQL 8 reports expression defaults without their parentheses; restore
/// them so the expression is not mistaken for a literal
fn reported_default(default: Option<String>, extra: &str) -> Option<String> {
	let default = default?;
	if !extra.contains("DEFAULT_GENERATED") {
		return Some(default);
	}
	match mysql::parse(&default) {
		Ok(ParsedDefault::Function(_)) => Some(default),
		_ => Some(format!("({})", default)),
	}
}

/// MySQL or MariaDB database connection
pub struct MySqlConnection {
	pool: Arc<MySqlPool>,
	dialect: Dialect,
	strict: bool,
}

impl MySqlConnection {
	/// Connect to `url`, applying `strict` to every session
	pub async fn connect(url: &str, strict: bool) -> Result<Self> {
		let pool = MySqlPoolOptions::new()
			.max_connections(5)
			.after_connect(move |conn, _meta| {
				Box::pin(async move {
					let current: String =
						sqlx::query_scalar("SELECT CAST(@@SESSION.sql_mode AS CHAR)")
							.fetch_one(&mut *conn)
							.await?;
					let sql = format!(
						"SET SESSION sql_mode = '{}'",
						session_sql_mode(&current, strict)
					);
					sqlx::query(&sql).execute(&mut *conn).await?;
					Ok(())
				})
			})
			.connect(url)
			.await?;

		let version: String = sqlx::query_scalar("SELECT CAST(VERSION() AS CHAR)")
			.fetch_one(&pool)
			.await?;
		let dialect = if version.contains("MariaDB") {
			Dialect::MariaDb
		} else {
			Dialect::MySql
		};
		tracing::debug!(%version, %dialect, strict, "Connected to MySQL server");

		Ok(Self {
			pool: Arc::new(pool),
			dialect,
			strict,
		})
	}

	pub fn pool(&self) -> &MySqlPool {
		&self.pool
	}

	fn bind_value<'q>(query: MySqlQuery<'q>, value: Option<&'q DefaultValue>) -> MySqlQuery<'q> {
		match value {
			None => query.bind(None::<String>),
			Some(DefaultValue::Integer(i)) => query.bind(i),
			Some(DefaultValue::Decimal(d)) => query.bind(d),
			Some(DefaultValue::Float(f)) => query.bind(f),
			Some(DefaultValue::Boolean(b)) => query.bind(b),
			Some(DefaultValue::String(s)) => query.bind(s),
			Some(DefaultValue::Blob(b)) => query.bind(b),
			Some(DefaultValue::Date(d)) => query.bind(d),
			Some(DefaultValue::DateTime(dt)) => query.bind(dt),
		}
	}

	fn decode_value(row: &MySqlRow, name: &str, sql_type: &SqlType) -> Result<Option<DefaultValue>> {
		Ok(match sql_type {
			SqlType::Integer => {
				if let Ok(value) = row.try_get::<Option<i64>, _>(name) {
					value.map(DefaultValue::Integer)
				} else {
					row.try_get::<Option<i32>, _>(name)?
						.map(|i| DefaultValue::Integer(i as i64))
				}
			}
			SqlType::Decimal => row.try_get::<Option<Decimal>, _>(name)?.map(DefaultValue::Decimal),
			SqlType::Float => {
				if let Ok(value) = row.try_get::<Option<f64>, _>(name) {
					value.map(DefaultValue::Float)
				} else {
					row.try_get::<Option<f32>, _>(name)?
						.map(|f| DefaultValue::Float(f as f64))
				}
			}
			SqlType::Boolean => row.try_get::<Option<bool>, _>(name)?.map(DefaultValue::Boolean),
			SqlType::Blob => row.try_get::<Option<Vec<u8>>, _>(name)?.map(DefaultValue::Blob),
			SqlType::Date => row
				.try_get::<Option<chrono::NaiveDate>, _>(name)?
				.map(DefaultValue::Date),
			SqlType::DateTime => {
				if let Ok(value) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
					value.map(DefaultValue::DateTime)
				} else {
					row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name)?
						.map(|dt| DefaultValue::DateTime(dt.naive_utc()))
				}
			}
			SqlType::String | SqlType::Text | SqlType::Bpchar | SqlType::Other(_) => {
				if let Ok(value) = row.try_get::<Option<String>, _>(name) {
					value.map(DefaultValue::String)
				} else {
					// binary collations come back as bytes
					row.try_get::<Option<Vec<u8>>, _>(name)?
						.map(|b| DefaultValue::String(String::from_utf8_lossy(&b).into_owned()))
				}
			}
		})
	}

	fn convert_row(row: &MySqlRow, columns: &[ColumnMetadata]) -> Result<Record> {
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
impl SchemaConnection for MySqlConnection {
	fn dialect(&self) -> Dialect {
		self.dialect
	}

	fn is_strict(&self) -> bool {
		self.strict
	}

	async fn execute(&self, sql: &str) -> Result<u64> {
		tracing::debug!(sql, dialect = %self.dialect, "Executing MySQL statement");
		let result = sqlx::query(sql).execute(&*self.pool).await?;
		Ok(result.rows_affected())
	}

	async fn columns(&self, table: &str) -> Result<Vec<ColumnMetadata>> {
		let rows = sqlx::query(COLUMNS_QUERY)
			.bind(table)
			.fetch_all(&*self.pool)
			.await?;

		rows.iter()
			.map(|row| {
				let name: String = row.try_get("name")?;
				let column_type: String = row.try_get("column_type")?;
				let is_nullable: String = row.try_get("is_nullable")?;
				let default: Option<String> = row.try_get("column_default")?;
				let extra: Option<String> = row.try_get("extra")?;
				Ok(ColumnMetadata::new(name, self.dialect, column_type)
					.nullable(is_nullable.eq_ignore_ascii_case("YES"))
					.with_raw_default(reported_default(default, extra.as_deref().unwrap_or("")))
					.strict(self.strict))
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
