//! PostgreSQL collaborator
//!
//! Defaults are read with `pg_get_expr`, the same rendering `\d` shows:
//! `'Smith'::character varying`, `'-1'::integer`, `now()`.

use async_trait::async_trait;
use reinhardt_defaults_core::{ColumnMetadata, DefaultValue, Dialect, Record, SqlType};
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row};
use std::str::FromStr;
use std::sync::Arc;

use crate::connection::{SchemaConnection, column_type};
use crate::error::Result;

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

const COLUMNS_QUERY: &str = r#"
SELECT a.attname::text AS name,
	format_type(a.atttypid, a.atttypmod) AS data_type,
	a.attnotnull AS not_null,
	pg_get_expr(d.adbin, d.adrelid) AS default_expr
FROM pg_attribute a
LEFT JOIN pg_attrdef d ON a.attrelid = d.adrelid AND a.attnum = d.adnum
WHERE a.attrelid = to_regclass($1)
	AND a.attnum > 0
	AND NOT a.attisdropped
ORDER BY a.attnum
"#;

/// PostgreSQL database connection
pub struct PgConnection {
	pool: Arc<PgPool>,
}

impl PgConnection {
	/// Connect to `url`; a `search_path` is sent as a startup parameter so
	/// every pooled connection resolves unqualified names the same way
	pub async fn connect(url: &str, search_path: Option<&str>) -> Result<Self> {
		let mut options = PgConnectOptions::from_str(url)?;
		if let Some(search_path) = search_path {
			options = options.options([("search_path", search_path)]);
		}
		let pool = PgPoolOptions::new()
			.max_connections(5)
			.connect_with(options)
			.await?;
		Ok(Self::new(pool))
	}

	pub fn new(pool: PgPool) -> Self {
		Self {
			pool: Arc::new(pool),
		}
	}

	pub fn pool(&self) -> &PgPool {
		&self.pool
	}

	/// Bind a value; NULLs are typed after the column so PostgreSQL accepts them
	fn bind_value<'q>(
		query: PgQuery<'q>,
		value: Option<&'q DefaultValue>,
		sql_type: &SqlType,
	) -> PgQuery<'q> {
		match value {
			None => match sql_type {
				SqlType::Integer => query.bind(None::<i64>),
				SqlType::Decimal => query.bind(None::<Decimal>),
				SqlType::Float => query.bind(None::<f64>),
				SqlType::Boolean => query.bind(None::<bool>),
				SqlType::Blob => query.bind(None::<Vec<u8>>),
				SqlType::Date => query.bind(None::<chrono::NaiveDate>),
				SqlType::DateTime => query.bind(None::<chrono::NaiveDateTime>),
				_ => query.bind(None::<String>),
			},
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

	fn decode_value(row: &PgRow, name: &str, sql_type: &SqlType) -> Result<Option<DefaultValue>> {
		Ok(match sql_type {
			SqlType::Integer => {
				if let Ok(value) = row.try_get::<Option<i64>, _>(name) {
					value.map(DefaultValue::Integer)
				} else if let Ok(value) = row.try_get::<Option<i32>, _>(name) {
					value.map(|i| DefaultValue::Integer(i as i64))
				} else {
					row.try_get::<Option<i16>, _>(name)?
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
					// timestamptz
					row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name)?
						.map(|dt| DefaultValue::DateTime(dt.naive_utc()))
				}
			}
			SqlType::String | SqlType::Text | SqlType::Bpchar | SqlType::Other(_) => {
				row.try_get::<Option<String>, _>(name)?.map(DefaultValue::String)
			}
		})
	}

	fn convert_row(row: &PgRow, columns: &[ColumnMetadata]) -> Result<Record> {
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
impl SchemaConnection for PgConnection {
	fn dialect(&self) -> Dialect {
		Dialect::Postgres
	}

	fn is_strict(&self) -> bool {
		true
	}

	async fn execute(&self, sql: &str) -> Result<u64> {
		tracing::debug!(sql, "Executing PostgreSQL statement");
		let result = sqlx::query(sql).execute(&*self.pool).await?;
		Ok(result.rows_affected())
	}

	async fn columns(&self, table: &str) -> Result<Vec<ColumnMetadata>> {
		let rows = sqlx::query(COLUMNS_QUERY)
			.bind(self.editor().quote_identifier(table))
			.fetch_all(&*self.pool)
			.await?;

		rows.iter()
			.map(|row| {
				let name: String = row.try_get("name")?;
				let data_type: String = row.try_get("data_type")?;
				let not_null: bool = row.try_get("not_null")?;
				let default: Option<String> = row.try_get("default_expr")?;
				Ok(ColumnMetadata::new(name, Dialect::Postgres, data_type)
					.nullable(!not_null)
					.with_raw_default(default))
			})
			.collect()
	}

	async fn insert(&self, table: &str, values: &Record) -> Result<()> {
		let columns = self.columns(table).await?;
		let names: Vec<&str> = values.iter().map(|(name, _)| name).collect();
		let types = names
			.iter()
			.map(|name| column_type(&columns, table, name).cloned())
			.collect::<Result<Vec<_>>>()?;

		let sql = self.editor().insert_sql(table, &names);
		let mut query = sqlx::query(&sql);
		for ((_, value), sql_type) in values.iter().zip(&types) {
			query = Self::bind_value(query, value, sql_type);
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
