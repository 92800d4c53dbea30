//! Schema connection interface

use async_trait::async_trait;
use reinhardt_defaults_core::{ColumnMetadata, Dialect, Record, SqlType, TableColumns};
use std::sync::Arc;

use crate::config::ConnectionConfig;
use crate::ddl::{ColumnDefinition, SchemaEditor, TableDefinition};
use crate::error::{BackendError, Result};
use crate::memory::InMemoryConnection;

/// Database operations needed to observe column defaults
///
/// Implementations only have to provide raw statement execution, column
/// metadata and row access; schema changes default to SQL rendered by
/// [`SchemaEditor`].
#[async_trait]
pub trait SchemaConnection: Send + Sync {
	fn dialect(&self) -> Dialect;

	/// Session strict mode; always `true` outside the MySQL family
	fn is_strict(&self) -> bool;

	fn editor(&self) -> SchemaEditor {
		SchemaEditor::new(self.dialect())
	}

	/// Execute a raw statement, returning the number of affected rows
	async fn execute(&self, sql: &str) -> Result<u64>;

	/// Fetch the current column metadata of `table`
	async fn columns(&self, table: &str) -> Result<Vec<ColumnMetadata>>;

	/// Insert one row; columns missing from `values` take their defaults
	async fn insert(&self, table: &str, values: &Record) -> Result<()>;

	async fn fetch_all(&self, table: &str) -> Result<Vec<Record>>;

	async fn create_table(&self, table: &TableDefinition) -> Result<()> {
		let sql = self.editor().create_table_sql(table)?;
		self.execute(&sql).await?;
		Ok(())
	}

	async fn drop_table(&self, name: &str) -> Result<()> {
		let sql = self.editor().drop_table_sql(name);
		self.execute(&sql).await?;
		Ok(())
	}

	async fn add_column(&self, table: &str, column: &ColumnDefinition) -> Result<()> {
		let sql = self.editor().add_column_sql(table, column);
		self.execute(&sql).await?;
		Ok(())
	}

	/// Set (`Some`) or drop (`None`) a column default given as raw SQL
	async fn alter_column_default(
		&self,
		table: &str,
		column: &str,
		default: Option<&str>,
	) -> Result<()> {
		let sql = self
			.editor()
			.alter_column_default_sql(table, column, default)?;
		self.execute(&sql).await?;
		Ok(())
	}

	/// Fetch and resolve the columns of `table`
	async fn table_columns(&self, table: &str) -> Result<TableColumns> {
		let columns = self.columns(table).await?;
		if columns.is_empty() {
			return Err(BackendError::TableNotFound(table.to_string()));
		}
		Ok(TableColumns::resolve(table, columns))
	}
}

/// Open a connection for `config`
///
/// # Examples
///
/// ```
/// # tokio_test::block_on(async {
/// use reinhardt_defaults_backends::{ConnectionConfig, connect};
/// use reinhardt_defaults_core::Dialect;
///
/// let connection = connect(&ConnectionConfig::in_memory(Dialect::MySql).with_strict(false))
///     .await
///     .unwrap();
///
/// assert_eq!(connection.dialect(), Dialect::MySql);
/// assert!(!connection.is_strict());
/// # });
/// ```
pub async fn connect(config: &ConnectionConfig) -> Result<Arc<dyn SchemaConnection>> {
	let dialect = config.dialect()?;
	tracing::debug!(engine = %config.engine, %dialect, strict = config.strict, "Opening schema connection");

	if config.is_in_memory() {
		return Ok(Arc::new(InMemoryConnection::new(dialect, config.strict)));
	}

	match dialect {
		#[cfg(feature = "sqlite")]
		Dialect::Sqlite => Ok(Arc::new(
			crate::sqlite::SqliteConnection::connect(&config.to_url()).await?,
		)),
		#[cfg(feature = "postgres")]
		Dialect::Postgres => Ok(Arc::new(
			crate::postgres::PgConnection::connect(&config.to_url(), config.search_path.as_deref())
				.await?,
		)),
		#[cfg(feature = "mysql")]
		Dialect::MySql | Dialect::MariaDb => Ok(Arc::new(
			crate::mysql::MySqlConnection::connect(&config.to_url(), config.strict).await?,
		)),
		_ => Err(BackendError::UnsupportedEngine(config.engine.clone())),
	}
}

/// Type of `column` among fetched metadata, for binding insert parameters
pub(crate) fn column_type<'a>(
	columns: &'a [ColumnMetadata],
	table: &str,
	column: &str,
) -> Result<&'a SqlType> {
	columns
		.iter()
		.find(|c| c.name == column)
		.map(|c| &c.sql_type)
		.ok_or_else(|| BackendError::ColumnNotFound {
			table: table.to_string(),
			column: column.to_string(),
		})
}
