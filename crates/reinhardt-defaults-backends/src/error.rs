//! Error types for database collaborators

use reinhardt_defaults_core::{DefaultsError, Dialect};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
	/// The database rejected a statement; the message is the database's own
	#[error("Statement invalid: {message}")]
	StatementInvalid { message: String },

	#[error("Table not found: {0}")]
	TableNotFound(String),

	#[error("Table already exists: {0}")]
	TableExists(String),

	#[error("Column not found: {table}.{column}")]
	ColumnNotFound { table: String, column: String },

	#[error("Unsupported statement for {dialect}: {statement}")]
	UnsupportedStatement { dialect: Dialect, statement: String },

	#[error("Unsupported database engine: {0}")]
	UnsupportedEngine(String),

	#[error("Configuration error: {0}")]
	Config(String),

	#[error("SQL error: {0}")]
	Sqlx(#[source] sqlx::Error),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("Query builder error: {0}")]
	QueryBuilder(String),

	/// A fetched value did not decode as its column type
	#[error(transparent)]
	Defaults(#[from] DefaultsError),
}

impl BackendError {
	pub fn statement_invalid(message: impl Into<String>) -> Self {
		Self::StatementInvalid {
			message: message.into(),
		}
	}

	pub(crate) fn unsupported(dialect: Dialect, statement: impl Into<String>) -> Self {
		Self::UnsupportedStatement {
			dialect,
			statement: statement.into(),
		}
	}

	/// Whether the database refused the statement, typically a NOT NULL or
	/// default-related constraint
	pub fn is_statement_invalid(&self) -> bool {
		matches!(self, Self::StatementInvalid { .. })
	}
}

impl From<sqlx::Error> for BackendError {
	fn from(err: sqlx::Error) -> Self {
		match err {
			sqlx::Error::Database(db) => Self::statement_invalid(db.message()),
			other => Self::Sqlx(other),
		}
	}
}

pub type Result<T> = std::result::Result<T, BackendError>;
