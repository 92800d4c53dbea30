//! # Reinhardt Defaults
//!
//! Column default normalization across MySQL, MariaDB, PostgreSQL, Oracle
//! and SQLite.
//!
//! Each database reports a column default in its own textual form. This crate
//! turns that metadata into a single [`NormalizedDefault`] so that a freshly
//! built record, a schema dump and a row inserted by the database itself all
//! agree on what the default is.
//!
//! ## Crates
//!
//! - [`reinhardt_defaults_core`]: parsing, coercion and the normalization policy
//! - [`reinhardt_defaults_backends`]: connections that create tables, read
//!   metadata and insert rows (feature `backends`, on by default)
//!
//! ## Feature Flags
//!
//! - `backends` (default) - SQLite, PostgreSQL and MySQL connections plus the
//!   in-memory emulator
//! - `integration-tests` - tests against MySQL and PostgreSQL containers
//!
//! ## Quick Example
//!
//! ```
//! # tokio_test::block_on(async {
//! use reinhardt_defaults::prelude::*;
//!
//! let connection = connect(&ConnectionConfig::in_memory(Dialect::Postgres))
//!     .await
//!     .unwrap();
//! connection
//!     .create_table(
//!         &TableDefinition::new("people")
//!             .column(ColumnDefinition::new("surname", SqlType::String).default_value("O'Connor")),
//!     )
//!     .await
//!     .unwrap();
//!
//! let columns = connection.table_columns("people").await.unwrap();
//! assert_eq!(
//!     columns.get("surname").unwrap().default(),
//!     &NormalizedDefault::Literal(DefaultValue::from("O'Connor"))
//! );
//! # });
//! ```

pub use reinhardt_defaults_core as core;

#[cfg(feature = "backends")]
pub use reinhardt_defaults_backends as backends;

pub use reinhardt_defaults_core::{
	ColumnMetadata, DefaultValue, DefaultsError, Dialect, NormalizedDefault, Record,
	ResolvedColumn, ResolvedDefault, SchemaColumn, SchemaTable, SqlType, TableColumns, coerce,
	dump_table, normalize, resolve, try_resolve,
};

#[cfg(feature = "backends")]
pub use reinhardt_defaults_backends::{
	BackendError, ColumnCache, ColumnDefault, ColumnDefinition, ConnectionConfig,
	InMemoryConnection, SchemaConnection, SchemaEditor, TableDefinition, connect,
};

/// Commonly used types
pub mod prelude {
	pub use crate::{
		ColumnMetadata, DefaultValue, Dialect, NormalizedDefault, Record, SqlType, TableColumns,
		normalize,
	};

	#[cfg(feature = "backends")]
	pub use crate::{
		ColumnCache, ColumnDefinition, ConnectionConfig, SchemaConnection, TableDefinition,
		connect,
	};
}
