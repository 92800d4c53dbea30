//! # Reinhardt Defaults Backends
//!
//! Database collaborators that create tables, read column metadata and
//! insert rows, so column defaults can be observed end to end.
//!
//! ## Supported Databases
//!
//! - **SQLite**: enabled with the `sqlite` feature
//! - **PostgreSQL**: enabled with the `postgres` feature
//! - **MySQL / MariaDB**: enabled with the `mysql` feature
//! - **In-memory**: an emulation of every dialect, Oracle included
//!
//! ## Example
//!
//! ```
//! # tokio_test::block_on(async {
//! use reinhardt_defaults_backends::{ColumnDefinition, ConnectionConfig, TableDefinition, connect};
//! use reinhardt_defaults_core::{DefaultValue, Dialect, Record, SqlType};
//!
//! let connection = connect(&ConnectionConfig::in_memory(Dialect::MySql).with_strict(false))
//!     .await
//!     .unwrap();
//! connection
//!     .create_table(
//!         &TableDefinition::new("defaults")
//!             .column(ColumnDefinition::new("non_null_text", SqlType::Text).not_null()),
//!     )
//!     .await
//!     .unwrap();
//!
//! connection.insert("defaults", &Record::default()).await.unwrap();
//! let rows = connection.fetch_all("defaults").await.unwrap();
//!
//! assert_eq!(rows[0].get("non_null_text"), Some(&DefaultValue::from("")));
//! # });
//! ```

pub mod cache;
pub mod config;
pub mod connection;
pub mod ddl;
pub mod error;
pub mod memory;

#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use cache::ColumnCache;
pub use config::ConnectionConfig;
pub use connection::{SchemaConnection, connect};
pub use ddl::{ColumnDefault, ColumnDefinition, SchemaEditor, TableDefinition};
pub use error::{BackendError, Result};
pub use memory::InMemoryConnection;

#[cfg(feature = "mysql")]
pub use mysql::MySqlConnection;
#[cfg(feature = "postgres")]
pub use postgres::PgConnection;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteConnection;
