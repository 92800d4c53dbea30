//! # Reinhardt Defaults Core
//!
//! Dialect-independent normalization of SQL column default values.
//!
//! MySQL, MariaDB, PostgreSQL, Oracle and SQLite each report column defaults
//! in their own way: quoted or unquoted, with type casts, with trailing
//! whitespace, with octal escapes, or not at all. Session strict mode changes
//! what MySQL fills into NOT NULL columns. This crate turns the raw metadata
//! into one canonical [`NormalizedDefault`].
//!
//! ## Example
//!
//! ```
//! use reinhardt_defaults_core::{ColumnMetadata, DefaultValue, Dialect, NormalizedDefault, normalize};
//!
//! let mysql = ColumnMetadata::new("non_null_text", Dialect::MySql, "text")
//!     .not_null()
//!     .strict(false);
//! assert_eq!(
//!     normalize(&mysql),
//!     NormalizedDefault::Literal(DefaultValue::String(String::new()))
//! );
//!
//! let strict = mysql.clone().strict(true);
//! assert_eq!(normalize(&strict), NormalizedDefault::NullDefault);
//! ```

pub mod coerce;
pub mod columns;
pub mod dialect;
pub mod error;
pub mod metadata;
pub mod normalizer;
pub mod parse;
pub mod schema;
pub mod sql_type;
pub mod value;

pub use coerce::coerce;
pub use columns::{Record, ResolvedColumn, TableColumns};
pub use dialect::Dialect;
pub use error::{DefaultsError, Result};
pub use metadata::ColumnMetadata;
pub use normalizer::{ResolvedDefault, normalize, resolve, try_resolve};
pub use schema::{SchemaColumn, SchemaTable, dump_table};
pub use sql_type::SqlType;
pub use value::{DefaultValue, NormalizedDefault};
