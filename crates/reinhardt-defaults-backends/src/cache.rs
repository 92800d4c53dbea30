//! Resolved column cache
//!
//! Column information is loaded once per table and reused until
//! [`ColumnCache::reset_column_information`] drops it, typically after a
//! schema change.

use parking_lot::RwLock;
use reinhardt_defaults_core::TableColumns;
use std::collections::HashMap;
use std::sync::Arc;

use crate::connection::SchemaConnection;
use crate::error::Result;

#[derive(Debug, Default)]
pub struct ColumnCache {
	tables: RwLock<HashMap<String, Arc<TableColumns>>>,
}

impl ColumnCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Cached columns of `table`, loading them through `connection` on a miss
	pub async fn get_or_load(
		&self,
		connection: &dyn SchemaConnection,
		table: &str,
	) -> Result<Arc<TableColumns>> {
		let cached = self.tables.read().get(table).cloned();
		if let Some(columns) = cached {
			return Ok(columns);
		}

		tracing::debug!(table, dialect = %connection.dialect(), "Loading column information");
		let columns = Arc::new(connection.table_columns(table).await?);
		self.tables
			.write()
			.insert(table.to_string(), Arc::clone(&columns));
		Ok(columns)
	}

	pub fn is_cached(&self, table: &str) -> bool {
		self.tables.read().contains_key(table)
	}

	/// Forget `table` so the next lookup reads fresh metadata
	pub fn reset_column_information(&self, table: &str) {
		if self.tables.write().remove(table).is_some() {
			tracing::debug!(table, "Reset column information");
		}
	}

	pub fn clear(&self) {
		self.tables.write().clear();
	}
}
