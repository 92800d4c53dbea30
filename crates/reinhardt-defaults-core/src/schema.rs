//! Dialect-neutral schema representation
//!
//! A dumped table must compare equal whichever dialect it was read from, so
//! only declared defaults are written. Implicit values that a non-strict
//! MySQL session would fill in, and NULL defaults, are left out.

use serde::{Deserialize, Serialize};

use crate::columns::{ResolvedColumn, TableColumns};
use crate::value::{DefaultValue, NormalizedDefault};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaColumn {
	pub name: String,
	#[serde(rename = "type")]
	pub sql_type: String,
	pub null: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub default: Option<DefaultValue>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub default_function: Option<String>,
}

impl SchemaColumn {
	pub fn from_resolved(column: &ResolvedColumn) -> Self {
		let default = match &column.resolved_default.value {
			NormalizedDefault::Literal(value) if !column.resolved_default.implicit => {
				Some(value.clone())
			}
			_ => None,
		};
		Self {
			name: column.name().to_string(),
			sql_type: column.sql_type().name().to_string(),
			null: column.null(),
			default,
			default_function: column.default_function().map(str::to_string),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaTable {
	pub name: String,
	pub columns: Vec<SchemaColumn>,
}

impl SchemaTable {
	pub fn column(&self, name: &str) -> Option<&SchemaColumn> {
		self.columns.iter().find(|c| c.name == name)
	}

	pub fn to_json(&self) -> serde_json::Result<String> {
		serde_json::to_string_pretty(self)
	}
}

pub fn dump_table(columns: &TableColumns) -> SchemaTable {
	SchemaTable {
		name: columns.table.clone(),
		columns: columns.iter().map(SchemaColumn::from_resolved).collect(),
	}
}
